//! Reconciles upstream JSON collections into the local store.
//!
//! Each record is decoded, normalized and written inside its own transaction.
//! Record-level problems (no id, wrong types, bad timestamps) skip that record
//! and are reported in [`IngestStats`]; store errors abort the whole run.

mod timestamps;


use crate::api::Collection;
use crate::db::write::{self, Outcome};
use crate::db::SpaceDb;
use crate::error::{Error, Result};
use crate::records::{CrewRecord, IsBlank, LaunchRecord, PayloadRecord};
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use timestamps::{normalize_local, normalize_utc};

/// Summary of one reconcile pass over a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    pub collection: Collection,
    pub records_seen: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub unresolved_references: usize,
    pub errors: Vec<String>,
}

impl IngestStats {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            records_seen: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            unresolved_references: 0,
            errors: Vec::new(),
        }
    }

    /// Fold one record's result in. Store errors are handed back.
    fn tally(&mut self, result: Result<Reconciled>) -> Result<()> {
        self.records_seen += 1;
        match result {
            Ok(reconciled) => {
                match reconciled.outcome {
                    Outcome::Created => self.created += 1,
                    Outcome::Updated => self.updated += 1,
                    Outcome::Unchanged => self.unchanged += 1,
                }
                self.unresolved_references += reconciled.unresolved;
                Ok(())
            }
            Err(e) if e.is_record_error() => {
                warn!("Skipping record: {}", e);
                self.skipped += 1;
                self.errors.push(e.to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Result of writing one top-level record
#[derive(Debug, Clone, Copy)]
struct Reconciled {
    outcome: Outcome,
    unresolved: usize,
}

impl From<Outcome> for Reconciled {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            unresolved: 0,
        }
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, index: usize, raw: &Value) -> Result<T> {
    if !raw.is_object() {
        return Err(Error::MalformedRecord {
            collection: collection.to_string(),
            index,
            reason: format!(
                "expected a JSON object, got {}",
                crate::api::json_kind(raw)
            ),
        });
    }

    T::deserialize(raw).map_err(|e| Error::MalformedRecord {
        collection: collection.to_string(),
        index,
        reason: e.to_string(),
    })
}

fn require_id(collection: Collection, index: usize, id: Option<&str>) -> Result<String> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(Error::MissingIdentifier {
            collection: collection.to_string(),
            index,
        }),
    }
}

/// Drives records from one collection into the store
pub struct Reconciler<'a> {
    db: &'a SpaceDb,
    progress: Option<ProgressBar>,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a SpaceDb) -> Self {
        Self { db, progress: None }
    }

    /// Advance `progress` once per record
    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn ingest(&self, collection: Collection, records: &[Value]) -> Result<IngestStats> {
        let mut stats = IngestStats::new(collection);
        self.ingest_into(records, &mut stats).await?;
        Ok(stats)
    }

    /// Reconcile `records` into `stats.collection`, counting into `stats`.
    /// On a store error `stats` keeps the counts up to and including the
    /// failing record.
    pub async fn ingest_into(&self, records: &[Value], stats: &mut IngestStats) -> Result<()> {
        for (index, raw) in records.iter().enumerate() {
            let result = match stats.collection {
                Collection::Crew => self.reconcile_crew(index, raw).await,
                Collection::Payloads => self.reconcile_payload(index, raw).await,
                Collection::Launches => self.reconcile_launch(index, raw).await,
            };
            stats.tally(result)?;
            self.tick();
        }
        Self::summarize(stats);
        Ok(())
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn summarize(stats: &IngestStats) {
        info!(
            collection = %stats.collection,
            seen = stats.records_seen,
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            unresolved = stats.unresolved_references,
            "Reconcile finished"
        );
    }

    // ===== Crew =====

    /// Create crew members that are not stored yet. Existing rows are never
    /// modified.
    pub async fn ingest_crew(&self, records: &[Value]) -> Result<IngestStats> {
        self.ingest(Collection::Crew, records).await
    }

    async fn reconcile_crew(&self, index: usize, raw: &Value) -> Result<Reconciled> {
        let record: CrewRecord = decode(Collection::Crew, index, raw)?;
        let external_id = require_id(Collection::Crew, index, record.id.as_deref())?;

        let mut tx = self.db.begin().await?;
        let written = write::find_or_create_crew(&mut tx, &external_id, &record).await?;
        tx.commit().await?;

        debug!(id = %external_id, outcome = ?written.outcome, "Crew member");
        Ok(written.outcome.into())
    }

    // ===== Payloads =====

    /// Upsert payloads with full replacement, find-or-creating their Dragon
    pub async fn ingest_payloads(&self, records: &[Value]) -> Result<IngestStats> {
        self.ingest(Collection::Payloads, records).await
    }

    async fn reconcile_payload(&self, index: usize, raw: &Value) -> Result<Reconciled> {
        let collection = Collection::Payloads;
        let mut record: PayloadRecord = decode(collection, index, raw)?;
        let external_id = require_id(collection, index, record.id.as_deref())?;
        normalize_utc(collection, index, "epoch", &mut record.epoch)?;

        let mut tx = self.db.begin().await?;

        let dragon_id = match record.dragon.as_ref().filter(|d| !d.is_blank()) {
            Some(dragon) => Some(write::find_or_create_dragon(&mut tx, dragon).await?.id),
            None => None,
        };
        let written = write::upsert_payload(&mut tx, &external_id, &record, dragon_id).await?;

        tx.commit().await?;

        debug!(id = %external_id, outcome = ?written.outcome, dragon = ?dragon_id, "Payload");
        Ok(written.outcome.into())
    }

    // ===== Launches =====

    /// Upsert launches with their links, cores and crew/payload associations
    pub async fn ingest_launches(&self, records: &[Value]) -> Result<IngestStats> {
        self.ingest(Collection::Launches, records).await
    }

    async fn reconcile_launch(&self, index: usize, raw: &Value) -> Result<Reconciled> {
        let collection = Collection::Launches;
        let mut record: LaunchRecord = decode(collection, index, raw)?;
        let external_id = require_id(collection, index, record.id.as_deref())?;
        normalize_utc(collection, index, "date_utc", &mut record.date_utc)?;
        normalize_utc(
            collection,
            index,
            "static_fire_date_utc",
            &mut record.static_fire_date_utc,
        )?;
        normalize_local(collection, index, "date_local", &mut record.date_local)?;

        let mut tx = self.db.begin().await?;

        let links = record.links.clone().unwrap_or_default();
        let patch_id = match links.patch() {
            Some(patch) => Some(write::find_or_create_patch_links(&mut tx, patch).await?.id),
            None => None,
        };
        let reddit_id = match links.reddit() {
            Some(reddit) => Some(write::find_or_create_reddit_links(&mut tx, reddit).await?.id),
            None => None,
        };
        let flickr_id = match links.flickr() {
            Some(flickr) => Some(write::find_or_create_flickr_links(&mut tx, flickr).await?.id),
            None => None,
        };
        let links_id =
            write::create_launch_links(&mut tx, &links, patch_id, reddit_id, flickr_id).await?;

        let written = write::upsert_launch(&mut tx, &external_id, &record, links_id).await?;
        let launch_id = written.id;

        let mut core_ids = Vec::new();
        for core in record.cores.iter().flatten() {
            core_ids.push(write::find_or_create_core(&mut tx, core).await?.id);
        }
        // An empty core list keeps whatever was attached before
        if !core_ids.is_empty() {
            write::replace_launch_cores(&mut tx, launch_id, &core_ids).await?;
        }

        let crew = write::resolve_crew_ids(&mut tx, &record.crew_ids()).await?;
        let payloads = write::resolve_payload_ids(&mut tx, &record.payload_ids()).await?;
        write::replace_launch_crew(&mut tx, launch_id, &crew.ids).await?;
        write::replace_launch_payloads(&mut tx, launch_id, &payloads.ids).await?;

        tx.commit().await?;

        for missing in &crew.missing {
            debug!(launch = %external_id, crew = %missing, "Unresolved crew reference dropped");
        }
        for missing in &payloads.missing {
            debug!(launch = %external_id, payload = %missing, "Unresolved payload reference dropped");
        }
        debug!(
            id = %external_id,
            outcome = ?written.outcome,
            cores = core_ids.len(),
            crew = crew.ids.len(),
            payloads = payloads.ids.len(),
            "Launch"
        );

        Ok(Reconciled {
            outcome: written.outcome,
            unresolved: crew.missing.len() + payloads.missing.len(),
        })
    }
}
