//! Ingest command implementation

use crate::api::{Collection, RecordSource};
use crate::db::{RunCounts, RunStatus, SpaceDb};
use crate::error::Result;
use crate::progress::{finish_progress, ingest_progress_bar};
use crate::reconcile::{IngestStats, Reconciler};
use tracing::{error, info};

fn run_counts(stats: &IngestStats) -> RunCounts {
    RunCounts {
        seen: stats.records_seen as i64,
        created: stats.created as i64,
        updated: stats.updated as i64,
        unchanged: stats.unchanged as i64,
        skipped: stats.skipped as i64,
        unresolved: stats.unresolved_references as i64,
    }
}

/// Fetch one collection from `source` and reconcile it into the store.
/// The run is recorded in the ingestion history either way, with whatever
/// counts were reached before a failure.
pub async fn cmd_ingest(
    db: &SpaceDb,
    source: &dyn RecordSource,
    collection: Collection,
) -> Result<IngestStats> {
    let run = db.start_ingestion_run(collection).await?;
    info!(run = %run.id, "Ingesting {}", collection);

    let mut stats = IngestStats::new(collection);
    match fetch_and_reconcile(db, source, &mut stats).await {
        Ok(()) => {
            let errors = (!stats.errors.is_empty()).then(|| stats.errors.clone());
            db.complete_ingestion_run(&run.id, RunStatus::Completed, &run_counts(&stats), errors)
                .await?;
            Ok(stats)
        }
        Err(e) => {
            error!(run = %run.id, "Ingest of {} failed: {}", collection, e);
            let mut errors = stats.errors.clone();
            errors.push(e.to_string());
            db.complete_ingestion_run(
                &run.id,
                RunStatus::Failed,
                &run_counts(&stats),
                Some(errors),
            )
            .await?;
            Err(e)
        }
    }
}

async fn fetch_and_reconcile(
    db: &SpaceDb,
    source: &dyn RecordSource,
    stats: &mut IngestStats,
) -> Result<()> {
    let collection = stats.collection;
    let records = source.fetch(collection).await?;
    info!("Fetched {} {} records", records.len(), collection);

    let progress = ingest_progress_bar(collection, records.len());
    let result = Reconciler::new(db)
        .with_progress(progress.clone())
        .ingest_into(&records, stats)
        .await;
    finish_progress(progress.as_ref(), collection);
    result
}

/// Ingest every collection in dependency order so launch references resolve.
/// Stops at the first collection that fails.
pub async fn cmd_ingest_all(db: &SpaceDb, source: &dyn RecordSource) -> Result<Vec<IngestStats>> {
    let mut all = Vec::with_capacity(Collection::SYNC_ORDER.len());
    for collection in Collection::SYNC_ORDER {
        all.push(cmd_ingest(db, source, collection).await?);
    }
    Ok(all)
}

/// Print ingest stats to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingested {}", stats.collection);
    println!("  Records seen: {}", stats.records_seen);
    println!("  Created: {}", stats.created);
    println!("  Updated: {}", stats.updated);
    println!("  Unchanged: {}", stats.unchanged);
    if stats.unresolved_references > 0 {
        println!("  Unresolved references: {}", stats.unresolved_references);
    }
    if stats.skipped > 0 {
        println!("  Skipped: {}", stats.skipped);
        for err in stats.errors.iter().take(5) {
            println!("    - {}", err);
        }
        if stats.errors.len() > 5 {
            println!("    ... and {} more", stats.errors.len() - 5);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves canned collections; anything else is a 503
    struct StaticSource(HashMap<Collection, Value>);

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch(&self, collection: Collection) -> Result<Vec<Value>> {
            match self.0.get(&collection) {
                Some(Value::Array(records)) => Ok(records.clone()),
                _ => Err(Error::HttpStatus {
                    status: 503,
                    url: format!("static://{}", collection),
                }),
            }
        }
    }

    async fn setup_test_db() -> (SpaceDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = SpaceDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    #[tokio::test]
    async fn test_ingest_all_resolves_cross_references() {
        let (db, _tmp) = setup_test_db().await;
        let source = StaticSource(HashMap::from([
            (Collection::Crew, json!([{"id": "crew_1", "name": "Doug Hurley"}])),
            (Collection::Payloads, json!([{"id": "payload_1", "name": "Demo-2"}])),
            (
                Collection::Launches,
                json!([{"id": "launch_1", "crew": ["crew_1"], "payloads": ["payload_1"]}]),
            ),
        ]));

        let stats = cmd_ingest_all(&db, &source).await.unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[2].unresolved_references, 0);

        let run = db
            .get_latest_run(Collection::Launches)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.get_status().unwrap(), RunStatus::Completed);
        assert_eq!(run.records_created, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_marks_run_failed() {
        let (db, _tmp) = setup_test_db().await;
        let source = StaticSource(HashMap::new());

        let err = cmd_ingest(&db, &source, Collection::Crew).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));

        let run = db.get_latest_run(Collection::Crew).await.unwrap().unwrap();
        assert_eq!(run.get_status().unwrap(), RunStatus::Failed);
        assert_eq!(run.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_skipped_records_are_recorded_on_the_run() {
        let (db, _tmp) = setup_test_db().await;
        let source = StaticSource(HashMap::from([(
            Collection::Payloads,
            json!([{"name": "anonymous"}, {"id": "payload_1"}]),
        )]));

        let stats = cmd_ingest(&db, &source, Collection::Payloads)
            .await
            .unwrap();
        assert_eq!(stats.skipped, 1);

        let run = db
            .get_latest_run(Collection::Payloads)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.records_skipped, 1);
        assert_eq!(run.errors(), vec!["payloads record #0 has no id".to_string()]);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_partial_counts() {
        let (db, _tmp) = setup_test_db().await;

        let mut tx = db.begin().await.unwrap();
        sqlx::query(
            r#"
            CREATE TRIGGER fail_crew_insert BEFORE INSERT ON crew_members
            WHEN NEW.external_id = 'crew_2'
            BEGIN SELECT RAISE(ABORT, 'disk on fire'); END
            "#,
        )
        .execute(&mut *tx)
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let source = StaticSource(HashMap::from([(
            Collection::Crew,
            json!([{"id": "crew_1"}, {"id": "crew_2"}, {"id": "crew_3"}]),
        )]));

        let err = cmd_ingest(&db, &source, Collection::Crew).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        let run = db.get_latest_run(Collection::Crew).await.unwrap().unwrap();
        assert_eq!(run.get_status().unwrap(), RunStatus::Failed);
        assert_eq!(run.records_seen, 2);
        assert_eq!(run.records_created, 1);
        assert_eq!(run.errors().len(), 1);

        assert!(db.get_crew_member("crew_1").await.unwrap().is_some());
        assert!(db.get_crew_member("crew_3").await.unwrap().is_none());
    }
}
