//! Local mirror storage using SQLite
//!
//! This module handles all local storage:
//! - Mirrored entities (crew, payloads, launches and their nested records)
//! - Launch associations (crew, payloads, cores)
//! - Ingestion runs (history and stats)

mod entities;
mod query;
mod schema;
pub mod write;

pub use entities::*;
pub use schema::*;

use crate::api::Collection;
use crate::config::Config;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Ingestion run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(Error::Config(format!("Unknown run status: {}", s))),
        }
    }
}

/// An ingestion run record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IngestionRun {
    pub id: String,
    pub collection: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub records_seen: i64,
    pub records_created: i64,
    pub records_updated: i64,
    pub records_unchanged: i64,
    pub records_skipped: i64,
    pub unresolved_references: i64,
    pub errors_json: Option<String>,
}

impl IngestionRun {
    pub fn new(collection: Collection) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection: collection.to_string(),
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
            status: RunStatus::Running.to_string(),
            records_seen: 0,
            records_created: 0,
            records_updated: 0,
            records_unchanged: 0,
            records_skipped: 0,
            unresolved_references: 0,
            errors_json: None,
        }
    }

    pub fn get_status(&self) -> Result<RunStatus> {
        self.status.parse()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors_json
            .as_ref()
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default()
    }
}

/// Final counts of a run
#[derive(Debug, Clone, Default)]
pub struct RunCounts {
    pub seen: i64,
    pub created: i64,
    pub updated: i64,
    pub unchanged: i64,
    pub skipped: i64,
    pub unresolved: i64,
}

/// Row counts across the mirror
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub crew_count: usize,
    pub payload_count: usize,
    pub dragon_count: usize,
    pub launch_count: usize,
    pub launch_links_count: usize,
    pub patch_links_count: usize,
    pub reddit_links_count: usize,
    pub flickr_links_count: usize,
    pub core_count: usize,
}

/// Mirror database handle
#[derive(Clone)]
pub struct SpaceDb {
    pool: SqlitePool,
}

impl SpaceDb {
    /// Connect to the database named by the config
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open the database at `db_path`, creating the schema if needed
    pub async fn new(db_path: &Path) -> Result<Self> {
        let db = Self::open(db_path).await?;

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='launches'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    /// Start a transaction. Dropping it without commit rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    // ===== Ingestion Run Operations =====

    /// Start a new ingestion run
    pub async fn start_ingestion_run(&self, collection: Collection) -> Result<IngestionRun> {
        let run = IngestionRun::new(collection);
        sqlx::query(
            r#"
            INSERT INTO ingestion_runs (id, collection, started_at, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.collection)
        .bind(&run.started_at)
        .bind(&run.status)
        .execute(&self.pool)
        .await?;
        Ok(run)
    }

    /// Complete an ingestion run
    pub async fn complete_ingestion_run(
        &self,
        id: &str,
        status: RunStatus,
        counts: &RunCounts,
        errors: Option<Vec<String>>,
    ) -> Result<()> {
        let errors_json = errors.map(|e| serde_json::to_string(&e)).transpose()?;
        sqlx::query(
            r#"
            UPDATE ingestion_runs SET
                completed_at = ?,
                status = ?,
                records_seen = ?,
                records_created = ?,
                records_updated = ?,
                records_unchanged = ?,
                records_skipped = ?,
                unresolved_references = ?,
                errors_json = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(status.to_string())
        .bind(counts.seen)
        .bind(counts.created)
        .bind(counts.updated)
        .bind(counts.unchanged)
        .bind(counts.skipped)
        .bind(counts.unresolved)
        .bind(errors_json)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get latest ingestion run for a collection
    pub async fn get_latest_run(&self, collection: Collection) -> Result<Option<IngestionRun>> {
        let run = sqlx::query_as::<_, IngestionRun>(
            "SELECT * FROM ingestion_runs WHERE collection = ? ORDER BY started_at DESC LIMIT 1",
        )
        .bind(collection.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(run)
    }

    // ===== Statistics =====

    async fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Get global statistics
    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        Ok(GlobalStats {
            crew_count: self.count("crew_members").await?,
            payload_count: self.count("payloads").await?,
            dragon_count: self.count("dragons").await?,
            launch_count: self.count("launches").await?,
            launch_links_count: self.count("launch_links").await?,
            patch_links_count: self.count("patch_links").await?,
            reddit_links_count: self.count("reddit_links").await?,
            flickr_links_count: self.count("flickr_links").await?,
            core_count: self.count("launch_cores").await?,
        })
    }
}
