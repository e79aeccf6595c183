//! Status command implementation

use crate::api::Collection;
use crate::config::Config;
use crate::db::{GlobalStats, IngestionRun, SpaceDb};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub api_base_url: String,
    pub db_stats: GlobalStats,
    pub latest_runs: Vec<IngestionRun>,
}

/// Get mirror status
pub async fn cmd_status(config: &Config, db: &SpaceDb) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = db.get_global_stats().await?;

    let mut latest_runs = Vec::new();
    for collection in Collection::SYNC_ORDER {
        if let Some(run) = db.get_latest_run(collection).await? {
            latest_runs.push(run);
        }
    }

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        api_base_url: config.api.base_url.clone(),
        db_stats,
        latest_runs,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 spacex-mirror Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("API: {}", status.api_base_url);

    let stats = &status.db_stats;
    println!("\nDatabase Stats:");
    println!("  Launches: {}", stats.launch_count);
    println!("  Payloads: {}", stats.payload_count);
    println!("  Crew: {}", stats.crew_count);
    println!("  Dragons: {}", stats.dragon_count);
    println!("  Cores: {}", stats.core_count);
    println!(
        "  Links: {} launch, {} patch, {} reddit, {} flickr",
        stats.launch_links_count,
        stats.patch_links_count,
        stats.reddit_links_count,
        stats.flickr_links_count
    );

    println!("\nLatest Runs:");
    if status.latest_runs.is_empty() {
        println!("  None yet. Use 'spacex-mirror ingest all' to mirror the API.");
        return;
    }
    for run in &status.latest_runs {
        println!(
            "  {} [{}] started {}",
            run.collection, run.status, run.started_at
        );
        println!(
            "    seen {}, created {}, updated {}, unchanged {}, skipped {}, unresolved {}",
            run.records_seen,
            run.records_created,
            run.records_updated,
            run.records_unchanged,
            run.records_skipped,
            run.unresolved_references
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{RunCounts, RunStatus};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_lists_latest_runs_in_sync_order() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        let db = SpaceDb::new(&config.paths.db_file).await.unwrap();

        for collection in [Collection::Launches, Collection::Crew] {
            let run = db.start_ingestion_run(collection).await.unwrap();
            db.complete_ingestion_run(&run.id, RunStatus::Completed, &RunCounts::default(), None)
                .await
                .unwrap();
        }

        let status = cmd_status(&config, &db).await.unwrap();
        let collections: Vec<&str> = status
            .latest_runs
            .iter()
            .map(|r| r.collection.as_str())
            .collect();
        assert_eq!(collections, vec!["crew", "launches"]);
        assert_eq!(status.db_stats, GlobalStats::default());
    }
}
