//! Init command implementation

use crate::config::Config;
use crate::db::SpaceDb;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Write a default config to `config_file` and create the database schema
/// next to it
pub async fn cmd_init(config_file: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.set_config_file(&config_file.unwrap_or_else(Config::default_config_path));

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let db = SpaceDb::connect(&config).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(config)
}

/// Print the post-init summary
pub fn print_init(config: &Config) {
    println!("✓ Initialized spacex-mirror at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Database: {:?}", config.paths.db_file);
    println!("API: {}", config.api.base_url);
    println!("\nNext steps:");
    println!("  spacex-mirror ingest all        # Mirror crew, payloads and launches");
    println!("  spacex-mirror launches          # Browse mirrored launches");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_config_and_schema() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("mirror");

        let config = cmd_init(Some(base.join("config.toml")), false)
            .await
            .unwrap();
        assert!(config.is_initialized());
        assert_eq!(config.paths.db_file, base.join("mirror.db"));

        let db = SpaceDb::connect(&config).await.unwrap();
        assert!(db.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        cmd_init(Some(path.clone()), false).await.unwrap();
        let err = cmd_init(Some(path.clone()), false).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized(_)));

        cmd_init(Some(path), true).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_honors_custom_config_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");

        cmd_init(Some(path.clone()), false).await.unwrap();
        assert!(path.exists());
        assert!(!tmp.path().join("config.toml").exists());

        let config = Config::load(&path).unwrap();
        assert!(config.is_initialized());
    }

    #[tokio::test]
    async fn test_init_writes_default_base_url() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        cmd_init(Some(path.clone()), false).await.unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("https://api.spacexdata.com"));
    }
}
