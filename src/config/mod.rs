//! Configuration management for spacex-mirror
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::api::Collection;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Upstream data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Path of the crew collection
    #[serde(default = "default_crew_path")]
    pub crew_path: String,

    /// Path of the payloads collection
    #[serde(default = "default_payloads_path")]
    pub payloads_path: String,

    /// Path of the launches collection
    #[serde(default = "default_launches_path")]
    pub launches_path: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_api_user_agent")]
    pub user_agent: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for spacex-mirror data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            crew_path: default_crew_path(),
            payloads_path: default_payloads_path(),
            launches_path: default_launches_path(),
            timeout_secs: default_api_timeout(),
            user_agent: default_api_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Full URL of one external collection
    pub fn collection_url(&self, collection: Collection) -> Result<Url> {
        let path = match collection {
            Collection::Crew => &self.crew_path,
            Collection::Payloads => &self.payloads_path,
            Collection::Launches => &self.launches_path,
        };
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(path)?)
    }
}

impl Config {
    /// Get the default base directory (~/.spacex-mirror)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".spacex-mirror")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join(CONFIG_FILE_NAME)
    }

    pub(crate) fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join(CONFIG_FILE_NAME),
            db_file: base.join(DB_FILE_NAME),
            base_dir: base,
        };
    }

    /// Point the paths at an explicit config file. The database lives next to it.
    pub(crate) fn set_config_file(&mut self, config_file: &Path) {
        let base = config_file
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        self.paths = PathsConfig {
            config_file: config_file.to_path_buf(),
            db_file: base.join(DB_FILE_NAME),
            base_dir: base,
        };
    }

    /// Replace `api.base_url` with a non-blank override
    pub fn override_base_url(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            debug!("Overriding api.base_url with {}", url);
            self.api.base_url = url;
        }
    }

    fn apply_env_overrides(&mut self) {
        self.override_base_url(std::env::var(API_URL_ENV).ok());
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.set_config_file(config_path);

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to
    /// defaults when no config file exists there yet
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Check if the mirror is initialized (config and DB exist)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists() && self.paths.db_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.api.base_url)
            .map_err(|e| Error::Config(format!("api.base_url is not a valid URL: {}", e)))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(Error::Config(format!(
                "api.base_url must use http or https, got '{}'",
                base.scheme()
            )));
        }

        for (key, path) in [
            ("api.crew_path", &self.api.crew_path),
            ("api.payloads_path", &self.api.payloads_path),
            ("api.launches_path", &self.api.launches_path),
        ] {
            if path.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.launches_path, "/v5/launches");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.api.crew_path = "/v4/crew-mirror".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.api.crew_path, "/v4/crew-mirror");
        assert_eq!(loaded.paths.db_file, tmp.path().join(DB_FILE_NAME));

        let loaded = Config::load(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded.api.crew_path, "/v4/crew-mirror");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[api]\ntimeout_secs = 5\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api.timeout_secs, 5);
        assert_eq!(loaded.api.payloads_path, "/v4/payloads");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.api.timeout_secs = 10;
        assert!(config.validate().is_ok());

        config.api.base_url = "ftp://api.spacexdata.com".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://api.spacexdata.com".to_string();
        config.api.launches_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_dir_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[api]\ntimeout_secs = 0\nbase_url = \"ftp://x\"\n",
        )
        .unwrap();

        let err = Config::load_from(Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(Config::load(&tmp.path().join(CONFIG_FILE_NAME)).is_err());
    }

    #[test]
    fn test_base_url_override() {
        let mut config = Config::default();
        config.api.base_url = "https://saved.example.com".to_string();

        config.override_base_url(None);
        assert_eq!(config.api.base_url, "https://saved.example.com");
        config.override_base_url(Some("   ".to_string()));
        assert_eq!(config.api.base_url, "https://saved.example.com");
        config.override_base_url(Some("http://127.0.0.1:3000".to_string()));
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_custom_config_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        let mut config = Config::default();
        config.set_config_file(&path);
        config.save().unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.paths.config_file, path);
        assert_eq!(loaded.paths.db_file, tmp.path().join(DB_FILE_NAME));
    }

    #[test]
    fn test_collection_url() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:8080".to_string();

        let url = config.api.collection_url(Collection::Launches).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v5/launches");
        let url = config.api.collection_url(Collection::Crew).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v4/crew");
    }
}
