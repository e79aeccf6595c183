//! Custom error types for spacex-mirror

use thiserror::Error;

/// Main error type for spacex-mirror operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{collection} record #{index} has no id")]
    MissingIdentifier { collection: String, index: usize },

    #[error("{collection} record #{index} is malformed: {reason}")]
    MalformedRecord {
        collection: String,
        index: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not initialized: run 'spacex-mirror init' first")]
    NotInitialized,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),
}

impl Error {
    /// Errors scoped to a single record. The reconciler skips these and
    /// carries on with the rest of the batch.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            Error::MissingIdentifier { .. } | Error::MalformedRecord { .. }
        )
    }
}

/// Result type alias for spacex-mirror
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_are_skippable() {
        let missing = Error::MissingIdentifier {
            collection: "crew".to_string(),
            index: 3,
        };
        assert!(missing.is_record_error());
        assert_eq!(missing.to_string(), "crew record #3 has no id");

        let status = Error::HttpStatus {
            status: 503,
            url: "https://api.spacexdata.com/v4/crew".to_string(),
        };
        assert!(!status.is_record_error());
        assert!(!Error::Parse("not json".to_string()).is_record_error());
    }
}
