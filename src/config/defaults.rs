//! Default values for configuration

/// Environment variable that overrides `api.base_url` whenever a config is loaded
pub const API_URL_ENV: &str = "SPACEX_API_URL";

/// Default API base URL
pub fn default_api_base_url() -> String {
    "https://api.spacexdata.com".to_string()
}

/// Default path of the crew collection
pub fn default_crew_path() -> String {
    "/v4/crew".to_string()
}

/// Default path of the payloads collection
pub fn default_payloads_path() -> String {
    "/v4/payloads".to_string()
}

/// Default path of the launches collection (v5 carries crew roles and cores)
pub fn default_launches_path() -> String {
    "/v5/launches".to_string()
}

/// Default request timeout in seconds
pub fn default_api_timeout() -> u64 {
    30
}

/// Default user agent string
pub fn default_api_user_agent() -> String {
    format!("spacex-mirror/{}", env!("CARGO_PKG_VERSION"))
}

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default database file name
pub const DB_FILE_NAME: &str = "mirror.db";
