//! Persisted entity rows
//!
//! JSON list columns are kept as text, like the rest of the schema, and
//! decoded on demand through the accessor methods.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

fn decode_list<T: DeserializeOwned>(json: Option<&str>) -> Vec<T> {
    json.and_then(|j| serde_json::from_str(j).ok())
        .unwrap_or_default()
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// A crew member
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CrewMember {
    pub id: i64,
    pub external_id: String,
    pub name: Option<String>,
    pub agency: Option<String>,
    pub image_url: Option<String>,
    pub wikipedia_url: Option<String>,
    pub launches_json: String,
    pub status: Option<String>,
}

impl CrewMember {
    /// External launch ids, informational only
    pub fn launches(&self) -> Vec<String> {
        decode_list(Some(&self.launches_json))
    }
}

impl fmt::Display for CrewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or_default())
    }
}

/// Capsule recovery details
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dragon {
    pub id: i64,
    pub capsule: Option<String>,
    pub mass_returned_kg: Option<f64>,
    pub mass_returned_lbs: Option<f64>,
    pub flight_time_sec: Option<i64>,
    pub manifest: Option<String>,
    pub water_landing: Option<bool>,
    pub land_landing: Option<bool>,
}

impl fmt::Display for Dragon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.capsule.as_deref().filter(|c| !c.is_empty()) {
            Some(capsule) => write!(f, "Dragon Capsule {}", capsule),
            None => write!(f, "Dragon (ID: {})", self.id),
        }
    }
}

/// A payload
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payload {
    pub id: i64,
    pub external_id: String,
    pub name: Option<String>,
    pub payload_type: Option<String>,
    pub reused: Option<bool>,
    pub launch: Option<String>,
    pub customers_json: Option<String>,
    pub nationalities_json: Option<String>,
    pub manufacturers_json: Option<String>,
    pub norad_ids_json: Option<String>,
    pub mass_kg: Option<f64>,
    pub mass_lbs: Option<f64>,
    pub orbit: Option<String>,
    pub reference_system: Option<String>,
    pub regime: Option<String>,
    pub longitude: Option<f64>,
    pub semi_major_axis_km: Option<f64>,
    pub eccentricity: Option<f64>,
    pub periapsis_km: Option<f64>,
    pub apoapsis_km: Option<f64>,
    pub inclination_deg: Option<f64>,
    pub period_min: Option<f64>,
    pub lifespan_years: Option<i64>,
    pub epoch: Option<String>,
    pub mean_motion: Option<f64>,
    pub raan: Option<f64>,
    pub arg_of_pericenter: Option<f64>,
    pub mean_anomaly: Option<f64>,
    pub dragon_id: Option<i64>,
}

impl Payload {
    pub fn customers(&self) -> Vec<String> {
        decode_list(self.customers_json.as_deref())
    }

    pub fn nationalities(&self) -> Vec<String> {
        decode_list(self.nationalities_json.as_deref())
    }

    pub fn manufacturers(&self) -> Vec<String> {
        decode_list(self.manufacturers_json.as_deref())
    }

    pub fn norad_ids(&self) -> Vec<i64> {
        decode_list(self.norad_ids_json.as_deref())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PatchLinks {
    pub id: i64,
    pub small: Option<String>,
    pub large: Option<String>,
}

impl fmt::Display for PatchLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Patch Links (Small: {})", or_na(self.small.as_deref()))
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RedditLinks {
    pub id: i64,
    pub campaign: Option<String>,
    pub launch: Option<String>,
    pub media: Option<String>,
    pub recovery: Option<String>,
}

impl fmt::Display for RedditLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reddit Links (Launch: {})", or_na(self.launch.as_deref()))
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FlickrLinks {
    pub id: i64,
    pub small_json: String,
    pub original_json: String,
}

impl FlickrLinks {
    pub fn small(&self) -> Vec<String> {
        decode_list(Some(&self.small_json))
    }

    pub fn original(&self) -> Vec<String> {
        decode_list(Some(&self.original_json))
    }
}

impl fmt::Display for FlickrLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flickr Links ({} original images)", self.original().len())
    }
}

/// The links block of one launch ingest
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LaunchLinks {
    pub id: i64,
    pub patch_id: Option<i64>,
    pub reddit_id: Option<i64>,
    pub flickr_id: Option<i64>,
    pub presskit: Option<String>,
    pub webcast: Option<String>,
    pub youtube_id: Option<String>,
    pub article: Option<String>,
    pub wikipedia: Option<String>,
}

impl fmt::Display for LaunchLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Launch Links (YouTube ID: {})",
            or_na(self.youtube_id.as_deref())
        )
    }
}

/// One booster core usage
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LaunchCore {
    pub id: i64,
    pub core: Option<String>,
    pub flight: Option<i64>,
    pub gridfins: Option<bool>,
    pub legs: Option<bool>,
    pub reused: Option<bool>,
    pub landing_attempt: Option<bool>,
    pub landing_success: Option<bool>,
    pub landing_type: Option<String>,
    pub landpad: Option<String>,
}

impl fmt::Display for LaunchCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flight = self
            .flight
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        write!(f, "Core {} (Flight: {})", or_na(self.core.as_deref()), flight)
    }
}

/// A launch
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Launch {
    pub id: i64,
    pub external_id: String,
    pub fairings_json: Option<String>,
    pub static_fire_date_utc: Option<String>,
    pub static_fire_date_unix: Option<i64>,
    pub tbd: Option<bool>,
    pub net: Option<bool>,
    pub launch_window: Option<i64>,
    pub rocket: Option<String>,
    pub success: Option<bool>,
    pub failures_json: String,
    pub details: Option<String>,
    pub ships_json: String,
    pub capsules_json: String,
    pub launchpad: Option<String>,
    pub auto_update: Option<bool>,
    pub flight_number: Option<i64>,
    pub name: Option<String>,
    pub date_utc: Option<String>,
    pub date_unix: Option<i64>,
    pub date_local: Option<String>,
    pub date_precision: Option<String>,
    pub upcoming: Option<bool>,
    pub links_id: Option<i64>,
}

impl Launch {
    pub fn fairings(&self) -> Option<serde_json::Value> {
        self.fairings_json
            .as_deref()
            .and_then(|j| serde_json::from_str(j).ok())
    }

    pub fn failures(&self) -> Vec<serde_json::Value> {
        decode_list(Some(&self.failures_json))
    }

    pub fn ships(&self) -> Vec<String> {
        decode_list(Some(&self.ships_json))
    }

    pub fn capsules(&self) -> Vec<String> {
        decode_list(Some(&self.capsules_json))
    }
}

impl fmt::Display for Launch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or_default())
    }
}

/// Launch links with their nested link records resolved
#[derive(Debug, Clone, Serialize)]
pub struct LaunchLinksDetail {
    #[serde(flatten)]
    pub links: LaunchLinks,
    pub patch: Option<PatchLinks>,
    pub reddit: Option<RedditLinks>,
    pub flickr: Option<FlickrLinks>,
}

/// A launch with everything it points at
#[derive(Debug, Clone, Serialize)]
pub struct LaunchDetail {
    #[serde(flatten)]
    pub launch: Launch,
    pub links: Option<LaunchLinksDetail>,
    pub crew: Vec<CrewMember>,
    pub payloads: Vec<Payload>,
    pub cores: Vec<LaunchCore>,
}

/// A payload with its capsule record
#[derive(Debug, Clone, Serialize)]
pub struct PayloadDetail {
    #[serde(flatten)]
    pub payload: Payload,
    pub dragon: Option<Dragon>,
}
