//! Inbound record shapes
//!
//! The upstream API is loose about which keys it sends, so every field is
//! optional and missing keys deserialize to `None`. A key holding a value of
//! the wrong type is still a decode error; the reconciler turns that into a
//! skipped record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Values that count as "nothing there" when deciding whether a nested
/// object is worth a row: null, false, zero, "" and [].
pub trait IsBlank {
    fn is_blank(&self) -> bool;
}

impl IsBlank for Option<String> {
    fn is_blank(&self) -> bool {
        self.as_deref().map_or(true, str::is_empty)
    }
}

impl IsBlank for Option<bool> {
    fn is_blank(&self) -> bool {
        !self.unwrap_or(false)
    }
}

impl IsBlank for Option<i64> {
    fn is_blank(&self) -> bool {
        self.unwrap_or(0) == 0
    }
}

impl IsBlank for Option<f64> {
    fn is_blank(&self) -> bool {
        self.unwrap_or(0.0) == 0.0
    }
}

impl IsBlank for Option<Vec<String>> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, Vec::is_empty)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrewRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub agency: Option<String>,
    pub image: Option<String>,
    pub wikipedia: Option<String>,
    pub launches: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Capsule recovery details nested in a payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DragonRecord {
    pub capsule: Option<String>,
    pub mass_returned_kg: Option<f64>,
    pub mass_returned_lbs: Option<f64>,
    pub flight_time_sec: Option<i64>,
    pub manifest: Option<String>,
    pub water_landing: Option<bool>,
    pub land_landing: Option<bool>,
}

impl IsBlank for DragonRecord {
    fn is_blank(&self) -> bool {
        self.capsule.is_blank()
            && self.mass_returned_kg.is_blank()
            && self.mass_returned_lbs.is_blank()
            && self.flight_time_sec.is_blank()
            && self.manifest.is_blank()
            && self.water_landing.is_blank()
            && self.land_landing.is_blank()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayloadRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub payload_type: Option<String>,
    pub reused: Option<bool>,
    pub launch: Option<String>,
    pub customers: Option<Vec<String>>,
    pub nationalities: Option<Vec<String>>,
    pub manufacturers: Option<Vec<String>>,
    pub norad_ids: Option<Vec<i64>>,
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
    pub dragon: Option<DragonRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatchRecord {
    pub small: Option<String>,
    pub large: Option<String>,
}

impl IsBlank for PatchRecord {
    fn is_blank(&self) -> bool {
        self.small.is_blank() && self.large.is_blank()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditRecord {
    pub campaign: Option<String>,
    pub launch: Option<String>,
    pub media: Option<String>,
    pub recovery: Option<String>,
}

impl IsBlank for RedditRecord {
    fn is_blank(&self) -> bool {
        self.campaign.is_blank()
            && self.launch.is_blank()
            && self.media.is_blank()
            && self.recovery.is_blank()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlickrRecord {
    pub small: Option<Vec<String>>,
    pub original: Option<Vec<String>>,
}

impl IsBlank for FlickrRecord {
    fn is_blank(&self) -> bool {
        self.small.is_blank() && self.original.is_blank()
    }
}

/// The `links` object of a launch
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinksRecord {
    pub patch: Option<PatchRecord>,
    pub reddit: Option<RedditRecord>,
    pub flickr: Option<FlickrRecord>,
    pub presskit: Option<String>,
    pub webcast: Option<String>,
    pub youtube_id: Option<String>,
    pub article: Option<String>,
    pub wikipedia: Option<String>,
}

impl LinksRecord {
    pub fn patch(&self) -> Option<&PatchRecord> {
        self.patch.as_ref().filter(|p| !p.is_blank())
    }

    pub fn reddit(&self) -> Option<&RedditRecord> {
        self.reddit.as_ref().filter(|r| !r.is_blank())
    }

    pub fn flickr(&self) -> Option<&FlickrRecord> {
        self.flickr.as_ref().filter(|f| !f.is_blank())
    }
}

/// One booster core used by a launch
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreRecord {
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

/// Crew reference inside a launch. The v4 API lists bare ids, v5 lists
/// `{crew, role}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CrewRef {
    Id(String),
    Assignment { crew: Option<String> },
}

impl CrewRef {
    pub fn crew_id(&self) -> Option<&str> {
        match self {
            CrewRef::Id(id) => Some(id),
            CrewRef::Assignment { crew } => crew.as_deref(),
        }
    }
}

/// Tells an explicit `null` (`Some(None)`) apart from a missing key (`None`)
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LaunchRecord {
    pub id: Option<String>,
    pub fairings: Option<Value>,
    pub static_fire_date_utc: Option<String>,
    pub static_fire_date_unix: Option<i64>,
    /// Missing defaults to false; an explicit null is kept
    #[serde(alias = "tdb", deserialize_with = "present")]
    pub tbd: Option<Option<bool>>,
    #[serde(deserialize_with = "present")]
    pub net: Option<Option<bool>>,
    pub window: Option<i64>,
    pub rocket: Option<String>,
    pub success: Option<bool>,
    pub failures: Option<Vec<Value>>,
    pub details: Option<String>,
    pub crew: Option<Vec<CrewRef>>,
    pub ships: Option<Vec<String>>,
    pub capsules: Option<Vec<String>>,
    pub payloads: Option<Vec<String>>,
    pub launchpad: Option<String>,
    pub auto_update: Option<bool>,
    pub flight_number: Option<i64>,
    pub name: Option<String>,
    pub date_utc: Option<String>,
    pub date_unix: Option<i64>,
    pub date_local: Option<String>,
    pub date_precision: Option<String>,
    pub upcoming: Option<bool>,
    pub cores: Option<Vec<CoreRecord>>,
    pub links: Option<LinksRecord>,
}

impl LaunchRecord {
    /// External crew ids referenced by this launch
    pub fn crew_ids(&self) -> Vec<String> {
        self.crew
            .iter()
            .flatten()
            .filter_map(CrewRef::crew_id)
            .map(str::to_string)
            .collect()
    }

    /// External payload ids referenced by this launch
    pub fn payload_ids(&self) -> Vec<String> {
        self.payloads.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_decode_to_none() {
        let record: PayloadRecord = serde_json::from_value(json!({"id": "p1"})).unwrap();
        assert_eq!(record.id.as_deref(), Some("p1"));
        assert!(record.periapsis_km.is_none());
        assert!(record.dragon.is_none());
    }

    #[test]
    fn test_wrong_type_is_a_decode_error() {
        let result = serde_json::from_value::<CrewRecord>(json!({"id": "c1", "name": 42}));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_dragon() {
        let dragon: DragonRecord = serde_json::from_value(json!({
            "capsule": null, "mass_returned_kg": null, "mass_returned_lbs": null,
            "flight_time_sec": null, "manifest": null, "water_landing": null,
            "land_landing": null
        }))
        .unwrap();
        assert!(dragon.is_blank());

        let dragon: DragonRecord =
            serde_json::from_value(json!({"capsule": "", "water_landing": false})).unwrap();
        assert!(dragon.is_blank());

        let dragon: DragonRecord = serde_json::from_value(json!({"flight_time_sec": 3600})).unwrap();
        assert!(!dragon.is_blank());
    }

    #[test]
    fn test_blank_links_are_filtered() {
        let links: LinksRecord = serde_json::from_value(json!({
            "patch": {"small": null, "large": null},
            "reddit": {"campaign": "https://reddit.com/r/spacex/c"},
            "flickr": {"small": [], "original": []}
        }))
        .unwrap();
        assert!(links.patch().is_none());
        assert!(links.reddit().is_some());
        assert!(links.flickr().is_none());
    }

    #[test]
    fn test_crew_refs_accept_both_api_versions() {
        let launch: LaunchRecord = serde_json::from_value(json!({
            "id": "l1",
            "crew": ["crew_a", {"crew": "crew_b", "role": "Commander"}, {"crew": null, "role": "Pilot"}]
        }))
        .unwrap();
        assert_eq!(launch.crew_ids(), vec!["crew_a".to_string(), "crew_b".to_string()]);
    }

    #[test]
    fn test_tdb_alias() {
        let launch: LaunchRecord = serde_json::from_value(json!({"id": "l1", "tdb": true})).unwrap();
        assert_eq!(launch.tbd, Some(Some(true)));
    }

    #[test]
    fn test_null_flags_differ_from_missing() {
        let launch: LaunchRecord =
            serde_json::from_value(json!({"id": "l1", "net": null})).unwrap();
        assert_eq!(launch.net, Some(None));
        assert_eq!(launch.tbd, None);

        let bad = serde_json::from_value::<LaunchRecord>(json!({"id": "l1", "net": "soon"}));
        assert!(bad.is_err());
    }
}
