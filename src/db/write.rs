//! Write primitives used by the reconciler.
//!
//! Two kinds of keyed write exist and are kept apart on purpose:
//! `find_or_create_*` never touches an existing row, `upsert_*` replaces every
//! column of an existing row. Which one an entity gets decides whether it is
//! first-write-wins or last-write-wins.
//!
//! Every function takes a bare connection so the caller can run a whole record
//! inside one transaction.

use crate::error::Result;
use crate::records::{
    CoreRecord, CrewRecord, DragonRecord, FlickrRecord, LaunchRecord, LinksRecord, PatchRecord,
    PayloadRecord, RedditRecord,
};
use serde::Serialize;
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// What a keyed write did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Local id of the written row plus what happened to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Written {
    pub id: i64,
    pub outcome: Outcome,
}

impl Written {
    fn created(id: i64) -> Self {
        Self {
            id,
            outcome: Outcome::Created,
        }
    }

    fn existing(id: i64, outcome: Outcome) -> Self {
        Self { id, outcome }
    }
}

/// External ids split into the ones that resolved locally and the ones that
/// did not
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub ids: Vec<i64>,
    pub missing: Vec<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn to_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(to_json).transpose()
}

// ===== Crew =====

/// Find a crew member by external id
pub async fn find_crew_id(conn: &mut SqliteConnection, external_id: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM crew_members WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Create a crew member unless one with this external id exists.
/// An existing row is left exactly as it is.
pub async fn find_or_create_crew(
    conn: &mut SqliteConnection,
    external_id: &str,
    record: &CrewRecord,
) -> Result<Written> {
    if let Some(id) = find_crew_id(conn, external_id).await? {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let launches = to_json(&record.launches.clone().unwrap_or_default())?;
    let result = sqlx::query(
        r#"
        INSERT INTO crew_members (external_id, name, agency, image_url, wikipedia_url, launches_json, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(external_id)
    .bind(&record.name)
    .bind(&record.agency)
    .bind(&record.image)
    .bind(&record.wikipedia)
    .bind(launches)
    .bind(&record.status)
    .execute(&mut *conn)
    .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

// ===== Payloads =====

/// Find or create a Dragon keyed by (capsule, manifest). The remaining fields
/// only matter when the row is created.
pub async fn find_or_create_dragon(
    conn: &mut SqliteConnection,
    record: &DragonRecord,
) -> Result<Written> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM dragons WHERE capsule IS ? AND manifest IS ? ORDER BY id LIMIT 1",
    )
    .bind(&record.capsule)
    .bind(&record.manifest)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO dragons (capsule, mass_returned_kg, mass_returned_lbs, flight_time_sec, manifest, water_landing, land_landing)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.capsule)
    .bind(record.mass_returned_kg)
    .bind(record.mass_returned_lbs)
    .bind(record.flight_time_sec)
    .bind(&record.manifest)
    .bind(record.water_landing)
    .bind(record.land_landing)
    .execute(&mut *conn)
    .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

/// Find a payload by external id
pub async fn find_payload_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM payloads WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Insert a payload or replace every column of the existing one
pub async fn upsert_payload(
    conn: &mut SqliteConnection,
    external_id: &str,
    record: &PayloadRecord,
    dragon_id: Option<i64>,
) -> Result<Written> {
    let existing = find_payload_id(conn, external_id).await?;

    let sql = if existing.is_some() {
        r#"
        UPDATE payloads SET
            name = ?, payload_type = ?, reused = ?, launch = ?,
            customers_json = ?, nationalities_json = ?, manufacturers_json = ?, norad_ids_json = ?,
            mass_kg = ?, mass_lbs = ?, orbit = ?, reference_system = ?, regime = ?,
            longitude = ?, semi_major_axis_km = ?, eccentricity = ?, periapsis_km = ?,
            apoapsis_km = ?, inclination_deg = ?, period_min = ?, lifespan_years = ?,
            epoch = ?, mean_motion = ?, raan = ?, arg_of_pericenter = ?, mean_anomaly = ?,
            dragon_id = ?
        WHERE external_id = ?
        "#
    } else {
        r#"
        INSERT INTO payloads (
            name, payload_type, reused, launch,
            customers_json, nationalities_json, manufacturers_json, norad_ids_json,
            mass_kg, mass_lbs, orbit, reference_system, regime,
            longitude, semi_major_axis_km, eccentricity, periapsis_km,
            apoapsis_km, inclination_deg, period_min, lifespan_years,
            epoch, mean_motion, raan, arg_of_pericenter, mean_anomaly,
            dragon_id, external_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    };

    let result = sqlx::query(sql)
        .bind(&record.name)
        .bind(&record.payload_type)
        .bind(record.reused)
        .bind(&record.launch)
        .bind(to_json_opt(record.customers.as_ref())?)
        .bind(to_json_opt(record.nationalities.as_ref())?)
        .bind(to_json_opt(record.manufacturers.as_ref())?)
        .bind(to_json_opt(record.norad_ids.as_ref())?)
        .bind(record.mass_kg)
        .bind(record.mass_lbs)
        .bind(&record.orbit)
        .bind(&record.reference_system)
        .bind(&record.regime)
        .bind(record.longitude)
        .bind(record.semi_major_axis_km)
        .bind(record.eccentricity)
        .bind(record.periapsis_km)
        .bind(record.apoapsis_km)
        .bind(record.inclination_deg)
        .bind(record.period_min)
        .bind(record.lifespan_years)
        .bind(&record.epoch)
        .bind(record.mean_motion)
        .bind(record.raan)
        .bind(record.arg_of_pericenter)
        .bind(record.mean_anomaly)
        .bind(dragon_id)
        .bind(external_id)
        .execute(&mut *conn)
        .await?;

    Ok(match existing {
        Some(id) => Written::existing(id, Outcome::Updated),
        None => Written::created(result.last_insert_rowid()),
    })
}

// ===== Launch links =====

pub async fn find_or_create_patch_links(
    conn: &mut SqliteConnection,
    record: &PatchRecord,
) -> Result<Written> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM patch_links WHERE small IS ? AND large IS ? ORDER BY id LIMIT 1",
    )
    .bind(&record.small)
    .bind(&record.large)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let result = sqlx::query("INSERT INTO patch_links (small, large) VALUES (?, ?)")
        .bind(&record.small)
        .bind(&record.large)
        .execute(&mut *conn)
        .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

pub async fn find_or_create_reddit_links(
    conn: &mut SqliteConnection,
    record: &RedditRecord,
) -> Result<Written> {
    let existing = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM reddit_links
        WHERE campaign IS ? AND launch IS ? AND media IS ? AND recovery IS ?
        ORDER BY id LIMIT 1
        "#,
    )
    .bind(&record.campaign)
    .bind(&record.launch)
    .bind(&record.media)
    .bind(&record.recovery)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let result = sqlx::query(
        "INSERT INTO reddit_links (campaign, launch, media, recovery) VALUES (?, ?, ?, ?)",
    )
    .bind(&record.campaign)
    .bind(&record.launch)
    .bind(&record.media)
    .bind(&record.recovery)
    .execute(&mut *conn)
    .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

pub async fn find_or_create_flickr_links(
    conn: &mut SqliteConnection,
    record: &FlickrRecord,
) -> Result<Written> {
    let small = to_json(&record.small.clone().unwrap_or_default())?;
    let original = to_json(&record.original.clone().unwrap_or_default())?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM flickr_links WHERE small_json = ? AND original_json = ? ORDER BY id LIMIT 1",
    )
    .bind(&small)
    .bind(&original)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let result = sqlx::query("INSERT INTO flickr_links (small_json, original_json) VALUES (?, ?)")
        .bind(&small)
        .bind(&original)
        .execute(&mut *conn)
        .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

/// Always inserts a new links row; links are never deduplicated
pub async fn create_launch_links(
    conn: &mut SqliteConnection,
    record: &LinksRecord,
    patch_id: Option<i64>,
    reddit_id: Option<i64>,
    flickr_id: Option<i64>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO launch_links (patch_id, reddit_id, flickr_id, presskit, webcast, youtube_id, article, wikipedia)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(patch_id)
    .bind(reddit_id)
    .bind(flickr_id)
    .bind(&record.presskit)
    .bind(&record.webcast)
    .bind(&record.youtube_id)
    .bind(&record.article)
    .bind(&record.wikipedia)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

// ===== Launches =====

pub async fn find_launch_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM launches WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Insert a launch or replace every scalar column of the existing one,
/// pointing it at `links_id`. The previous links row is left behind.
pub async fn upsert_launch(
    conn: &mut SqliteConnection,
    external_id: &str,
    record: &LaunchRecord,
    links_id: i64,
) -> Result<Written> {
    let existing = find_launch_id(conn, external_id).await?;

    let sql = if existing.is_some() {
        r#"
        UPDATE launches SET
            fairings_json = ?, static_fire_date_utc = ?, static_fire_date_unix = ?,
            tbd = ?, net = ?, launch_window = ?, rocket = ?, success = ?,
            failures_json = ?, details = ?, ships_json = ?, capsules_json = ?,
            launchpad = ?, auto_update = ?, flight_number = ?, name = ?,
            date_utc = ?, date_unix = ?, date_local = ?, date_precision = ?,
            upcoming = ?, links_id = ?
        WHERE external_id = ?
        "#
    } else {
        r#"
        INSERT INTO launches (
            fairings_json, static_fire_date_utc, static_fire_date_unix,
            tbd, net, launch_window, rocket, success,
            failures_json, details, ships_json, capsules_json,
            launchpad, auto_update, flight_number, name,
            date_utc, date_unix, date_local, date_precision,
            upcoming, links_id, external_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    };

    let result = sqlx::query(sql)
        .bind(to_json_opt(record.fairings.as_ref())?)
        .bind(&record.static_fire_date_utc)
        .bind(record.static_fire_date_unix)
        .bind(record.tbd.unwrap_or(Some(false)))
        .bind(record.net.unwrap_or(Some(false)))
        .bind(record.window)
        .bind(&record.rocket)
        .bind(record.success)
        .bind(to_json(&record.failures.clone().unwrap_or_default())?)
        .bind(&record.details)
        .bind(to_json(&record.ships.clone().unwrap_or_default())?)
        .bind(to_json(&record.capsules.clone().unwrap_or_default())?)
        .bind(&record.launchpad)
        .bind(record.auto_update)
        .bind(record.flight_number)
        .bind(&record.name)
        .bind(&record.date_utc)
        .bind(record.date_unix)
        .bind(&record.date_local)
        .bind(&record.date_precision)
        .bind(record.upcoming)
        .bind(links_id)
        .bind(external_id)
        .execute(&mut *conn)
        .await?;

    Ok(match existing {
        Some(id) => Written::existing(id, Outcome::Updated),
        None => Written::created(result.last_insert_rowid()),
    })
}

/// Find or create a core keyed by (core, flight). The other fields only
/// matter when the row is created.
pub async fn find_or_create_core(
    conn: &mut SqliteConnection,
    record: &CoreRecord,
) -> Result<Written> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM launch_cores WHERE core IS ? AND flight IS ? ORDER BY id LIMIT 1",
    )
    .bind(&record.core)
    .bind(record.flight)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(Written::existing(id, Outcome::Unchanged));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO launch_cores (core, flight, gridfins, legs, reused, landing_attempt, landing_success, landing_type, landpad)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.core)
    .bind(record.flight)
    .bind(record.gridfins)
    .bind(record.legs)
    .bind(record.reused)
    .bind(record.landing_attempt)
    .bind(record.landing_success)
    .bind(&record.landing_type)
    .bind(&record.landpad)
    .execute(&mut *conn)
    .await?;

    Ok(Written::created(result.last_insert_rowid()))
}

// ===== Associations =====

/// Many-to-many tables hanging off a launch
#[derive(Debug, Clone, Copy)]
enum LaunchRelation {
    Crew,
    Payloads,
    Cores,
}

impl LaunchRelation {
    fn table(self) -> &'static str {
        match self {
            LaunchRelation::Crew => "launch_crew",
            LaunchRelation::Payloads => "launch_payloads",
            LaunchRelation::Cores => "launch_core_usages",
        }
    }

    fn column(self) -> &'static str {
        match self {
            LaunchRelation::Crew => "crew_id",
            LaunchRelation::Payloads => "payload_id",
            LaunchRelation::Cores => "core_id",
        }
    }
}

/// Make the association set exactly `ids`
async fn replace_relation(
    conn: &mut SqliteConnection,
    relation: LaunchRelation,
    launch_id: i64,
    ids: &[i64],
) -> Result<()> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE launch_id = ?",
        relation.table()
    ))
    .bind(launch_id)
    .execute(&mut *conn)
    .await?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} (launch_id, {}) VALUES (?, ?)",
        relation.table(),
        relation.column()
    );
    for id in ids {
        sqlx::query(&insert)
            .bind(launch_id)
            .bind(*id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

pub async fn replace_launch_crew(
    conn: &mut SqliteConnection,
    launch_id: i64,
    crew_ids: &[i64],
) -> Result<()> {
    replace_relation(conn, LaunchRelation::Crew, launch_id, crew_ids).await
}

pub async fn replace_launch_payloads(
    conn: &mut SqliteConnection,
    launch_id: i64,
    payload_ids: &[i64],
) -> Result<()> {
    replace_relation(conn, LaunchRelation::Payloads, launch_id, payload_ids).await
}

pub async fn replace_launch_cores(
    conn: &mut SqliteConnection,
    launch_id: i64,
    core_ids: &[i64],
) -> Result<()> {
    replace_relation(conn, LaunchRelation::Cores, launch_id, core_ids).await
}

/// Look external ids up in `table`. Duplicates collapse; ids with no local
/// row are reported back, not created.
async fn resolve_external_ids(
    conn: &mut SqliteConnection,
    table: &str,
    external_ids: &[String],
) -> Result<Resolved> {
    let mut seen = HashSet::new();
    let wanted: Vec<&String> = external_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .collect();

    if wanted.is_empty() {
        return Ok(Resolved::default());
    }

    let placeholders = wanted.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let query = format!(
        "SELECT id, external_id FROM {} WHERE external_id IN ({}) ORDER BY id",
        table, placeholders
    );

    let mut query_builder = sqlx::query_as::<_, (i64, String)>(&query);
    for id in &wanted {
        query_builder = query_builder.bind(id.as_str());
    }
    let rows: Vec<(i64, String)> = query_builder.fetch_all(&mut *conn).await?;

    let found: HashSet<&str> = rows.iter().map(|(_, ext)| ext.as_str()).collect();
    let missing = wanted
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .map(|id| id.to_string())
        .collect();

    Ok(Resolved {
        ids: rows.iter().map(|(id, _)| *id).collect(),
        missing,
    })
}

pub async fn resolve_crew_ids(
    conn: &mut SqliteConnection,
    external_ids: &[String],
) -> Result<Resolved> {
    resolve_external_ids(conn, "crew_members", external_ids).await
}

pub async fn resolve_payload_ids(
    conn: &mut SqliteConnection,
    external_ids: &[String],
) -> Result<Resolved> {
    resolve_external_ids(conn, "payloads", external_ids).await
}
