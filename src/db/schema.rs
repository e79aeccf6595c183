//! SQLite schema definition

/// SQL schema for the mirror database
pub const SCHEMA_SQL: &str = r#"
-- Crew members, keyed by upstream id
CREATE TABLE IF NOT EXISTS crew_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    name TEXT,
    agency TEXT,
    image_url TEXT,
    wikipedia_url TEXT,
    launches_json TEXT NOT NULL DEFAULT '[]',
    status TEXT
);

-- Dragon capsule recovery records, identified by (capsule, manifest)
CREATE TABLE IF NOT EXISTS dragons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    capsule TEXT,
    mass_returned_kg REAL,
    mass_returned_lbs REAL,
    flight_time_sec INTEGER,
    manifest TEXT,
    water_landing INTEGER,
    land_landing INTEGER
);

-- Payloads, keyed by upstream id
CREATE TABLE IF NOT EXISTS payloads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    name TEXT,
    payload_type TEXT,
    reused INTEGER,
    launch TEXT,
    customers_json TEXT,
    nationalities_json TEXT,
    manufacturers_json TEXT,
    norad_ids_json TEXT,
    mass_kg REAL,
    mass_lbs REAL,
    orbit TEXT,
    reference_system TEXT,
    regime TEXT,
    longitude REAL,
    semi_major_axis_km REAL,
    eccentricity REAL,
    periapsis_km REAL,
    apoapsis_km REAL,
    inclination_deg REAL,
    period_min REAL,
    lifespan_years INTEGER,
    epoch TEXT,
    mean_motion REAL,
    raan REAL,
    arg_of_pericenter REAL,
    mean_anomaly REAL,
    dragon_id INTEGER REFERENCES dragons(id) ON DELETE SET NULL
);

-- Link value records, find-or-create on the full field set
CREATE TABLE IF NOT EXISTS patch_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    small TEXT,
    large TEXT
);

CREATE TABLE IF NOT EXISTS reddit_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign TEXT,
    launch TEXT,
    media TEXT,
    recovery TEXT
);

CREATE TABLE IF NOT EXISTS flickr_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    small_json TEXT NOT NULL DEFAULT '[]',
    original_json TEXT NOT NULL DEFAULT '[]'
);

-- One row per launch ingest
CREATE TABLE IF NOT EXISTS launch_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patch_id INTEGER REFERENCES patch_links(id) ON DELETE SET NULL,
    reddit_id INTEGER REFERENCES reddit_links(id) ON DELETE SET NULL,
    flickr_id INTEGER REFERENCES flickr_links(id) ON DELETE SET NULL,
    presskit TEXT,
    webcast TEXT,
    youtube_id TEXT,
    article TEXT,
    wikipedia TEXT
);

-- Booster core usages, identified by (core, flight)
CREATE TABLE IF NOT EXISTS launch_cores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    core TEXT,
    flight INTEGER,
    gridfins INTEGER,
    legs INTEGER,
    reused INTEGER,
    landing_attempt INTEGER,
    landing_success INTEGER,
    landing_type TEXT,
    landpad TEXT
);

-- Launches, keyed by upstream id
CREATE TABLE IF NOT EXISTS launches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    fairings_json TEXT,
    static_fire_date_utc TEXT,
    static_fire_date_unix INTEGER,
    tbd INTEGER,
    net INTEGER,
    launch_window INTEGER,
    rocket TEXT,
    success INTEGER,
    failures_json TEXT NOT NULL DEFAULT '[]',
    details TEXT,
    ships_json TEXT NOT NULL DEFAULT '[]',
    capsules_json TEXT NOT NULL DEFAULT '[]',
    launchpad TEXT,
    auto_update INTEGER,
    flight_number INTEGER,
    name TEXT,
    date_utc TEXT,
    date_unix INTEGER,
    date_local TEXT,
    date_precision TEXT,
    upcoming INTEGER,
    links_id INTEGER UNIQUE REFERENCES launch_links(id) ON DELETE SET NULL
);

-- Many-to-many associations owned by the store
CREATE TABLE IF NOT EXISTS launch_crew (
    launch_id INTEGER NOT NULL REFERENCES launches(id) ON DELETE CASCADE,
    crew_id INTEGER NOT NULL REFERENCES crew_members(id) ON DELETE CASCADE,
    PRIMARY KEY (launch_id, crew_id)
);

CREATE TABLE IF NOT EXISTS launch_payloads (
    launch_id INTEGER NOT NULL REFERENCES launches(id) ON DELETE CASCADE,
    payload_id INTEGER NOT NULL REFERENCES payloads(id) ON DELETE CASCADE,
    PRIMARY KEY (launch_id, payload_id)
);

CREATE TABLE IF NOT EXISTS launch_core_usages (
    launch_id INTEGER NOT NULL REFERENCES launches(id) ON DELETE CASCADE,
    core_id INTEGER NOT NULL REFERENCES launch_cores(id) ON DELETE CASCADE,
    PRIMARY KEY (launch_id, core_id)
);

-- Ingestion runs: tracking history
CREATE TABLE IF NOT EXISTS ingestion_runs (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    status TEXT NOT NULL,
    records_seen INTEGER DEFAULT 0,
    records_created INTEGER DEFAULT 0,
    records_updated INTEGER DEFAULT 0,
    records_unchanged INTEGER DEFAULT 0,
    records_skipped INTEGER DEFAULT 0,
    unresolved_references INTEGER DEFAULT 0,
    errors_json TEXT
);

-- Indexes for the read layer and identity lookups
CREATE INDEX IF NOT EXISTS idx_crew_name ON crew_members(name);
CREATE INDEX IF NOT EXISTS idx_payloads_name ON payloads(name);
CREATE INDEX IF NOT EXISTS idx_launches_date ON launches(date_utc);
CREATE INDEX IF NOT EXISTS idx_dragons_identity ON dragons(capsule, manifest);
CREATE INDEX IF NOT EXISTS idx_cores_identity ON launch_cores(core, flight);
CREATE INDEX IF NOT EXISTS idx_runs_collection ON ingestion_runs(collection);
"#;
