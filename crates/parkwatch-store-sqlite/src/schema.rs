//! SQL schema for the parkwatch SQLite store.
//!
//! Executed at connection startup. `PRAGMA user_version` records the layout
//! revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// `journal_mode` is set separately because that pragma returns a row.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

-- Facility dimension. Written once by the catalog bootstrap.
CREATE TABLE IF NOT EXISTS facilities (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    address      TEXT NOT NULL,
    latitude     REAL NOT NULL,
    longitude    REAL NOT NULL,
    altitude     REAL NOT NULL,
    total_spaces INTEGER NOT NULL
);

-- Observations are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS observations (
    observation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    facility_id    TEXT NOT NULL REFERENCES facilities(id),
    timestamp      TEXT NOT NULL,   -- 'YYYY-MM-DD HH:MM:SS', minute resolution
    free_spaces    INTEGER NOT NULL,
    UNIQUE (facility_id, timestamp)
);

CREATE INDEX IF NOT EXISTS observations_timestamp_idx ON observations(timestamp);

PRAGMA user_version = 1;
";
