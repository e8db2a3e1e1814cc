//! SQL schema for the Sanctum SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;

-- At most one row per (owner, kind, day). The primary key is what makes
-- `INSERT ... ON CONFLICT DO NOTHING` a conditional create.
CREATE TABLE IF NOT EXISTS daily_records (
    owner_id     TEXT NOT NULL,
    kind         TEXT NOT NULL,   -- 'dashboard' | 'lunar_os'
    day_key      TEXT NOT NULL,   -- YYYY-MM-DD in the owner's calendar
    payload_json TEXT NOT NULL,   -- tagged DailyPayload
    created_at   TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (owner_id, kind, day_key)
);

-- `seq` is the store order of a collection.
CREATE TABLE IF NOT EXISTS list_records (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id   TEXT NOT NULL UNIQUE,
    owner_id    TEXT NOT NULL,
    collection  TEXT NOT NULL,
    fields_json TEXT NOT NULL,    -- JSON object of scalars
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS list_records_scope_idx
    ON list_records(owner_id, collection, seq);

PRAGMA user_version = 1;
";
