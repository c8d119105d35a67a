//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Decrypted registry records, mirrored from the registries. The *_key columns
-- hold normalized names so lookups are plain indexed equality.
CREATE TABLE IF NOT EXISTS persons (
    registry        TEXT NOT NULL,   -- 'tarheta' | 'hdb' | 'pnk'
    person_id       TEXT NOT NULL,
    first_name      TEXT NOT NULL,
    middle_name     TEXT,
    last_name       TEXT NOT NULL,
    classification  TEXT,
    purok           TEXT,
    grupo           TEXT,
    father_name     TEXT,
    mother_name     TEXT,
    last_key        TEXT NOT NULL,
    middle_key      TEXT,
    father_key      TEXT,
    mother_key      TEXT,
    PRIMARY KEY (registry, person_id)
);

CREATE INDEX IF NOT EXISTS persons_last_idx   ON persons(registry, last_key);
CREATE INDEX IF NOT EXISTS persons_middle_idx ON persons(registry, middle_key);
CREATE INDEX IF NOT EXISTS persons_father_idx ON persons(registry, father_key);
CREATE INDEX IF NOT EXISTS persons_mother_idx ON persons(registry, mother_key);

CREATE TABLE IF NOT EXISTS households (
    household_id  TEXT PRIMARY KEY,
    code          TEXT NOT NULL UNIQUE,
    head_registry TEXT NOT NULL,
    head_id       TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS households_head_idx ON households(head_registry, head_id);

-- Rows are never deleted; removal sets active = 0.
CREATE TABLE IF NOT EXISTS household_members (
    household_id    TEXT NOT NULL REFERENCES households(household_id),
    person_registry TEXT NOT NULL,
    person_id       TEXT NOT NULL,
    position        INTEGER NOT NULL,
    relation        TEXT NOT NULL,
    relation_detail TEXT,
    active          INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (household_id, person_registry, person_id)
);

-- A person is an active member of at most one household.
CREATE UNIQUE INDEX IF NOT EXISTS household_members_active_idx
    ON household_members(person_registry, person_id) WHERE active = 1;

-- Aggregate counters; only ever incremented.
CREATE TABLE IF NOT EXISTS learned_patterns (
    match_type     TEXT PRIMARY KEY,
    total_shown    INTEGER NOT NULL DEFAULT 0,
    total_accepted INTEGER NOT NULL DEFAULT 0,
    total_modified INTEGER NOT NULL DEFAULT 0,
    updated_at     TEXT NOT NULL
);

-- Strictly append-only.
CREATE TABLE IF NOT EXISTS feedback_events (
    event_id      TEXT PRIMARY KEY,
    household_id  TEXT NOT NULL,
    recorded_at   TEXT NOT NULL,
    shown_json    TEXT NOT NULL,
    accepted_json TEXT NOT NULL,
    modified_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS feedback_household_idx ON feedback_events(household_id);

PRAGMA user_version = 1;
";
