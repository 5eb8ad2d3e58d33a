//! SQL schema for the rapport SQLite store.
//!
//! Executed at connection startup. Re-running ingestion against an existing
//! file is supported, so the layout below is the durable contract.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS platforms (
    platform_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS people (
    person_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    is_self    INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- One row per (platform, id_string) is kept by the registrar, not by a
-- constraint here. person_id is the only column ever updated.
CREATE TABLE IF NOT EXISTS identities (
    identity_id  TEXT PRIMARY KEY,
    platform_id  TEXT NOT NULL REFERENCES platforms(platform_id),
    id_string    TEXT NOT NULL,
    display_name TEXT,
    person_id    TEXT REFERENCES people(person_id)
);

-- Messages are append-only.
CREATE TABLE IF NOT EXISTS messages (
    message_id   TEXT PRIMARY KEY,
    sender_id    TEXT NOT NULL REFERENCES identities(identity_id),
    recipient_id TEXT NOT NULL REFERENCES identities(identity_id),
    message_text TEXT,
    timestamp    TEXT NOT NULL,   -- RFC 3339 UTC
    fingerprint  TEXT NOT NULL    -- sha256 hex of sender/recipient/timestamp/text
);

CREATE INDEX IF NOT EXISTS identities_key_idx       ON identities(platform_id, id_string);
CREATE INDEX IF NOT EXISTS identities_id_string_idx ON identities(id_string);
CREATE INDEX IF NOT EXISTS identities_person_idx    ON identities(person_id);
CREATE INDEX IF NOT EXISTS people_name_idx          ON people(name);
CREATE INDEX IF NOT EXISTS messages_fingerprint_idx ON messages(fingerprint);
CREATE INDEX IF NOT EXISTS messages_timestamp_idx   ON messages(timestamp);

PRAGMA user_version = 1;
";
