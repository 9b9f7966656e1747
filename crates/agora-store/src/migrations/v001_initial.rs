//! v001 -- Initial schema creation.
//!
//! Creates the single `media_records` key-value table.  The record itself is
//! stored as JSON; `byte_size` and `created_at` are mirrored into columns so
//! that quota accounting and eviction ordering never have to parse JSON.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS media_records (
    id         TEXT PRIMARY KEY NOT NULL,   -- media_<millis>_<base36>
    json       TEXT NOT NULL,               -- serialized MediaRecord
    byte_size  INTEGER NOT NULL,            -- decoded payload size
    created_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_media_created_at ON media_records(created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
