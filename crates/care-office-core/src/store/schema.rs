//! SQLite schema definition.

/// Complete database schema for the local store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Records
-- ============================================================================

-- Every table is stored as JSON documents keyed by (tbl, id). `seq` keeps
-- insertion order for unordered queries.
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    tbl TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,                          -- JSON object, includes id
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (tbl, id)
);

CREATE INDEX IF NOT EXISTS idx_records_tbl ON records(tbl);

-- ============================================================================
-- File Storage
-- ============================================================================

CREATE TABLE IF NOT EXISTS files (
    bucket TEXT NOT NULL,
    path TEXT NOT NULL,
    content_type TEXT,
    bytes BLOB NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (bucket, path)
);
"#;
