//! v001 -- Initial schema creation.
//!
//! Creates `tenants`, `token_documents` and `legacy_fields`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Tenants (conferences / shops)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tenants (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    is_published INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    published_at TEXT,                        -- RFC-3339
    access_code  TEXT UNIQUE,                 -- 8 symbols, no dash
    created_at   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Token documents (one active per tenant, enforced on write)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS token_documents (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    tenant_id  TEXT NOT NULL,                 -- FK -> tenants(id)
    version    INTEGER NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    body       TEXT NOT NULL,                 -- JSON
    updated_at TEXT NOT NULL,

    UNIQUE (tenant_id, version),
    FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_token_documents_active
    ON token_documents(tenant_id, is_active, version DESC);

-- ----------------------------------------------------------------
-- Legacy flat settings row
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS legacy_fields (
    tenant_id            TEXT PRIMARY KEY NOT NULL,
    primary_color        TEXT,
    secondary_color      TEXT,
    accent_color         TEXT,
    background_color     TEXT,
    text_color           TEXT,
    font_family          TEXT,
    heading_font         TEXT,
    background_image_url TEXT,
    background_pattern   TEXT,
    hero_image_url       TEXT,
    hero_video_url       TEXT,
    logo_url             TEXT,
    navigation_style     TEXT,
    enable_chat          INTEGER,             -- nullable boolean
    enable_map           INTEGER,
    enable_qr_checkin    INTEGER,

    FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
