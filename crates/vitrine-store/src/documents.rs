//! Token document rows.
//!
//! Every write inserts a new version and makes it the tenant's only active
//! document, inside one transaction. Readers still tolerate finding more
//! than one active row (rows written by older tooling): the highest version
//! wins.

use chrono::Utc;
use rusqlite::params;
use serde_json::Value;
use uuid::Uuid;

use vitrine_shared::{TenantId, TokenDocument};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::tenants::parse_timestamp;

const DOCUMENT_COLUMNS: &str = "id, tenant_id, version, is_active, body, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// The tenant's active document, or `None` when it has none.
    pub fn fetch_active_document(&self, tenant: TenantId) -> Result<Option<TokenDocument>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS}
             FROM token_documents
             WHERE tenant_id = ?1 AND is_active = 1
             ORDER BY version DESC"
        ))?;

        let mut active = stmt
            .query_map(params![tenant.to_string()], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if active.len() > 1 {
            tracing::warn!(
                tenant = %tenant,
                count = active.len(),
                "more than one active token document, using the newest"
            );
        }

        Ok(if active.is_empty() {
            None
        } else {
            Some(active.swap_remove(0))
        })
    }

    /// All versions of a tenant's document, newest first.
    pub fn list_documents(&self, tenant: TenantId) -> Result<Vec<TokenDocument>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS}
             FROM token_documents
             WHERE tenant_id = ?1
             ORDER BY version DESC"
        ))?;

        let rows = stmt.query_map(params![tenant.to_string()], row_to_document)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert `body` as the tenant's new active document.
    pub fn write_document(&mut self, tenant: TenantId, body: &Value) -> Result<TokenDocument> {
        self.ensure_tenant(tenant)?;

        let tenant_str = tenant.to_string();
        let body_json = serde_json::to_string(body)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        let tx = self.conn_mut().transaction()?;

        let current: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM token_documents WHERE tenant_id = ?1",
            params![tenant_str],
            |row| row.get(0),
        )?;
        let version = current + 1;

        tx.execute(
            "UPDATE token_documents SET is_active = 0 WHERE tenant_id = ?1 AND is_active = 1",
            params![tenant_str],
        )?;

        tx.execute(
            "INSERT INTO token_documents (id, tenant_id, version, is_active, body, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            params![id.to_string(), tenant_str, version, body_json, now.to_rfc3339()],
        )?;

        tx.commit()?;

        tracing::debug!(tenant = %tenant, version, "token document written");

        Ok(TokenDocument {
            id,
            tenant_id: tenant,
            version: version as u64,
            is_active: true,
            updated_at: now,
            body: body.clone(),
        })
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<TokenDocument> {
    let id_str: String = row.get(0)?;
    let tenant_str: String = row.get(1)?;
    let version: i64 = row.get(2)?;
    let is_active: bool = row.get(3)?;
    let body_raw: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let tenant_id = TenantId::parse(&tenant_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let updated_at = parse_timestamp(&updated_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    // An unreadable body is handed on as a bare string; the resolver then
    // treats every field as absent instead of losing the whole row.
    let body = serde_json::from_str(&body_raw).unwrap_or_else(|e| {
        tracing::warn!(document = %id, error = %e, "token document body is not valid JSON");
        Value::String(body_raw)
    });

    Ok(TokenDocument {
        id,
        tenant_id,
        version: version.max(0) as u64,
        is_active,
        updated_at,
        body,
    })
}
