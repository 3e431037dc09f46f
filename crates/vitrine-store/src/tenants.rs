//! Tenant rows: publish state and the public access code.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use vitrine_shared::{AccessCode, TenantId};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Attempts at drawing an access code that no other tenant holds.
const ACCESS_CODE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: TenantId,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub access_code: Option<AccessCode>,
    pub created_at: DateTime<Utc>,
}

impl Database {
    /// Insert the tenant row if it does not exist yet.
    pub fn ensure_tenant(&self, tenant: TenantId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO tenants (id, created_at) VALUES (?1, ?2)",
            params![tenant.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_tenant(&self, tenant: TenantId) -> Result<TenantRecord> {
        self.conn()
            .query_row(
                "SELECT id, is_published, published_at, access_code, created_at
                 FROM tenants WHERE id = ?1",
                params![tenant.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
            .and_then(|(id, is_published, published_at, code, created_at)| {
                Ok(TenantRecord {
                    id: TenantId::parse(&id)?,
                    is_published,
                    published_at: published_at.as_deref().map(parse_timestamp).transpose()?,
                    access_code: code
                        .as_deref()
                        .map(AccessCode::parse)
                        .transpose()
                        .map_err(|e| StoreError::Invalid(e.to_string()))?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
    }

    /// Flag the tenant as published. Re-publishing refreshes `published_at`.
    pub fn mark_published(&self, tenant: TenantId) -> Result<()> {
        self.ensure_tenant(tenant)?;
        self.conn().execute(
            "UPDATE tenants SET is_published = 1, published_at = ?2 WHERE id = ?1",
            params![tenant.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Return the tenant's access code, drawing a new one on first use.
    /// The code stays stable across republishes.
    pub fn access_code_for(&self, tenant: TenantId) -> Result<AccessCode> {
        self.ensure_tenant(tenant)?;

        let existing: Option<String> = self
            .conn()
            .query_row(
                "SELECT access_code FROM tenants WHERE id = ?1",
                params![tenant.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        if let Some(code) = existing {
            return AccessCode::parse(&code).map_err(|e| StoreError::Invalid(e.to_string()));
        }

        for _ in 0..ACCESS_CODE_ATTEMPTS {
            let code = AccessCode::generate();
            let result = self.conn().execute(
                "UPDATE tenants SET access_code = ?2 WHERE id = ?1 AND access_code IS NULL",
                params![tenant.to_string(), code.as_str()],
            );
            match result {
                Ok(_) => {
                    tracing::info!(tenant = %tenant, "issued access code");
                    return self.access_code_for(tenant);
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    tracing::debug!(tenant = %tenant, "access code collision, drawing again");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(StoreError::Invalid(
            "could not draw a unique access code".to_string(),
        ))
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
