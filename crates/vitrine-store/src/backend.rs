//! The persistence contract consumed by the sync engine.
//!
//! A backend owns storage and enforces that each tenant has at most one
//! active document. It knows nothing about merge semantics.
//!
//! "No active document" is reported as `Ok(None)`, never as an error, so
//! callers can tell an unconfigured tenant apart from a failing backend.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;

use vitrine_shared::{AccessCode, LegacyFields, TenantId, TokenDocument};

use crate::database::Database;
use crate::error::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or was busy. Worth retrying.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the operation (constraint, permissions).
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    /// Stored data could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Rejected(err.to_string())
            }
            StoreError::Sqlite(
                rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::IntegralValueOutOfRange(..),
            )
            | StoreError::Uuid(_)
            | StoreError::ChronoParse(_)
            | StoreError::Json(_)
            | StoreError::Invalid(_) => Self::Corrupt(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

pub trait TokenBackend: Send + Sync + 'static {
    fn fetch_active_document(
        &self,
        tenant: TenantId,
    ) -> impl Future<Output = BackendResult<Option<TokenDocument>>> + Send;

    /// Store `body` as a new version and make it the tenant's only active
    /// document.
    fn write_document(
        &self,
        tenant: TenantId,
        body: Value,
    ) -> impl Future<Output = BackendResult<TokenDocument>> + Send;

    fn fetch_legacy_fields(
        &self,
        tenant: TenantId,
    ) -> impl Future<Output = BackendResult<LegacyFields>> + Send;

    fn mark_published(&self, tenant: TenantId) -> impl Future<Output = BackendResult<()>> + Send;

    /// The tenant's public access code, issued on first call.
    fn generate_access_code(
        &self,
        tenant: TenantId,
    ) -> impl Future<Output = BackendResult<AccessCode>> + Send;
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

/// [`TokenBackend`] over the SQLite [`Database`]. Every call runs on the
/// blocking thread pool.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Arc<Mutex<Database>>,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        Database::open_at(path).map(Self::new)
    }

    /// Open the default platform database.
    pub fn open_default() -> Result<Self, StoreError> {
        Database::new().map(Self::new)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Database::open_in_memory().map(Self::new)
    }

    /// Direct access for seeding and tooling.
    pub fn with_database<T>(&self, f: impl FnOnce(&mut Database) -> T) -> T {
        let mut guard = self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    async fn blocking<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut guard)
        })
        .await
        .map_err(|e| BackendError::Unavailable(format!("storage task failed: {e}")))?
        .map_err(BackendError::from)
    }
}

impl TokenBackend for SqliteBackend {
    async fn fetch_active_document(&self, tenant: TenantId) -> BackendResult<Option<TokenDocument>> {
        self.blocking(move |db| db.fetch_active_document(tenant)).await
    }

    async fn write_document(&self, tenant: TenantId, body: Value) -> BackendResult<TokenDocument> {
        self.blocking(move |db| db.write_document(tenant, &body)).await
    }

    async fn fetch_legacy_fields(&self, tenant: TenantId) -> BackendResult<LegacyFields> {
        self.blocking(move |db| db.get_legacy_fields(tenant)).await
    }

    async fn mark_published(&self, tenant: TenantId) -> BackendResult<()> {
        self.blocking(move |db| db.mark_published(tenant)).await
    }

    async fn generate_access_code(&self, tenant: TenantId) -> BackendResult<AccessCode> {
        self.blocking(move |db| db.access_code_for(tenant)).await
    }
}
