//! In-process [`TokenBackend`].
//!
//! Holds every tenant's documents in memory behind one lock. Used for the
//! builder's offline preview mode and throughout the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use vitrine_shared::{AccessCode, LegacyFields, TenantId, TokenDocument};

use crate::backend::{BackendResult, TokenBackend};

#[derive(Default)]
struct TenantData {
    documents: Vec<TokenDocument>,
    legacy: LegacyFields,
    published: bool,
    access_code: Option<AccessCode>,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    tenants: Arc<Mutex<HashMap<TenantId, TenantData>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TenantId, TenantData>> {
        self.tenants.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_legacy_fields(&self, tenant: TenantId, legacy: LegacyFields) {
        self.lock().entry(tenant).or_default().legacy = legacy;
    }

    /// Insert a document as-is, bypassing the one-active rule.
    pub fn insert_raw(&self, document: TokenDocument) {
        self.lock()
            .entry(document.tenant_id)
            .or_default()
            .documents
            .push(document);
    }

    pub fn document_count(&self, tenant: TenantId) -> usize {
        self.lock().get(&tenant).map(|t| t.documents.len()).unwrap_or(0)
    }

    pub fn is_published(&self, tenant: TenantId) -> bool {
        self.lock().get(&tenant).map(|t| t.published).unwrap_or(false)
    }

    pub fn active_document(&self, tenant: TenantId) -> Option<TokenDocument> {
        let tenants = self.lock();
        let data = tenants.get(&tenant)?;
        data.documents
            .iter()
            .filter(|d| d.is_active)
            .max_by_key(|d| d.version)
            .cloned()
    }
}

impl TokenBackend for MemoryBackend {
    async fn fetch_active_document(&self, tenant: TenantId) -> BackendResult<Option<TokenDocument>> {
        Ok(self.active_document(tenant))
    }

    async fn write_document(&self, tenant: TenantId, body: Value) -> BackendResult<TokenDocument> {
        let mut tenants = self.lock();
        let data = tenants.entry(tenant).or_default();

        let version = data.documents.iter().map(|d| d.version).max().unwrap_or(0) + 1;
        for doc in &mut data.documents {
            doc.is_active = false;
        }

        let document = TokenDocument {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            version,
            is_active: true,
            updated_at: Utc::now(),
            body,
        };
        data.documents.push(document.clone());
        Ok(document)
    }

    async fn fetch_legacy_fields(&self, tenant: TenantId) -> BackendResult<LegacyFields> {
        Ok(self
            .lock()
            .get(&tenant)
            .map(|t| t.legacy.clone())
            .unwrap_or_default())
    }

    async fn mark_published(&self, tenant: TenantId) -> BackendResult<()> {
        self.lock().entry(tenant).or_default().published = true;
        Ok(())
    }

    async fn generate_access_code(&self, tenant: TenantId) -> BackendResult<AccessCode> {
        let mut tenants = self.lock();
        let data = tenants.entry(tenant).or_default();
        Ok(data
            .access_code
            .get_or_insert_with(AccessCode::generate)
            .clone())
    }
}
