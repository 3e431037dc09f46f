//! Typed access to the token store.
//!
//! Wraps a [`TokenBackend`], maps its failures onto [`SyncError`] and
//! announces every successful write through the [`ChangeNotifier`], so
//! nothing that writes can forget to notify.

use tracing::{debug, info, warn};

use vitrine_shared::{AccessCode, DocumentBody, LegacyFields, TenantId, TokenDocument};
use vitrine_store::TokenBackend;

use crate::error::SyncError;
use crate::notifier::ChangeNotifier;

/// Everything resolution needs from the store for one tenant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveInputs {
    pub document: Option<TokenDocument>,
    pub legacy: LegacyFields,
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub document: TokenDocument,
    pub access_code: AccessCode,
}

pub struct TokenStoreClient<B> {
    backend: B,
    notifier: ChangeNotifier,
}

impl<B: TokenBackend> TokenStoreClient<B> {
    pub fn new(backend: B, notifier: ChangeNotifier) -> Self {
        Self { backend, notifier }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// The tenant's active document. `Ok(None)` is the normal "nothing
    /// published yet" case.
    pub async fn fetch_active(&self, tenant: TenantId) -> Result<Option<TokenDocument>, SyncError> {
        let document = self.backend.fetch_active_document(tenant).await?;
        debug!(
            tenant = %tenant.short(),
            version = document.as_ref().map(|d| d.version),
            "Fetched active document"
        );
        Ok(document)
    }

    pub async fn fetch_legacy(&self, tenant: TenantId) -> Result<LegacyFields, SyncError> {
        Ok(self.backend.fetch_legacy_fields(tenant).await?)
    }

    /// Fetch the active document and legacy settings concurrently.
    pub async fn fetch_inputs(&self, tenant: TenantId) -> Result<ResolveInputs, SyncError> {
        let (document, legacy) =
            futures::try_join!(self.fetch_active(tenant), self.fetch_legacy(tenant))?;
        Ok(ResolveInputs { document, legacy })
    }

    /// Write `body` as the tenant's new active document and announce it.
    pub async fn write(&self, tenant: TenantId, body: &DocumentBody) -> Result<TokenDocument, SyncError> {
        let document = match self.backend.write_document(tenant, body.to_value()).await {
            Ok(document) => document,
            Err(e) => {
                warn!(tenant = %tenant.short(), "Document write failed: {e}");
                return Err(e.into());
            }
        };

        debug!(tenant = %tenant.short(), version = document.version, "Document written");
        self.notifier.publish(tenant);
        Ok(document)
    }

    /// Write `body`, mark the tenant published and return its access code.
    ///
    /// The write is announced as soon as it lands. If a later step fails
    /// the document stays active and publishing can simply be retried.
    pub async fn publish(&self, tenant: TenantId, body: &DocumentBody) -> Result<Publication, SyncError> {
        let document = self.write(tenant, body).await?;
        self.backend.mark_published(tenant).await?;
        let access_code = self.backend.generate_access_code(tenant).await?;

        info!(
            tenant = %tenant.short(),
            version = document.version,
            access_code = %access_code,
            "Tenant published"
        );
        self.notifier.publish(tenant);

        Ok(Publication {
            document,
            access_code,
        })
    }
}
