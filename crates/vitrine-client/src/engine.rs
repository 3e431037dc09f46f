//! Engine facade: one store client and notifier shared by every surface
//! subscription and builder session of a process.

use std::sync::Arc;

use tracing::info;

use vitrine_shared::{default_theme, resolve, ResolvedTheme, Surface, TenantId};
use vitrine_store::{SqliteBackend, StoreError, TokenBackend};

use crate::config::EngineConfig;
use crate::draft::DraftController;
use crate::error::SyncError;
use crate::notifier::ChangeNotifier;
use crate::store_client::TokenStoreClient;
use crate::subscription::SurfaceSubscription;

pub struct Engine<B> {
    client: Arc<TokenStoreClient<B>>,
    defaults: Arc<ResolvedTheme>,
    config: EngineConfig,
}

impl<B> Clone for Engine<B> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            defaults: Arc::clone(&self.defaults),
            config: self.config.clone(),
        }
    }
}

impl<B: TokenBackend> Engine<B> {
    pub fn new(backend: B, notifier: ChangeNotifier, config: EngineConfig) -> Self {
        Self {
            client: Arc::new(TokenStoreClient::new(backend, notifier)),
            defaults: Arc::new(default_theme().clone()),
            config,
        }
    }

    /// Replace the compiled-in default theme.
    pub fn with_defaults(mut self, defaults: ResolvedTheme) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    pub fn client(&self) -> &Arc<TokenStoreClient<B>> {
        &self.client
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn defaults(&self) -> &ResolvedTheme {
        &self.defaults
    }

    /// Live theme for `tenant` on `surface`. Must be called inside a Tokio
    /// runtime; dropping the subscription stops it.
    pub fn use_resolved_theme(&self, tenant: TenantId, surface: Surface) -> SurfaceSubscription {
        SurfaceSubscription::spawn(
            Arc::clone(&self.client),
            tenant,
            surface,
            Arc::clone(&self.defaults),
            &self.config,
        )
    }

    /// One-off resolution, for renders that do not need live updates.
    pub async fn resolve_once(&self, tenant: TenantId, surface: Surface) -> Result<ResolvedTheme, SyncError> {
        let inputs = self.client.fetch_inputs(tenant).await?;
        Ok(resolve(
            &self.defaults,
            &inputs.legacy,
            inputs.document.as_ref(),
            surface,
        ))
    }

    /// Open a builder session on a fork of the tenant's active document.
    pub async fn open_builder(&self, tenant: TenantId) -> Result<DraftController<B>, SyncError> {
        DraftController::open(Arc::clone(&self.client), tenant, &self.config).await
    }
}

impl Engine<SqliteBackend> {
    /// Engine over the SQLite store at `config.database_path`, or the
    /// platform data directory when unset.
    pub fn open_sqlite(config: EngineConfig) -> Result<Self, StoreError> {
        let backend = match &config.database_path {
            Some(path) => SqliteBackend::open_at(path)?,
            None => SqliteBackend::open_default()?,
        };
        info!(path = ?config.database_path, "Token store opened");
        Ok(Self::new(backend, ChangeNotifier::local(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_shared::{DocumentBody, LegacyFields};
    use vitrine_store::MemoryBackend;

    #[tokio::test]
    async fn resolve_once_layers_document_over_legacy() {
        let engine = Engine::new(MemoryBackend::new(), ChangeNotifier::local(), EngineConfig::default());
        let tenant = TenantId::new();
        engine.client().backend().set_legacy_fields(
            tenant,
            LegacyFields {
                primary_color: Some("#111111".into()),
                text_color: Some("#222222".into()),
                ..Default::default()
            },
        );

        let mut body = DocumentBody::default();
        body.tokens.colors.primary = Some("#ff0000".into());
        engine.client().write(tenant, &body).await.unwrap();

        let theme = engine.resolve_once(tenant, Surface::Storefront).await.unwrap();
        assert_eq!(theme.primary_color, "#ff0000");
        assert_eq!(theme.text_color, "#222222");
    }

    #[tokio::test]
    async fn sqlite_engine_opens_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            database_path: Some(dir.path().join("vitrine.db")),
            ..Default::default()
        };
        let engine = Engine::open_sqlite(config).unwrap();

        let tenant = TenantId::new();
        let builder = engine.open_builder(tenant).await.unwrap();
        assert_eq!(builder.draft().base_version, None);

        let theme = engine.resolve_once(tenant, Surface::Mobile).await.unwrap();
        assert_eq!(theme, *default_theme());
    }
}
