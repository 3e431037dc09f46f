//! Live resolved theme for one (tenant, surface) pair.
//!
//! A [`SurfaceSubscription`] owns a background task that fetches the
//! tenant's inputs, resolves them and publishes the result through a
//! `watch` channel. The task re-runs on every change signal. Fetches are
//! strictly sequential, and a signal that arrives mid-fetch leaves exactly
//! one re-fetch pending, so the published state always converges on the
//! latest write. Each published state replaces the previous one whole;
//! readers never see a mix of two resolutions.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use vitrine_shared::{Diagnostic, ResolveMemo, ResolvedTheme, Surface, TenantId};
use vitrine_store::TokenBackend;

use crate::config::EngineConfig;
use crate::error::SyncError;
use crate::notifier::ChangeSubscription;
use crate::store_client::{ResolveInputs, TokenStoreClient};

/// What a rendering surface reads.
#[derive(Debug, Clone)]
pub struct SurfaceState {
    /// Always usable: the defaults before the first fetch, then the last
    /// successful resolution.
    pub theme: Arc<ResolvedTheme>,
    pub is_loading: bool,
    /// The most recent fetch failed. `theme` still holds the last good value.
    pub error: Option<SyncError>,
    /// Version of the document `theme` was resolved from.
    pub version: Option<u64>,
    /// Values in the inputs that were ignored during resolution.
    pub diagnostics: Arc<[Diagnostic]>,
}

impl SurfaceState {
    fn initial(defaults: Arc<ResolvedTheme>) -> Self {
        Self {
            theme: defaults,
            is_loading: true,
            error: None,
            version: None,
            diagnostics: Arc::from(Vec::new()),
        }
    }
}

pub struct SurfaceSubscription {
    tenant: TenantId,
    surface: Surface,
    state: watch::Receiver<SurfaceState>,
    task: JoinHandle<()>,
}

impl SurfaceSubscription {
    /// Start watching `tenant` on `surface`.
    ///
    /// The change subscription is registered before the initial fetch so a
    /// write landing in between is never missed.
    pub fn spawn<B: TokenBackend>(
        client: Arc<TokenStoreClient<B>>,
        tenant: TenantId,
        surface: Surface,
        defaults: Arc<ResolvedTheme>,
        config: &EngineConfig,
    ) -> Self {
        let changes = client.notifier().subscribe(tenant);
        let (tx, rx) = watch::channel(SurfaceState::initial(Arc::clone(&defaults)));

        let worker = SurfaceWorker {
            client,
            tenant,
            surface,
            defaults,
            config: config.clone(),
            memo: ResolveMemo::new(),
            state: tx,
        };
        let task = tokio::spawn(worker.run(changes));

        debug!(tenant = %tenant.short(), %surface, "Surface subscription started");
        Self {
            tenant,
            surface,
            state: rx,
            task,
        }
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// The current state.
    pub fn snapshot(&self) -> SurfaceState {
        self.state.borrow().clone()
    }

    pub fn theme(&self) -> Arc<ResolvedTheme> {
        Arc::clone(&self.state.borrow().theme)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<SyncError> {
        self.state.borrow().error.clone()
    }

    /// Wait for the next published state. `None` once the worker is gone.
    pub async fn changed(&mut self) -> Option<SurfaceState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `pred`, checking the current state first.
    pub async fn wait_for(&mut self, mut pred: impl FnMut(&SurfaceState) -> bool) -> Option<SurfaceState> {
        loop {
            {
                let current = self.state.borrow_and_update();
                if pred(&current) {
                    return Some(current.clone());
                }
            }
            self.state.changed().await.ok()?;
        }
    }

    /// A receiver for UI layers that want to drive their own redraws.
    pub fn watch(&self) -> watch::Receiver<SurfaceState> {
        self.state.clone()
    }
}

impl Drop for SurfaceSubscription {
    fn drop(&mut self) {
        // Cancels any in-flight fetch; the change subscription is dropped
        // with the task and unregisters itself.
        self.task.abort();
        debug!(tenant = %self.tenant.short(), surface = %self.surface, "Surface subscription stopped");
    }
}

struct SurfaceWorker<B> {
    client: Arc<TokenStoreClient<B>>,
    tenant: TenantId,
    surface: Surface,
    defaults: Arc<ResolvedTheme>,
    config: EngineConfig,
    memo: ResolveMemo,
    state: watch::Sender<SurfaceState>,
}

impl<B: TokenBackend> SurfaceWorker<B> {
    async fn run(mut self, mut changes: ChangeSubscription) {
        self.refresh().await;
        while changes.recv().await.is_some() {
            self.refresh().await;
        }
    }

    async fn refresh(&mut self) {
        self.state.send_if_modified(|s| !std::mem::replace(&mut s.is_loading, true));

        match self.fetch_with_retry().await {
            Ok(inputs) => {
                let resolution = self.memo.resolve(
                    &self.defaults,
                    &inputs.legacy,
                    inputs.document.as_ref(),
                    self.surface,
                );
                for diag in resolution.diagnostics.iter() {
                    warn!(
                        tenant = %self.tenant.short(),
                        path = %diag.path,
                        problem = %diag.problem,
                        "Ignoring malformed configuration value"
                    );
                }

                let version = inputs.document.as_ref().map(|d| d.version);
                debug!(
                    tenant = %self.tenant.short(),
                    surface = %self.surface,
                    version,
                    reused = resolution.reused,
                    "Theme resolved"
                );
                self.state.send_replace(SurfaceState {
                    theme: resolution.theme,
                    is_loading: false,
                    error: None,
                    version,
                    diagnostics: resolution.diagnostics,
                });
            }
            Err(e) => {
                warn!(tenant = %self.tenant.short(), surface = %self.surface, "Theme fetch failed: {e}");
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e);
                });
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<ResolveInputs, SyncError> {
        let mut retry = 0;
        loop {
            match self.client.fetch_inputs(self.tenant).await {
                Ok(inputs) => return Ok(inputs),
                Err(e) if e.is_retryable() && retry < self.config.fetch_retries => {
                    let delay = self.config.backoff_for(retry);
                    debug!(
                        tenant = %self.tenant.short(),
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying theme fetch: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
