#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use vitrine_client::{ChangeNotifier, Edit, Engine, EngineConfig, LocalTransport, OverviewField, Step};
use vitrine_client::DraftController;
use vitrine_shared::{AccessCode, LegacyFields, TenantId, TokenDocument};
use vitrine_store::{BackendError, BackendResult, MemoryBackend, TokenBackend};

/// [`MemoryBackend`] with injectable failures and latency.
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: MemoryBackend,
    failing_fetches: AtomicU32,
    failing_writes: AtomicU32,
    fetch_delay_ms: AtomicU64,
    write_delay_ms: AtomicU64,
    fetches: AtomicU32,
    writes: AtomicU32,
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn pause(delay_ms: &AtomicU64) {
    let ms = delay_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

impl FlakyBackend {
    pub fn fail_next_fetches(&self, n: u32) {
        self.failing_fetches.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Calls to `fetch_active_document` so far.
    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Calls to `write_document` so far, failed ones included.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl TokenBackend for FlakyBackend {
    async fn fetch_active_document(&self, tenant: TenantId) -> BackendResult<Option<TokenDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        pause(&self.fetch_delay_ms).await;
        if take(&self.failing_fetches) {
            return Err(BackendError::Unavailable("connection reset".into()));
        }
        self.inner.fetch_active_document(tenant).await
    }

    async fn write_document(&self, tenant: TenantId, body: Value) -> BackendResult<TokenDocument> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        pause(&self.write_delay_ms).await;
        if take(&self.failing_writes) {
            return Err(BackendError::Unavailable("connection reset".into()));
        }
        self.inner.write_document(tenant, body).await
    }

    async fn fetch_legacy_fields(&self, tenant: TenantId) -> BackendResult<LegacyFields> {
        self.inner.fetch_legacy_fields(tenant).await
    }

    async fn mark_published(&self, tenant: TenantId) -> BackendResult<()> {
        self.inner.mark_published(tenant).await
    }

    async fn generate_access_code(&self, tenant: TenantId) -> BackendResult<AccessCode> {
        self.inner.generate_access_code(tenant).await
    }
}

pub struct Harness {
    pub engine: Engine<FlakyBackend>,
    pub transport: Arc<LocalTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        vitrine_client::init_tracing();
        let transport = Arc::new(LocalTransport::new());
        let engine = Engine::new(
            FlakyBackend::default(),
            ChangeNotifier::new(transport.clone()),
            config,
        );
        Self { engine, transport }
    }

    pub fn backend(&self) -> &FlakyBackend {
        self.engine.client().backend()
    }
}

/// Fill the required fields and move the builder to the publish step.
pub fn walk_to_publish(builder: &DraftController<FlakyBackend>) {
    builder
        .edit(Edit::Overview(OverviewField::Name, Some("Harbor Days".into())))
        .unwrap();
    while builder.step() != Step::Publish {
        builder.next_step().unwrap();
    }
}
