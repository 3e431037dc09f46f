//! Change notification.
//!
//! A writer announces "tenant T changed" after every successful write. The
//! signal carries no payload: subscribers re-fetch and re-resolve. Each
//! subscriber gets a capacity-1 channel, so a burst of announcements
//! arriving while a refresh is already pending collapses into that one
//! pending refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use vitrine_shared::TenantId;

/// Callback invoked by a transport when a tenant changes.
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Delivery mechanism for change announcements.
///
/// The in-process [`LocalTransport`] covers a single deployment; a
/// cross-process transport (database triggers, a pub/sub channel) plugs in
/// behind the same three calls. Handlers must not block.
pub trait ChangeTransport: Send + Sync + 'static {
    fn subscribe(&self, tenant: TenantId, handler: ChangeHandler) -> ListenerId;
    fn unsubscribe(&self, tenant: TenantId, id: ListenerId);
    fn announce(&self, tenant: TenantId);
}

/// In-process transport: a listener table keyed by tenant.
#[derive(Default)]
pub struct LocalTransport {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<TenantId, HashMap<ListenerId, ChangeHandler>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TenantId, HashMap<ListenerId, ChangeHandler>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn listener_count(&self, tenant: TenantId) -> usize {
        self.lock().get(&tenant).map_or(0, HashMap::len)
    }
}

impl ChangeTransport for LocalTransport {
    fn subscribe(&self, tenant: TenantId, handler: ChangeHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.lock();
        let room = listeners.entry(tenant).or_default();
        room.insert(id, handler);
        debug!(tenant = %tenant.short(), listeners = room.len(), "Change listener added");
        id
    }

    fn unsubscribe(&self, tenant: TenantId, id: ListenerId) {
        let mut listeners = self.lock();
        if let Some(room) = listeners.get_mut(&tenant) {
            room.remove(&id);
            debug!(tenant = %tenant.short(), listeners = room.len(), "Change listener removed");
            if room.is_empty() {
                listeners.remove(&tenant);
            }
        }
    }

    fn announce(&self, tenant: TenantId) {
        // Handlers run outside the lock so one may subscribe or unsubscribe.
        let handlers: Vec<ChangeHandler> = self
            .lock()
            .get(&tenant)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default();

        trace!(tenant = %tenant.short(), listeners = handlers.len(), "Announcing change");
        for handler in handlers {
            handler();
        }
    }
}

/// "Something changed, re-fetch."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// Entry point for subscribing to and announcing tenant changes.
#[derive(Clone)]
pub struct ChangeNotifier {
    transport: Arc<dyn ChangeTransport>,
}

impl ChangeNotifier {
    pub fn new(transport: Arc<dyn ChangeTransport>) -> Self {
        Self { transport }
    }

    /// Notifier over a fresh in-process transport.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalTransport::new()))
    }

    pub fn subscribe(&self, tenant: TenantId) -> ChangeSubscription {
        let (tx, rx) = mpsc::channel(1);
        let handler: ChangeHandler = Arc::new(move || match tx.try_send(ChangeSignal) {
            Ok(()) => {}
            // A refresh is already pending; it will observe this change too.
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => {}
        });
        let id = self.transport.subscribe(tenant, handler);

        ChangeSubscription {
            tenant,
            id,
            rx,
            transport: Arc::clone(&self.transport),
        }
    }

    /// Announce that `tenant` changed.
    pub fn publish(&self, tenant: TenantId) {
        self.transport.announce(tenant);
    }
}

/// A live registration. Dropping it unsubscribes.
pub struct ChangeSubscription {
    tenant: TenantId,
    id: ListenerId,
    rx: mpsc::Receiver<ChangeSignal>,
    transport: Arc<dyn ChangeTransport>,
}

impl ChangeSubscription {
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// Wait for the next change. Announcements made since the last call
    /// are folded into a single signal.
    pub async fn recv(&mut self) -> Option<ChangeSignal> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeSignal> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.transport.unsubscribe(self.tenant, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn announcements_reach_only_the_changed_tenant() {
        let notifier = ChangeNotifier::local();
        let a = TenantId::new();
        let b = TenantId::new();

        let mut sub_a = notifier.subscribe(a);
        let mut sub_b = notifier.subscribe(b);

        notifier.publish(a);

        assert_eq!(sub_a.recv().await, Some(ChangeSignal));
        assert_eq!(sub_b.try_recv(), None);
    }

    #[tokio::test]
    async fn bursts_collapse_into_one_pending_signal() {
        let notifier = ChangeNotifier::local();
        let tenant = TenantId::new();
        let mut sub = notifier.subscribe(tenant);

        for _ in 0..10 {
            notifier.publish(tenant);
        }

        assert_eq!(sub.try_recv(), Some(ChangeSignal));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn dropping_the_subscription_unsubscribes() {
        let transport = Arc::new(LocalTransport::new());
        let notifier = ChangeNotifier::new(transport.clone());
        let tenant = TenantId::new();

        let first = notifier.subscribe(tenant);
        let second = notifier.subscribe(tenant);
        assert_eq!(transport.listener_count(tenant), 2);

        drop(first);
        assert_eq!(transport.listener_count(tenant), 1);
        drop(second);
        assert_eq!(transport.listener_count(tenant), 0);

        // Nobody listening is not an error.
        notifier.publish(tenant);
    }
}
