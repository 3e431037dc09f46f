//! # vitrine-client
//!
//! The theme engine used by the storefront, the mobile app and the builder
//! preview: live resolved-theme subscriptions per tenant and surface,
//! change notification, and builder draft sessions with debounced
//! autosave and publishing.

pub mod config;
pub mod draft;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod store_client;
pub mod subscription;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::EngineConfig;
pub use draft::{
    ColorRole, Draft, DraftController, DraftPhase, DraftState, Edit, Feature, FontRole,
    OverviewField, Step,
};
pub use engine::Engine;
pub use error::{DraftError, SyncError};
pub use notifier::{
    ChangeHandler, ChangeNotifier, ChangeSignal, ChangeSubscription, ChangeTransport, ListenerId,
    LocalTransport,
};
pub use store_client::{Publication, ResolveInputs, TokenStoreClient};
pub use subscription::{SurfaceState, SurfaceSubscription};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vitrine_client=debug,vitrine_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
