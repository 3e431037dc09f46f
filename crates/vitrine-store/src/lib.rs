//! # vitrine-store
//!
//! Persistence for Vitrine tenants: token documents, legacy settings rows,
//! publish state and access codes.
//!
//! The crate exposes a synchronous SQLite [`Database`] with typed helpers,
//! and the async [`TokenBackend`] contract that the rest of the system
//! consumes. Two backends implement it: [`SqliteBackend`] (the database,
//! driven from a blocking thread pool) and [`MemoryBackend`] (in-process,
//! used by previews and tests).

pub mod backend;
pub mod database;
pub mod documents;
pub mod legacy;
pub mod memory;
pub mod migrations;
pub mod tenants;

mod error;

pub use backend::{BackendError, BackendResult, SqliteBackend, TokenBackend};
pub use database::Database;
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use tenants::TenantRecord;
