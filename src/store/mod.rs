//! Durable store for deployed applications and their resources.
//!
//! # Data Flow
//! ```text
//! Registry
//!     → Store trait (save/delete deployment, lookups)
//!     → redb_store.rs (redb write/read transactions)
//!     → tables.rs (applications, resources, identifier index, sequences)
//! ```
//!
//! # Design Decisions
//! - A deployment (application + resources) is written or removed in one
//!   write transaction; an error aborts the whole unit
//! - Resource identifiers are unique across applications, enforced in the
//!   same transaction that inserts them
//! - The store is authoritative; the registry index is derived from it

pub mod redb_store;
pub mod tables;

use thiserror::Error;

use crate::model::{Application, Resource, ResourceSpec};

pub use redb_store::RedbStore;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("resource identifier '{0}' is already registered")]
    Conflict(String),
}

/// Persistence contract required by the registry.
pub trait Store: Send + Sync {
    /// All persisted applications.
    fn find_all_applications(&self) -> StoreResult<Vec<Application>>;

    /// One application by id.
    fn find_application(&self, id: &str) -> StoreResult<Option<Application>>;

    /// Persist `application` and `resources` as one unit, replacing any
    /// resources previously owned by the same application id.
    fn save_deployment(
        &self,
        application: &Application,
        resources: &[ResourceSpec],
    ) -> StoreResult<Vec<Resource>>;

    /// Delete an application and all its resources. Returns true if the
    /// application existed.
    fn delete_deployment(&self, application_id: &str) -> StoreResult<bool>;

    /// All resources owned by an application.
    fn find_resources_by_application(&self, application_id: &str) -> StoreResult<Vec<Resource>>;

    /// The resource of an application registered with exactly `path`.
    fn find_resource_by_application_and_path(
        &self,
        application_id: &str,
        path: &str,
    ) -> StoreResult<Option<Resource>>;

    /// A resource by its global identifier.
    fn find_resource_by_identifier(&self, identifier: &str) -> StoreResult<Option<Resource>>;
}
