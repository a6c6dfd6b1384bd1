//! redb table definitions for the gateway store.
//!
//! Values are JSON-serialized domain types.

use redb::TableDefinition;

/// Applications keyed by application id.
pub const APPLICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("applications");

/// Resources keyed by surrogate id.
pub const RESOURCES: TableDefinition<u64, &[u8]> = TableDefinition::new("resources");

/// Unique index: resource identifier → surrogate id.
pub const RESOURCE_IDENTIFIERS: TableDefinition<&str, u64> =
    TableDefinition::new("resource_identifiers");

/// Named counters.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence name for resource surrogate ids.
pub const RESOURCE_SEQUENCE: &str = "resources";
