//! ReplBridge - MySQL to PostgreSQL Replication Bridge
//!
//! Bootstraps a replication bridge that mirrors changes from a MySQL
//! source database into a PostgreSQL target database.
//!
//! # Architecture
//!
//! Before any replication work begins the bridge runs a short boot
//! pipeline over a single [`ReplicationContext`]:
//!
//! 1. create both connection pools (concurrently, at most once each)
//! 2. verify that both backends answer a round-trip query
//! 3. wait for an operator to confirm the run
//!
//! Any infrastructure failure along the way ends the boot. The context
//! also carries the mapping table that renames tables and columns between
//! the source schema and the target schema.
//!
//! # Features
//!
//! - sqlx connection pools for both endpoints with configurable limits
//! - Fail-fast concurrent pool creation and liveness checks
//! - Interactive proceed/abort gate
//! - Table and column renaming with identity fallback
//! - Append-only diagnostic log files with console fallback

pub mod config;
pub mod error;
pub mod context;
pub mod mapping;
pub mod pool;
pub mod liveness;
pub mod gate;
pub mod sink;
pub mod boot;

pub use config::BridgeConfig;
pub use context::ReplicationContext;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::boot::{BootOutcome, Bootstrap};
    pub use crate::config::BridgeConfig;
    pub use crate::context::ReplicationContext;
    pub use crate::error::{Error, Result};
    pub use crate::gate::{Decision, MatchMode};
    pub use crate::mapping::{MappingDocument, NameMapper};
    pub use crate::pool::{Backend, BackendPool, PoolConnector, SqlxConnector};
    pub use crate::sink::LogSink;
}
