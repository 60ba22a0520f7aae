//! Connection Pool Module
//!
//! Creates the source (MySQL) and target (PostgreSQL) connection pools
//! and attaches them to the replication context.

mod connector;
mod handle;
mod join;
mod manager;

pub use connector::{PoolConnector, SqlxConnector};
pub use handle::{BackendPool, MockPool};
pub use manager::ensure_pools;

pub(crate) use join::join_fail_fast;

#[cfg(test)]
pub(crate) use connector::testing;

use serde::{Deserialize, Serialize};

/// One side of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// MySQL database changes are read from
    Source,
    /// PostgreSQL database changes are applied to
    Target,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Source => write!(f, "MySQL"),
            Backend::Target => write!(f, "PostgreSQL"),
        }
    }
}
