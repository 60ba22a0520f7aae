//! Pool handles
//!
//! A created pool for either backend. Connections are leased from the
//! pool and returned to it when the lease is dropped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use sqlx::{MySqlPool, PgPool};

use crate::error::{Error, Result};

/// A connection pool attached to the replication context
#[derive(Debug, Clone)]
pub enum BackendPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    /// In-memory pool for running the boot pipeline without a database
    Mock(MockPool),
}

impl BackendPool {
    /// Lease one connection, run a trivial round-trip query, give the
    /// connection back.
    pub async fn ping(&self) -> Result<()> {
        match self {
            BackendPool::MySql(pool) => {
                let mut conn = pool.acquire().await?;
                sqlx::query("SELECT 1").execute(&mut *conn).await?;
            }
            BackendPool::Postgres(pool) => {
                let mut conn = pool.acquire().await?;
                sqlx::query("SELECT 1").execute(&mut *conn).await?;
            }
            BackendPool::Mock(pool) => {
                let _lease = pool.acquire();
                pool.query()?;
            }
        }
        Ok(())
    }

    /// Close the pool, waiting for leased connections to come back
    pub async fn close(&self) {
        match self {
            BackendPool::MySql(pool) => pool.close().await,
            BackendPool::Postgres(pool) => pool.close().await,
            BackendPool::Mock(pool) => pool.close(),
        }
    }

    pub fn as_mysql(&self) -> Option<&MySqlPool> {
        match self {
            BackendPool::MySql(pool) => Some(pool),
            _ => None,
        }
    }

    pub fn as_postgres(&self) -> Option<&PgPool> {
        match self {
            BackendPool::Postgres(pool) => Some(pool),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    unhealthy: AtomicBool,
    closed: AtomicBool,
    in_use: AtomicUsize,
    leases: AtomicUsize,
}

/// Mock pool that tracks leased connections
#[derive(Debug, Clone, Default)]
pub struct MockPool {
    state: Arc<MockState>,
}

impl MockPool {
    /// A pool whose round-trip query succeeds
    pub fn healthy() -> Self {
        Self::default()
    }

    /// A pool whose round-trip query fails
    pub fn unhealthy() -> Self {
        let pool = Self::default();
        pool.state.unhealthy.store(true, Ordering::SeqCst);
        pool
    }

    fn acquire(&self) -> MockLease {
        self.state.in_use.fetch_add(1, Ordering::SeqCst);
        self.state.leases.fetch_add(1, Ordering::SeqCst);
        MockLease {
            state: Arc::clone(&self.state),
        }
    }

    fn query(&self) -> Result<()> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        if self.state.unhealthy.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::Protocol(
                "mock backend is not responding".into(),
            )));
        }
        Ok(())
    }

    fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    /// Connections currently leased
    pub fn in_use(&self) -> usize {
        self.state.in_use.load(Ordering::SeqCst)
    }

    /// Total leases handed out
    pub fn leases(&self) -> usize {
        self.state.leases.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

struct MockLease {
    state: Arc<MockState>,
}

impl Drop for MockLease {
    fn drop(&mut self) {
        self.state.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}
