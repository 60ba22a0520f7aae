//! Pool connectors
//!
//! The seam between the pool manager and the database drivers.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use super::BackendPool;
use crate::config::{SourceConfig, TargetConfig};
use crate::error::Result;

/// Creates connection pools for each backend
#[async_trait]
pub trait PoolConnector: Send + Sync {
    /// Create the source pool bounded by `max_connections`
    async fn connect_source(
        &self,
        params: &SourceConfig,
        encoding: &str,
        max_connections: u32,
    ) -> Result<BackendPool>;

    /// Create the target pool bounded by `max_connections`
    async fn connect_target(&self, params: &TargetConfig, max_connections: u32)
        -> Result<BackendPool>;
}

/// Connector backed by sqlx pools
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

#[async_trait]
impl PoolConnector for SqlxConnector {
    async fn connect_source(
        &self,
        params: &SourceConfig,
        encoding: &str,
        max_connections: u32,
    ) -> Result<BackendPool> {
        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
            .charset(encoding);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(params.connect_timeout())
            .connect_with(options)
            .await?;

        Ok(BackendPool::MySql(pool))
    }

    async fn connect_target(
        &self,
        params: &TargetConfig,
        max_connections: u32,
    ) -> Result<BackendPool> {
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(params.connect_timeout())
            .connect_with(options)
            .await?;

        Ok(BackendPool::Postgres(pool))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::pool::{Backend, MockPool};

    /// How the mock connector behaves for one backend
    #[derive(Debug, Clone, Default)]
    pub(crate) struct Behavior {
        pub fail: bool,
        pub unhealthy: bool,
        pub delay: Option<Duration>,
    }

    /// Connector producing [`MockPool`]s and counting attempts
    #[derive(Debug, Default)]
    pub(crate) struct MockConnector {
        pub source: Behavior,
        pub target: Behavior,
        source_attempts: AtomicUsize,
        target_attempts: AtomicUsize,
        limits: Mutex<Vec<(Backend, u32)>>,
        created: Mutex<Vec<(Backend, MockPool)>>,
    }

    impl MockConnector {
        pub(crate) fn new(source: Behavior, target: Behavior) -> Self {
            Self {
                source,
                target,
                ..Default::default()
            }
        }

        pub(crate) fn attempts(&self, backend: Backend) -> usize {
            match backend {
                Backend::Source => self.source_attempts.load(Ordering::SeqCst),
                Backend::Target => self.target_attempts.load(Ordering::SeqCst),
            }
        }

        pub(crate) fn limits(&self) -> Vec<(Backend, u32)> {
            self.limits.lock().unwrap().clone()
        }

        /// The mock pool created for a backend, if any
        pub(crate) fn created(&self, backend: Backend) -> Option<MockPool> {
            self.created
                .lock()
                .unwrap()
                .iter()
                .find(|(b, _)| *b == backend)
                .map(|(_, p)| p.clone())
        }

        async fn create(&self, backend: Backend, max_connections: u32) -> Result<BackendPool> {
            let behavior = match backend {
                Backend::Source => {
                    self.source_attempts.fetch_add(1, Ordering::SeqCst);
                    &self.source
                }
                Backend::Target => {
                    self.target_attempts.fetch_add(1, Ordering::SeqCst);
                    &self.target
                }
            };
            self.limits.lock().unwrap().push((backend, max_connections));

            if let Some(delay) = behavior.delay {
                tokio::time::sleep(delay).await;
            }
            if behavior.fail {
                return Err(Error::Database(sqlx::Error::Protocol(format!(
                    "mock {} refused connection",
                    backend
                ))));
            }

            let pool = if behavior.unhealthy {
                MockPool::unhealthy()
            } else {
                MockPool::healthy()
            };
            self.created.lock().unwrap().push((backend, pool.clone()));
            Ok(BackendPool::Mock(pool))
        }
    }

    #[async_trait]
    impl PoolConnector for MockConnector {
        async fn connect_source(
            &self,
            _params: &SourceConfig,
            _encoding: &str,
            max_connections: u32,
        ) -> Result<BackendPool> {
            self.create(Backend::Source, max_connections).await
        }

        async fn connect_target(
            &self,
            _params: &TargetConfig,
            max_connections: u32,
        ) -> Result<BackendPool> {
            self.create(Backend::Target, max_connections).await
        }
    }
}
