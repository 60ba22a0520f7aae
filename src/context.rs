//! Replication Context
//!
//! The resolved configuration, connection parameters, pool handles and
//! mapping table for one bridge run. It is built once at boot and passed
//! by exclusive reference through each stage of the boot pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::{BridgeConfig, SourceConfig, TargetConfig};
use crate::mapping::{MappingDocument, NameMapper};
use crate::pool::{Backend, BackendPool};

/// Everything the replication engine needs once the boot has succeeded
#[derive(Debug)]
pub struct ReplicationContext {
    source: SourceConfig,
    target: TargetConfig,
    source_pool: Option<BackendPool>,
    target_pool: Option<BackendPool>,
    max_pool_size_source: u32,
    max_pool_size_target: u32,
    encoding: String,
    schema: String,
    logs_dir: PathBuf,
    all_logs_path: PathBuf,
    error_logs_path: PathBuf,
    extra_config: Option<MappingDocument>,
    exclude_tables: Vec<String>,
    started_at: DateTime<Utc>,
}

impl ReplicationContext {
    /// Build the context from a parsed configuration
    pub fn from_config(config: &BridgeConfig, extra_config: Option<MappingDocument>) -> Self {
        let logs_dir = config.logs_dir();

        Self {
            source: config.source.clone(),
            target: config.target.clone(),
            source_pool: None,
            target_pool: None,
            max_pool_size_source: config.max_pool_size_source(),
            max_pool_size_target: config.max_pool_size_target(),
            encoding: config.encoding.clone(),
            schema: config.schema().to_string(),
            all_logs_path: logs_dir.join("all.log"),
            error_logs_path: logs_dir.join("errors-only.log"),
            logs_dir,
            extra_config,
            exclude_tables: config.exclude_tables.clone(),
            started_at: Utc::now(),
        }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// Pool handle for one backend, if it has been created
    pub fn pool(&self, backend: Backend) -> Option<&BackendPool> {
        match backend {
            Backend::Source => self.source_pool.as_ref(),
            Backend::Target => self.target_pool.as_ref(),
        }
    }

    /// Only the pool manager assigns handles, and only into empty slots
    pub(crate) fn set_pool(&mut self, backend: Backend, pool: BackendPool) {
        let slot = match backend {
            Backend::Source => &mut self.source_pool,
            Backend::Target => &mut self.target_pool,
        };
        if slot.is_none() {
            *slot = Some(pool);
        }
    }

    /// Configured pool size limit for one backend
    pub fn max_pool_size(&self, backend: Backend) -> u32 {
        match backend {
            Backend::Source => self.max_pool_size_source,
            Backend::Target => self.max_pool_size_target,
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Target schema name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Combined log file
    pub fn all_logs_path(&self) -> &Path {
        &self.all_logs_path
    }

    /// Error-only log file
    pub fn error_logs_path(&self) -> &Path {
        &self.error_logs_path
    }

    /// Per-table log file
    pub fn table_log_path(&self, table: &str) -> PathBuf {
        self.logs_dir.join(format!("{}.log", table))
    }

    pub fn extra_config(&self) -> Option<&MappingDocument> {
        self.extra_config.as_ref()
    }

    /// Identifier resolver over the mapping table
    pub fn mapper(&self) -> NameMapper<'_> {
        NameMapper::new(self.extra_config.as_ref())
    }

    pub fn exclude_tables(&self) -> &[String] {
        &self.exclude_tables
    }

    /// Check whether a source table is excluded from replication
    pub fn is_table_excluded(&self, table: &str) -> bool {
        self.exclude_tables.iter().any(|t| t == table)
    }

    /// When this context was built
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Close both pools. Safe to call more than once.
    pub async fn close_pools(&mut self) {
        if let Some(pool) = self.source_pool.take() {
            pool.close().await;
            tracing::debug!("Closed {} pool", Backend::Source);
        }
        if let Some(pool) = self.target_pool.take() {
            pool.close().await;
            tracing::debug!("Closed {} pool", Backend::Target);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::MockPool;

    pub(crate) fn test_config(logs_dir: &Path) -> BridgeConfig {
        let toml = format!(
            r#"
logs_dir = "{}"
exclude_tables = ["sessions"]
max_pool_size_target = 4

[source]
host = "mysql.local"
user = "repl"
database = "shop"

[target]
host = "pg.local"
user = "repl"
database = "shop_copy"
"#,
            logs_dir.display()
        );
        BridgeConfig::from_str(&toml).unwrap()
    }

    pub(crate) fn test_context(logs_dir: &Path) -> ReplicationContext {
        ReplicationContext::from_config(&test_config(logs_dir), None)
    }

    #[test]
    fn test_context_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());

        assert_eq!(ctx.max_pool_size(Backend::Source), 10);
        assert_eq!(ctx.max_pool_size(Backend::Target), 4);
        assert_eq!(ctx.encoding(), "utf8");
        assert_eq!(ctx.schema(), "public");
        assert_eq!(ctx.all_logs_path(), dir.path().join("all.log"));
        assert_eq!(ctx.error_logs_path(), dir.path().join("errors-only.log"));
        assert_eq!(ctx.table_log_path("orders"), dir.path().join("orders.log"));
        assert!(ctx.pool(Backend::Source).is_none());
        assert!(ctx.pool(Backend::Target).is_none());
    }

    #[test]
    fn test_excluded_tables() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());

        assert!(ctx.is_table_excluded("sessions"));
        assert!(!ctx.is_table_excluded("Sessions"));
        assert!(!ctx.is_table_excluded("orders"));
    }

    #[test]
    fn test_mapper_without_document_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());

        assert_eq!(ctx.mapper().table_name("orders", false), "orders");
        assert_eq!(ctx.mapper().column_name("orders", "id", true), "id");
    }

    #[tokio::test]
    async fn test_set_pool_keeps_first_handle_and_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = test_context(dir.path());

        let first = MockPool::healthy();
        let second = MockPool::healthy();
        ctx.set_pool(Backend::Source, BackendPool::Mock(first.clone()));
        ctx.set_pool(Backend::Source, BackendPool::Mock(second.clone()));

        ctx.close_pools().await;
        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert!(ctx.pool(Backend::Source).is_none());

        ctx.close_pools().await;
    }
}
