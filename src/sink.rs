//! Diagnostic Log Sink
//!
//! Append-only log files in the logs directory. Every record also goes to
//! the console through `tracing`, which stays available when a file
//! cannot be written. File failures are reported and counted, never
//! propagated: a broken log file must not stop the boot.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncWriteExt;

use crate::context::ReplicationContext;

/// Durable diagnostic log writer
#[derive(Debug)]
pub struct LogSink {
    all_logs_path: PathBuf,
    error_logs_path: PathBuf,
    failures: AtomicUsize,
}

impl LogSink {
    /// Create a sink writing into the context's logs directory
    pub async fn new(ctx: &ReplicationContext) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(ctx.logs_dir()).await {
            tracing::warn!(
                "Cannot create logs directory {}: {}",
                ctx.logs_dir().display(),
                e
            );
        }

        Self::from_paths(ctx.all_logs_path(), ctx.error_logs_path())
    }

    /// Create a sink with explicit file paths
    pub fn from_paths(
        all_logs_path: impl Into<PathBuf>,
        error_logs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            all_logs_path: all_logs_path.into(),
            error_logs_path: error_logs_path.into(),
            failures: AtomicUsize::new(0),
        }
    }

    /// Record a message in the combined log
    pub async fn log(&self, message: &str) {
        self.log_table(message, None).await;
    }

    /// Record a message in the combined log and, when given, in a
    /// per-table log as well
    pub async fn log_table(&self, message: &str, table_log_path: Option<&Path>) {
        tracing::info!("{}", message);

        let record = format!("{}\n\n", message);
        self.append(&self.all_logs_path, &record).await;

        if let Some(path) = table_log_path {
            self.append(path, &record).await;
        }
    }

    /// Record an error, with the offending statement if there is one
    pub async fn log_error(&self, message: &str, sql: Option<&str>) {
        let detailed = format!("{}\n\n\tSQL: {}\n\n", message, sql.unwrap_or(""));
        tracing::error!("{}", detailed.trim_end());

        self.append(&self.all_logs_path, &format!("{}\n\n", detailed))
            .await;
        self.append(&self.error_logs_path, &detailed).await;
    }

    /// Number of records that could not be written to a file
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    async fn append(&self, path: &Path, record: &str) {
        if let Err(e) = append_to(path, record.as_bytes()).await {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Cannot write log record to {}: {}", path.display(), e);
        }
    }
}

async fn append_to(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}
