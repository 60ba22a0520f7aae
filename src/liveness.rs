//! Liveness Checks
//!
//! Verifies that both backends answer a round-trip query before any
//! replication work begins.

use crate::context::ReplicationContext;
use crate::error::{Error, Result};
use crate::pool::{join_fail_fast, Backend};
use crate::sink::LogSink;

/// Ping both backends concurrently; the first failure cancels the other
/// check and is returned. Nothing is retried.
pub async fn ping_all(ctx: &ReplicationContext, sink: &LogSink) -> Result<()> {
    let (source, target) = join_fail_fast(
        check(ctx, Backend::Source),
        check(ctx, Backend::Target),
    )
    .await;

    let failure = [source, target]
        .into_iter()
        .flatten()
        .find_map(|outcome| outcome.err());

    match failure {
        Some(e) => {
            sink.log_error(&format!("\t--[Liveness] {}", e), Some("SELECT 1"))
                .await;
            Err(e)
        }
        None => {
            tracing::info!("Both backends are reachable");
            Ok(())
        }
    }
}

async fn check(ctx: &ReplicationContext, backend: Backend) -> Result<()> {
    let pool = ctx.pool(backend).ok_or_else(|| Error::Liveness {
        backend,
        reason: "connections pool has not been created".into(),
    })?;

    pool.ping().await.map_err(|e| Error::Liveness {
        backend,
        reason: e.to_string(),
    })?;

    tracing::debug!("{} responded to liveness check", backend);
    Ok(())
}
