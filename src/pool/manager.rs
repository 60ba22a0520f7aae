//! Pool Manager
//!
//! Ensures both connection pools exist on the replication context.

use super::{join_fail_fast, Backend, BackendPool, PoolConnector};
use crate::context::ReplicationContext;
use crate::error::{Error, Result};
use crate::sink::LogSink;

/// Create whichever pools are missing from the context.
///
/// Both backends are attempted concurrently. A backend that already has a
/// pool is left untouched. The first failure cancels the sibling attempt
/// if it is still running; a sibling pool that was already created stays
/// attached to the context. Failures are logged and not retried.
pub async fn ensure_pools(
    ctx: &mut ReplicationContext,
    connector: &dyn PoolConnector,
    sink: &LogSink,
) -> Result<()> {
    let (source, target) = {
        let ctx = &*ctx;

        let source = async {
            if ctx.pool(Backend::Source).is_some() {
                return Ok(None);
            }
            let created = connector
                .connect_source(
                    ctx.source(),
                    ctx.encoding(),
                    ctx.max_pool_size(Backend::Source),
                )
                .await;
            report(Backend::Source, created, sink).await.map(Some)
        };

        let target = async {
            if ctx.pool(Backend::Target).is_some() {
                return Ok(None);
            }
            let created = connector
                .connect_target(ctx.target(), ctx.max_pool_size(Backend::Target))
                .await;
            report(Backend::Target, created, sink).await.map(Some)
        };

        join_fail_fast(source, target).await
    };

    let mut first_error = None;
    for (backend, outcome) in [(Backend::Source, source), (Backend::Target, target)] {
        match outcome {
            Some(Ok(Some(pool))) => {
                tracing::info!(
                    "Created {} connections pool (max {} connections)",
                    backend,
                    ctx.max_pool_size(backend)
                );
                ctx.set_pool(backend, pool);
            }
            Some(Ok(None)) => {
                tracing::debug!("{} connections pool already exists", backend);
            }
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {
                tracing::debug!("{} pool creation cancelled", backend);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn report(
    backend: Backend,
    created: Result<BackendPool>,
    sink: &LogSink,
) -> Result<BackendPool> {
    match created {
        Ok(pool) => Ok(pool),
        Err(e) => {
            let reason = e.to_string();
            sink.log_error(
                &format!("\t--[Pool] Cannot create {} connections pool...\n{}", backend, reason),
                None,
            )
            .await;
            Err(Error::PoolCreation { backend, reason })
        }
    }
}
