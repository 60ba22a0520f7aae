//! Boot Pipeline
//!
//! context → pools → liveness → operator gate → hand-off.
//!
//! Pools are released on every path that does not hand the context off:
//! fatal errors, operator aborts and cancellation.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::context::ReplicationContext;
use crate::error::{Error, Result};
use crate::gate::{self, Decision, MatchMode};
use crate::liveness::ping_all;
use crate::pool::{ensure_pools, PoolConnector};
use crate::sink::LogSink;

/// Result of a boot that did not fail
#[derive(Debug)]
pub enum BootOutcome {
    /// Both endpoints verified and confirmed; the context is handed off
    Ready(ReplicationContext),
    /// The operator declined
    Aborted,
}

/// Runs the boot stages against one connector and sink
pub struct Bootstrap<'a> {
    connector: &'a dyn PoolConnector,
    sink: &'a LogSink,
    match_mode: MatchMode,
}

impl<'a> Bootstrap<'a> {
    pub fn new(connector: &'a dyn PoolConnector, sink: &'a LogSink) -> Self {
        Self {
            connector,
            sink,
            match_mode: MatchMode::default(),
        }
    }

    /// Set how operator input is matched
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Run the full pipeline, including the operator gate
    pub async fn run<R, W>(
        &self,
        ctx: ReplicationContext,
        input: &mut R,
        output: &mut W,
    ) -> Result<BootOutcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.run_until(ctx, input, output, std::future::pending()).await
    }

    /// Run the full pipeline, giving up with [`Error::Cancelled`] when
    /// `shutdown` completes first
    pub async fn run_until<R, W, S>(
        &self,
        mut ctx: ReplicationContext,
        input: &mut R,
        output: &mut W,
        shutdown: S,
    ) -> Result<BootOutcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let result = tokio::select! {
            res = self.stages(&mut ctx, input, output) => res,
            _ = shutdown => Err(Error::Cancelled),
        };

        match result {
            Ok(Decision::Proceed) => {
                tracing::info!("Boot complete, handing off to replication");
                Ok(BootOutcome::Ready(ctx))
            }
            Ok(Decision::Abort) => {
                ctx.close_pools().await;
                Ok(BootOutcome::Aborted)
            }
            Err(e) => {
                self.fail(&mut ctx, &e).await;
                Err(e)
            }
        }
    }

    /// Create and verify both pools without asking the operator, then
    /// release them
    pub async fn check(&self, mut ctx: ReplicationContext) -> Result<()> {
        let result = self.verify(&mut ctx).await;
        if let Err(e) = &result {
            self.fail(&mut ctx, e).await;
        } else {
            ctx.close_pools().await;
        }
        result
    }

    async fn verify(&self, ctx: &mut ReplicationContext) -> Result<()> {
        ensure_pools(ctx, self.connector, self.sink).await?;
        ping_all(ctx, self.sink).await
    }

    async fn stages<R, W>(
        &self,
        ctx: &mut ReplicationContext,
        input: &mut R,
        output: &mut W,
    ) -> Result<Decision>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.verify(ctx).await?;
        gate::confirm(ctx, input, output, self.match_mode, self.sink).await
    }

    // The error itself is reported once by the caller
    async fn fail(&self, ctx: &mut ReplicationContext, error: &Error) {
        let message = match error {
            Error::Cancelled => "\t--[Boot] Cancelled, releasing connections...",
            _ => "\t--[Boot] Boot failed, releasing connections...",
        };
        self.sink.log(message).await;
        ctx.close_pools().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::BufReader;

    use super::*;
    use crate::context::tests::test_context;
    use crate::pool::testing::{Behavior, MockConnector};
    use crate::pool::Backend;

    async fn boot(
        connector: &MockConnector,
        input: &[u8],
    ) -> (Result<BootOutcome>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let sink = LogSink::new(&ctx).await;
        let mut reader = BufReader::new(input);
        let mut out = Vec::new();

        let outcome = Bootstrap::new(connector, &sink)
            .run(ctx, &mut reader, &mut out)
            .await;
        (outcome, dir)
    }

    #[tokio::test]
    async fn test_confirmed_boot_hands_off_context() {
        let connector = MockConnector::default();
        let (outcome, _dir) = boot(&connector, b"Y\n").await;

        match outcome.unwrap() {
            BootOutcome::Ready(ctx) => {
                assert!(ctx.pool(Backend::Source).is_some());
                assert!(ctx.pool(Backend::Target).is_some());
            }
            BootOutcome::Aborted => panic!("expected hand-off"),
        }
        assert!(!connector.created(Backend::Source).unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_abort_releases_pools() {
        let connector = MockConnector::default();
        let (outcome, _dir) = boot(&connector, b"n\n").await;

        assert!(matches!(outcome.unwrap(), BootOutcome::Aborted));
        assert!(connector.created(Backend::Source).unwrap().is_closed());
        assert!(connector.created(Backend::Target).unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_pool_failure_releases_created_sibling() {
        let connector = MockConnector::new(
            Behavior::default(),
            Behavior {
                fail: true,
                delay: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        );
        let (outcome, dir) = boot(&connector, b"Y\n").await;

        assert!(matches!(outcome.unwrap_err(), Error::PoolCreation { .. }));
        assert!(connector.created(Backend::Source).unwrap().is_closed());

        // One error record from the pool manager, one release note from boot
        let errors = std::fs::read_to_string(dir.path().join("errors-only.log")).unwrap();
        assert_eq!(errors.matches("Cannot create").count(), 1);
        let all = std::fs::read_to_string(dir.path().join("all.log")).unwrap();
        assert_eq!(all.matches("[Boot] Boot failed, releasing connections").count(), 1);
    }

    #[tokio::test]
    async fn test_liveness_failure_stops_before_gate() {
        let connector = MockConnector::new(
            Behavior::default(),
            Behavior {
                unhealthy: true,
                ..Default::default()
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let sink = LogSink::new(&ctx).await;
        let mut reader = BufReader::new(&b"Y\n"[..]);
        let mut out = Vec::new();

        let err = Bootstrap::new(&connector, &sink)
            .run(ctx, &mut reader, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Liveness {
                backend: Backend::Target,
                ..
            }
        ));
        assert!(out.is_empty(), "gate must not prompt after a failed check");
        assert!(connector.created(Backend::Source).unwrap().is_closed());
        assert!(connector.created(Backend::Target).unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_cancellation_while_waiting_for_operator() {
        let connector = MockConnector::default();
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let sink = LogSink::new(&ctx).await;
        let (_operator, terminal) = tokio::io::duplex(64);
        let mut reader = BufReader::new(terminal);
        let mut out = Vec::new();

        let err = Bootstrap::new(&connector, &sink)
            .run_until(
                ctx,
                &mut reader,
                &mut out,
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(connector.created(Backend::Source).unwrap().is_closed());
        assert!(connector.created(Backend::Target).unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_check_releases_pools() {
        let connector = MockConnector::default();
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let sink = LogSink::new(&ctx).await;

        Bootstrap::new(&connector, &sink)
            .with_match_mode(MatchMode::Exact)
            .check(ctx)
            .await
            .unwrap();

        assert!(connector.created(Backend::Source).unwrap().is_closed());
        assert!(connector.created(Backend::Target).unwrap().is_closed());
    }
}
