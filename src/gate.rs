//! Operator Gate
//!
//! Holds the boot pipeline until an operator confirms that replication
//! may start. There is no timeout: the gate waits for as long as the
//! input stays open.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::context::ReplicationContext;
use crate::error::Result;
use crate::sink::LogSink;

/// Operator answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

/// How an input line is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// 'n' anywhere in the line aborts, otherwise 'Y' anywhere proceeds
    #[default]
    Substring,
    /// The trimmed line must be exactly "n" or "Y"
    Exact,
}

/// Interpret one input line. `None` means the line is ignored.
pub fn classify(line: &str, mode: MatchMode) -> Option<Decision> {
    match mode {
        MatchMode::Substring => {
            if line.contains('n') {
                Some(Decision::Abort)
            } else if line.contains('Y') {
                Some(Decision::Proceed)
            } else {
                None
            }
        }
        MatchMode::Exact => match line.trim() {
            "n" => Some(Decision::Abort),
            "Y" => Some(Decision::Proceed),
            _ => None,
        },
    }
}

/// Greeting shown before the prompt
pub fn greeting(ctx: &ReplicationContext) -> String {
    let source = ctx.source();
    let target = ctx.target();
    format!(
        "\n\t--[ReplBridge] Replication from MySQL database \"{}\" at {}:{} \
         to PostgreSQL database \"{}\" (schema \"{}\") at {}:{} is about to start.\
         \n\t--Boot started at {}.\n\t--Type 'Y' to proceed or 'n' to abort:",
        source.database,
        source.host,
        source.port,
        target.database,
        ctx.schema(),
        target.host,
        target.port,
        ctx.started_at().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

/// Print the greeting and read lines until the operator decides.
///
/// Unmatched lines are ignored. End of input counts as an abort.
pub async fn confirm<R, W>(
    ctx: &ReplicationContext,
    input: &mut R,
    output: &mut W,
    mode: MatchMode,
    sink: &LogSink,
) -> Result<Decision>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(greeting(ctx).as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;

    // Raw bytes: a line that is not valid UTF-8 is just another unmatched line
    let mut buf = Vec::new();
    let decision = loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            tracing::warn!("Input closed before the operator answered");
            break Decision::Abort;
        }

        let line = String::from_utf8_lossy(&buf);
        match classify(&line, mode) {
            Some(decision) => break decision,
            None => tracing::trace!("Ignoring operator input {:?}", line.trim_end()),
        }
    };

    let message = match decision {
        Decision::Proceed => "\t--[ReplBridge] Operator confirmed, starting replication...",
        Decision::Abort => "\t--[ReplBridge] Replication aborted by operator.",
    };
    sink.log(message).await;

    Ok(decision)
}
