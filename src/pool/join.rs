//! Fail-fast join of two fallible futures

use std::future::Future;

use crate::error::Result;

/// Drive both futures until both succeed or one fails.
///
/// On the first failure the other future is dropped, cancelling it. A
/// side that was cancelled comes back as `None`; a side that completed
/// before its sibling failed keeps its result.
pub(crate) async fn join_fail_fast<A, B, FA, FB>(
    left: FA,
    right: FB,
) -> (Option<Result<A>>, Option<Result<B>>)
where
    FA: Future<Output = Result<A>>,
    FB: Future<Output = Result<B>>,
{
    tokio::pin!(left);
    tokio::pin!(right);

    let mut a: Option<Result<A>> = None;
    let mut b: Option<Result<B>> = None;

    loop {
        tokio::select! {
            res = &mut left, if a.is_none() => {
                let failed = res.is_err();
                a = Some(res);
                if failed {
                    break;
                }
            }
            res = &mut right, if b.is_none() => {
                let failed = res.is_err();
                b = Some(res);
                if failed {
                    break;
                }
            }
        }

        if a.is_some() && b.is_some() {
            break;
        }
    }

    (a, b)
}
