//! Execution deadline for downstream calls.
//!
//! # Design Decisions
//! - One deadline covers every attempt of a call, retries included
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut`, giving up once `deadline` has passed.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineExceeded(deadline))
}
