//! Bounded retry around one category walk.

use crate::error::ScrapeError;
use std::future::Future;
use tracing::{error, warn};

/// Classification of a failed attempt, decided by an injectable policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    Fatal,
}

/// Default policy: every failure is retryable, configuration mistakes that can
/// never succeed included. A deliberate simplicity tradeoff, not a bug.
pub fn retry_everything(_: &ScrapeError) -> ErrorClass {
    ErrorClass::Retryable
}

/// Runs `op` up to `max_attempts` times sequentially, stopping on the first
/// success. There is no backoff between attempts.
///
/// Exhaustion is reported, never propagated; the session moves on to the next
/// category job regardless of how this one ended. Returns whether any attempt
/// succeeded.
pub async fn run_with_retry<F, Fut, C>(
    label: &str,
    max_attempts: u32,
    classify: C,
    mut op: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ScrapeError>>,
    C: Fn(&ScrapeError) -> ErrorClass,
{
    for attempt in 1..=max_attempts {
        match op().await {
            Ok(()) => return true,
            Err(err) => {
                if classify(&err) == ErrorClass::Fatal {
                    error!("{} failed with a terminal error: {}", label, err);
                    return false;
                }
                if attempt == max_attempts {
                    error!("{} failed after {} attempts: {}", label, max_attempts, err);
                } else {
                    warn!("Retrying {} (attempt {} of {}): {}", label, attempt, max_attempts, err);
                }
            }
        }
    }
    false
}
