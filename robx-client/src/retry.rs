//! Bounded retry policy for transient transport failures
//!
//! Only two failure classes are ever retried; everything else propagates to
//! the caller on the first attempt.

use std::time::Duration;

/// Error chain marker for the pooled keep-alive race: the server closes a
/// kept-alive connection just as it is being reused
const POOL_RACE_MESSAGE: &str = "connection closed before message completed";

/// Error chain marker for a reset connection
const CONNECTION_RESET_MESSAGE: &str = "connection reset";

/// Classification of a transport failure for retry purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Connection establishment failure, timeout, or connection reset
    Connect,
    /// Pooled keep-alive connection closed by the server mid-reuse
    PoolRace,
}

/// Bounded-attempt retry policy with a linear, kind-specific backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    connect_backoff: Duration,
    race_backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given attempt cap and backoff bases
    pub fn new(max_attempts: u32, connect_backoff: Duration, race_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            connect_backoff,
            race_backoff,
        }
    }

    /// Total attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classify a transport error; `None` means it must propagate immediately
    pub fn classify(error: &reqwest::Error) -> Option<RetryKind> {
        if error.is_connect() || error.is_timeout() {
            return Some(RetryKind::Connect);
        }

        // Walk the source chain: both markers originate deep inside the
        // connection layer and are only observable through their messages.
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
        while let Some(current) = source {
            let message = current.to_string().to_ascii_lowercase();
            if message.contains(POOL_RACE_MESSAGE) {
                return Some(RetryKind::PoolRace);
            }
            if message.contains(CONNECTION_RESET_MESSAGE) {
                return Some(RetryKind::Connect);
            }
            source = current.source();
        }

        None
    }

    /// Delay before retry number `attempt` (1-based: the delay after the
    /// first failed attempt is one backoff base)
    pub fn backoff(&self, kind: RetryKind, attempt: u32) -> Duration {
        let base = match kind {
            RetryKind::Connect => self.connect_backoff,
            RetryKind::PoolRace => self.race_backoff,
        };
        base * attempt
    }
}
