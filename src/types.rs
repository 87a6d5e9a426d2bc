use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-reported request budget, as last observed in response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: u64,
    pub reset_at_ms: i64,
}

impl RateLimitState {
    pub const INITIAL_REMAINING: u64 = 10_000;

    pub fn initial(now_ms: i64) -> Self {
        Self {
            remaining: Self::INITIAL_REMAINING,
            reset_at_ms: now_ms,
        }
    }
}

// Snapshot handed to callers of `ApiClient::rate_limit_status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl From<RateLimitState> for RateLimitStatus {
    fn from(s: RateLimitState) -> Self {
        Self {
            remaining: s.remaining,
            reset_at: DateTime::<Utc>::from_timestamp_millis(s.reset_at_ms)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}
