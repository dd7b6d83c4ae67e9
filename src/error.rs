use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fatal, user-facing failures. Transport errors stay `anyhow` and abort the
/// run the same way; nothing here is retried.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid lookback format {0:?} (expected e.g. 10d, 3w, 2m, 1q, 1y)")]
    InvalidFormat(String),

    #[error("resolved window start {start} is after the current time")]
    FutureWindow { start: DateTime<Utc> },

    #[error("no team named {0:?} in the configuration")]
    MissingTeamConfiguration(String),
}
