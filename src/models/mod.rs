// Health domain models

mod group;
mod state;
mod status;

use chrono::{DateTime, SecondsFormat, Utc};

pub use group::{HealthGroup, HealthSnapshot, NormalizedHealthPayload};
pub use state::{Banner, HealthState};
pub use status::{BannerLevel, HealthStatus, PollingStatus};

/// Loosely-typed probe payload. Its shape is not fixed; see [`crate::normalizer`].
pub type RawPayload = serde_json::Value;

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Epoch milliseconds to ISO-8601; `None` when out of chrono's range.
pub fn timestamp_from_millis(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(format_timestamp)
}
