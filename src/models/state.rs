// Store state exposed to consumers (HTTP, WebSocket, subscribers)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::{BannerLevel, HealthGroup, HealthSnapshot, HealthStatus, PollingStatus};

/// Advisory surfaced while the overall status is not healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub level: BannerLevel,
    pub message: String,
    pub timestamp: String,
}

/// Full read surface of the store. Every published update is a complete clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthState {
    pub groups: BTreeMap<String, HealthGroup>,
    /// Newest first, bounded by the store's history capacity.
    pub snapshot_history: VecDeque<HealthSnapshot>,
    pub overall_status: HealthStatus,
    /// Timestamp of the last ingested cycle, live or fallback.
    pub last_updated: Option<String>,
    /// Timestamp of the last live cycle only.
    pub last_successful_fetch: Option<String>,
    pub polling_status: PollingStatus,
    pub last_error: Option<String>,
    pub banner: Option<Banner>,
}

impl HealthState {
    /// True when the displayed groups came from a synthesized payload.
    pub fn is_fallback(&self) -> bool {
        self.last_updated.is_some() && self.last_updated != self.last_successful_fetch
    }
}
