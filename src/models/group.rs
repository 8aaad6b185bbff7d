// Per-subsystem health and the normalizer's output shape

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::HealthStatus;

/// One monitored subsystem as seen in a single cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthGroup {
    pub id: String,
    /// Display text or an indirection key; resolved by the presentation layer.
    pub label: String,
    pub status: HealthStatus,
    /// `None` means "not measured". Never negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub last_checked_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Point-in-time capture of one ingestion cycle. Groups are owned copies, so
/// later state changes never reach a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub timestamp: String,
    pub overall_status: HealthStatus,
    /// Default registry groups first, then any extra groups by id.
    pub groups: Vec<HealthGroup>,
}

/// Canonical payload exchanged between the normalizer and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedHealthPayload {
    pub timestamp: String,
    pub overall_status: HealthStatus,
    pub groups: BTreeMap<String, HealthGroup>,
    pub snapshot: HealthSnapshot,
}
