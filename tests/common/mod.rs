// Shared test helpers
#![allow(dead_code)]

use async_trait::async_trait;
use gateway_health::models::RawPayload;
use gateway_health::probe::{HealthProbe, ProbeError};
use gateway_health::store::{HealthStore, StoreConfig};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replays `script` in call order (`None` = HTTP 503), repeating the last entry.
pub struct ScriptedProbe {
    script: Vec<Option<RawPayload>>,
    delays: Vec<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(script: Vec<Option<RawPayload>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            delays: vec![],
            calls: AtomicUsize::new(0),
        })
    }

    /// Like `new`, but call `n` sleeps `delays[n]` (tokio time) before replying.
    pub fn with_delays(script: Vec<Option<RawPayload>>, delays: Vec<Duration>) -> Arc<Self> {
        Arc::new(Self {
            script,
            delays,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(payload: RawPayload) -> Arc<Self> {
        Self::new(vec![Some(payload)])
    }

    pub fn failing() -> Arc<Self> {
        Self::new(vec![None])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn check_health(&self) -> Result<RawPayload, ProbeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(n) {
            tokio::time::sleep(*delay).await;
        }
        self.script
            .get(n)
            .or(self.script.last())
            .cloned()
            .flatten()
            .ok_or(ProbeError::Status(503))
    }
}

pub fn store_with(probe: Arc<ScriptedProbe>) -> Arc<HealthStore> {
    HealthStore::new(probe, StoreConfig::default())
}

/// `{ "groups": { id: { "status": status } } }`
pub fn payload(groups: &[(&str, &str)]) -> RawPayload {
    let groups: Map<String, Value> = groups
        .iter()
        .map(|(id, status)| (id.to_string(), json!({ "status": status })))
        .collect();
    json!({ "groups": groups })
}

/// Every default group reporting `status`.
pub fn all_defaults(status: &str) -> RawPayload {
    payload(&[
        ("transactions", status),
        ("merchants", status),
        ("common-codes", status),
        ("proxy", status),
    ])
}
