// Polling store: owns health state, runs the probe-and-ingest cycle on a schedule,
// falls back to a synthesized payload when the probe fails, and pushes every
// state change to subscribers.
//
// All writes go through `ingest` / `mutate` under one std RwLock that is never held
// across an await, so overlapping cycles (manual + scheduled) serialize and the last
// one to finish wins.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::fallback;
use crate::models::{
    Banner, BannerLevel, HealthSnapshot, HealthState, HealthStatus,
    NormalizedHealthPayload, PollingStatus, RawPayload,
};
use crate::normalizer;
use crate::probe::HealthProbe;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_HISTORY_CAPACITY: usize = 24;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

pub const BANNER_DOWN_MESSAGE: &str = "health.banner.down";
pub const BANNER_DEGRADED_MESSAGE: &str = "health.banner.degraded";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub interval: Duration,
    /// Max snapshots kept in `snapshot_history`; oldest evicted first.
    pub history_capacity: usize,
    /// Max state updates buffered per subscriber (slow subscribers lag).
    pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl From<&PollingConfig> for StoreConfig {
    fn from(c: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(c.interval_secs),
            history_capacity: c.history_capacity,
            broadcast_capacity: c.broadcast_capacity,
        }
    }
}

/// Where an ingested payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSource {
    Live,
    Fallback { error: String },
}

#[derive(Debug, Clone, Copy)]
enum CycleTrigger {
    Scheduled,
    Manual,
}

impl CycleTrigger {
    fn as_str(self) -> &'static str {
        match self {
            CycleTrigger::Scheduled => "scheduled",
            CycleTrigger::Manual => "manual",
        }
    }
}

struct Poller {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PollerSlot {
    active: Option<Poller>,
    leases: usize,
}

pub struct HealthStore {
    probe: Arc<dyn HealthProbe>,
    config: StoreConfig,
    state: RwLock<HealthState>,
    tx: broadcast::Sender<HealthState>,
    poller: Mutex<PollerSlot>,
    /// Mirrors `poller.active.is_some()` for the ingest path, which must not take the poller lock.
    polling: AtomicBool,
    cycles_total: AtomicU64,
}

impl HealthStore {
    pub fn new(probe: Arc<dyn HealthProbe>, config: StoreConfig) -> Arc<Self> {
        let (tx, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Arc::new(Self {
            probe,
            config,
            state: RwLock::new(HealthState::default()),
            tx,
            poller: Mutex::new(PollerSlot::default()),
            polling: AtomicBool::new(false),
            cycles_total: AtomicU64::new(0),
        })
    }

    /// Current state (a clone; callers cannot mutate the store through it).
    pub fn state(&self) -> HealthState {
        self.read_state().clone()
    }

    pub fn snapshot_history(&self) -> Vec<HealthSnapshot> {
        self.read_state().snapshot_history.iter().cloned().collect()
    }

    /// Receives every state published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<HealthState> {
        self.tx.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    /// Number of cycles started (scheduled and manual) since creation.
    pub fn cycles_total(&self) -> u64 {
        self.cycles_total.load(Ordering::Relaxed)
    }

    /// Runs one cycle now, then every `interval`. No-op when already polling.
    pub fn start_polling(self: &Arc<Self>) {
        let mut slot = self.lock_poller();
        self.start_locked(&mut slot);
    }

    /// Prevents further scheduled cycles. A cycle already in flight completes and
    /// is ingested. Accumulated state is kept.
    pub fn stop_polling(&self) {
        let mut slot = self.lock_poller();
        self.stop_locked(&mut slot);
    }

    /// Stops polling and waits for the worker (and any in-flight cycle) to finish.
    pub async fn shutdown(&self) {
        let handle = {
            let mut slot = self.lock_poller();
            slot.leases = 0;
            self.stop_locked(&mut slot)
        };
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "health poller task failed");
        }
    }

    /// Starts polling (if needed) for as long as the returned lease is alive.
    /// Polling stops when the last outstanding lease is dropped.
    pub fn lease(self: &Arc<Self>) -> PollingLease {
        let mut slot = self.lock_poller();
        slot.leases += 1;
        self.start_locked(&mut slot);
        PollingLease {
            store: Arc::clone(self),
        }
    }

    /// Runs exactly one cycle now, independent of the schedule, and returns the
    /// resulting state.
    pub async fn manual_refresh(&self) -> HealthState {
        self.run_cycle(CycleTrigger::Manual).await;
        self.state()
    }

    pub fn dismiss_banner(&self) {
        self.mutate(|state| state.banner.take().is_some());
    }

    /// Single state-update entry point shared by live and fallback cycles.
    pub fn ingest(&self, payload: NormalizedHealthPayload, source: UpdateSource) {
        let capacity = self.config.history_capacity;
        self.mutate(move |state| {
            // Read under the state lock: a concurrent stop either already cleared the
            // flag or writes `Idle` after this ingest.
            let polling = self.polling.load(Ordering::Acquire);
            let NormalizedHealthPayload {
                timestamp,
                overall_status,
                groups,
                snapshot,
            } = payload;

            state.groups = groups;
            state.overall_status = overall_status;
            state.snapshot_history.push_front(snapshot);
            state.snapshot_history.truncate(capacity);
            state.banner = next_banner(state.banner.take(), overall_status, &timestamp);

            match source {
                UpdateSource::Live => {
                    state.last_successful_fetch = Some(timestamp.clone());
                    state.last_error = None;
                    state.polling_status = if polling {
                        PollingStatus::Running
                    } else {
                        PollingStatus::Idle
                    };
                }
                UpdateSource::Fallback { error } => {
                    state.last_error = Some(error);
                    state.polling_status = PollingStatus::Error;
                }
            }
            state.last_updated = Some(timestamp);
            true
        });
    }

    async fn run_cycle(&self, trigger: CycleTrigger) {
        let cycle = self.cycles_total.fetch_add(1, Ordering::Relaxed) + 1;
        match self.probe.check_health().await {
            Ok(response) => {
                let payload = normalizer::extract_payload(response);
                let normalized = normalizer::normalize(Some(&payload));
                debug!(
                    operation = "health_cycle",
                    trigger = trigger.as_str(),
                    cycle,
                    overall = %normalized.overall_status,
                    groups = normalized.groups.len(),
                    "live health payload ingested"
                );
                self.ingest(normalized, UpdateSource::Live);
            }
            Err(e) => {
                warn!(
                    operation = "health_cycle",
                    trigger = trigger.as_str(),
                    cycle,
                    error = %e,
                    "health probe failed; using fallback payload"
                );
                let seed = self.fallback_seed();
                let raw = fallback::generate_random_fallback(Some(&seed));
                let normalized = normalizer::normalize(Some(&raw));
                self.ingest(
                    normalized,
                    UpdateSource::Fallback {
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    /// Current group ids in payload shape, so groups seen in earlier cycles keep
    /// appearing while the probe is down.
    fn fallback_seed(&self) -> RawPayload {
        let state = self.read_state();
        let groups: Map<String, Value> = state
            .groups
            .keys()
            .map(|id| (id.clone(), json!({})))
            .collect();
        json!({ "groups": groups })
    }

    fn start_locked(self: &Arc<Self>, slot: &mut PollerSlot) {
        if slot.active.is_some() {
            debug!("health polling already running");
            return;
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.polling.store(true, Ordering::Release);
        self.mutate(|state| {
            let changed = state.polling_status != PollingStatus::Running;
            state.polling_status = PollingStatus::Running;
            changed
        });
        let handle = spawn_poller(Arc::clone(self), shutdown_rx);
        slot.active = Some(Poller {
            shutdown_tx,
            handle,
        });
        info!(
            interval_secs = self.config.interval.as_secs(),
            "health polling started"
        );
    }

    fn stop_locked(&self, slot: &mut PollerSlot) -> Option<JoinHandle<()>> {
        let poller = slot.active.take();
        self.polling.store(false, Ordering::Release);
        self.mutate(|state| {
            let changed = state.polling_status != PollingStatus::Idle;
            state.polling_status = PollingStatus::Idle;
            changed
        });
        let Poller {
            shutdown_tx,
            handle,
        } = poller?;
        // The worker may already be gone; nothing to signal then.
        let _ = shutdown_tx.send(());
        info!("health polling stopped");
        Some(handle)
    }

    fn release_lease(&self) {
        let mut slot = self.lock_poller();
        slot.leases = slot.leases.saturating_sub(1);
        if slot.leases == 0 {
            self.stop_locked(&mut slot);
        }
    }

    /// Applies `f` under the write lock and publishes the result when `f` reports a change.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut HealthState) -> bool,
    {
        let published = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            f(&mut state).then(|| state.clone())
        };
        if let Some(state) = published
            && self.tx.send(state).is_err()
        {
            debug!(
                operation = "publish_state",
                "no health subscribers; state update not broadcast"
            );
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, HealthState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_poller(&self) -> MutexGuard<'_, PollerSlot> {
        self.poller.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps polling alive while held. See [`HealthStore::lease`].
pub struct PollingLease {
    store: Arc<HealthStore>,
}

impl PollingLease {
    pub fn store(&self) -> &Arc<HealthStore> {
        &self.store
    }
}

impl Drop for PollingLease {
    fn drop(&mut self) {
        self.store.release_lease();
    }
}

/// Recomputes the banner from this cycle's overall status. Severity follows the
/// latest cycle outright; an unchanged level keeps the original banner (and its
/// timestamp). `Unknown` carries no signal and leaves the banner as it was.
fn next_banner(current: Option<Banner>, overall: HealthStatus, timestamp: &str) -> Option<Banner> {
    let (level, message) = match overall {
        HealthStatus::Down => (BannerLevel::Error, BANNER_DOWN_MESSAGE),
        HealthStatus::Degraded => (BannerLevel::Warning, BANNER_DEGRADED_MESSAGE),
        HealthStatus::Healthy => return None,
        HealthStatus::Unknown => return current,
    };
    match current {
        Some(banner) if banner.level == level => Some(banner),
        _ => Some(Banner {
            level,
            message: message.to_string(),
            timestamp: timestamp.to_string(),
        }),
    }
}

fn spawn_poller(store: Arc<HealthStore>, mut shutdown_rx: oneshot::Receiver<()>) -> JoinHandle<()> {
    let period = store.config.interval;
    tokio::spawn(async move {
        // First tick completes immediately: one cycle right away, then every `period`.
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => {
                    debug!("health poller shutting down");
                    break;
                }
                _ = tick.tick() => {
                    store.run_cycle(CycleTrigger::Scheduled).await;
                }
            }
        }
    })
}
