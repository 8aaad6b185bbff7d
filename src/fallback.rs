// Synthetic health payload used whenever the live probe fails.
// Output has the same shape as a live payload and goes through the same normalizer.

use rand::Rng;
use serde_json::{Map, Value, json};

use crate::models::{HealthStatus, RawPayload, now_timestamp};
use crate::normalizer;
use crate::registry::DEFAULT_GROUPS;

/// Discrete status distribution; weights sum to 1.0.
pub const STATUS_WEIGHTS: &[(HealthStatus, f64)] = &[
    (HealthStatus::Healthy, 0.60),
    (HealthStatus::Degraded, 0.25),
    (HealthStatus::Down, 0.10),
    (HealthStatus::Unknown, 0.05),
];

/// Inclusive latency range in ms for a sampled status; `None` = not measured.
pub fn latency_band(status: HealthStatus) -> Option<(u64, u64)> {
    match status {
        HealthStatus::Healthy => Some((120, 720)),
        HealthStatus::Degraded => Some((820, 1600)),
        HealthStatus::Down => Some((1800, 4200)),
        HealthStatus::Unknown => None,
    }
}

pub fn fallback_message(status: HealthStatus) -> Option<&'static str> {
    match status {
        HealthStatus::Healthy => None,
        HealthStatus::Degraded => Some("health.messages.degraded"),
        HealthStatus::Down => Some("health.messages.down"),
        HealthStatus::Unknown => Some("health.messages.unknown"),
    }
}

/// Random payload covering the default registry plus any group ids in `seed`.
pub fn generate_random_fallback(seed: Option<&RawPayload>) -> RawPayload {
    generate_fallback_with(&mut rand::thread_rng(), seed, &now_timestamp())
}

/// Same as [`generate_random_fallback`] with an explicit RNG and generation time.
/// Every group shares `timestamp` as its check time.
pub fn generate_fallback_with<R: Rng>(
    rng: &mut R,
    seed: Option<&RawPayload>,
    timestamp: &str,
) -> RawPayload {
    let mut ids: Vec<String> = DEFAULT_GROUPS.iter().map(|g| g.id.to_string()).collect();
    if let Some(seed) = seed {
        for id in normalizer::group_ids(seed) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    let mut groups = Map::with_capacity(ids.len());
    for id in ids {
        let status = sample_status(rng);
        let mut entry = Map::new();
        entry.insert("status".into(), json!(status.as_str()));
        if let Some(latency) = sample_latency(rng, status) {
            entry.insert("latencyMs".into(), json!(latency));
        }
        entry.insert("lastCheckedAt".into(), json!(timestamp));
        if let Some(message) = fallback_message(status) {
            entry.insert("message".into(), json!(message));
        }
        groups.insert(id, Value::Object(entry));
    }

    json!({
        "timestamp": timestamp,
        "groups": groups,
    })
}

/// Cumulative-sum sampling against one uniform draw in `[0, 1)`.
pub fn sample_status<R: Rng>(rng: &mut R) -> HealthStatus {
    let draw: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (status, weight) in STATUS_WEIGHTS {
        cumulative += weight;
        if draw < cumulative {
            return *status;
        }
    }
    // Rounding can leave the last bucket a hair short of 1.0.
    HealthStatus::Unknown
}

fn sample_latency<R: Rng>(rng: &mut R, status: HealthStatus) -> Option<u64> {
    latency_band(status).map(|(lo, hi)| rng.gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = STATUS_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sample_status_follows_distribution() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            let idx = match sample_status(&mut rng) {
                HealthStatus::Healthy => 0,
                HealthStatus::Degraded => 1,
                HealthStatus::Down => 2,
                HealthStatus::Unknown => 3,
            };
            counts[idx] += 1;
        }
        for (i, (_, weight)) in STATUS_WEIGHTS.iter().enumerate() {
            let observed = counts[i] as f64 / n as f64;
            assert!(
                (observed - weight).abs() < 0.02,
                "bucket {i}: observed {observed}, expected {weight}"
            );
        }
    }

    #[test]
    fn sampled_latency_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(11);
        for status in [
            HealthStatus::Healthy,
            HealthStatus::Degraded,
            HealthStatus::Down,
        ] {
            let (lo, hi) = latency_band(status).unwrap();
            for _ in 0..500 {
                let latency = sample_latency(&mut rng, status).unwrap();
                assert!((lo..=hi).contains(&latency), "{status}: {latency}");
            }
        }
        assert_eq!(sample_latency(&mut rng, HealthStatus::Unknown), None);
    }

    #[test]
    fn healthy_has_no_message() {
        assert_eq!(fallback_message(HealthStatus::Healthy), None);
        assert!(fallback_message(HealthStatus::Down).is_some());
    }
}
