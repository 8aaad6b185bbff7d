// Fallback generator tests: shape, seeding, and compatibility with the normalizer

mod common;

use gateway_health::fallback::{
    fallback_message, generate_fallback_with, generate_random_fallback, latency_band,
};
use gateway_health::models::HealthStatus;
use gateway_health::normalizer::{normalize, normalize_at};
use gateway_health::registry::DEFAULT_GROUPS;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

const TS: &str = "2024-06-01T12:00:00.000Z";

#[test]
fn fallback_covers_default_registry() {
    let mut rng = StdRng::seed_from_u64(1);
    let raw = generate_fallback_with(&mut rng, None, TS);
    let groups = raw["groups"].as_object().unwrap();
    assert_eq!(groups.len(), DEFAULT_GROUPS.len());
    for def in DEFAULT_GROUPS {
        assert!(groups.contains_key(def.id), "{} missing", def.id);
    }
    assert_eq!(raw["timestamp"], json!(TS));
}

#[test]
fn fallback_includes_seed_ids_once() {
    let mut rng = StdRng::seed_from_u64(2);
    let seed = common::payload(&[("proxy", "ok"), ("ledger", "ok")]);
    let raw = generate_fallback_with(&mut rng, Some(&seed), TS);
    let groups = raw["groups"].as_object().unwrap();
    assert_eq!(groups.len(), DEFAULT_GROUPS.len() + 1);
    assert!(groups.contains_key("ledger"));
}

#[test]
fn fallback_groups_are_consistent_with_their_status() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let raw = generate_fallback_with(&mut rng, None, TS);
        let normalized = normalize_at(Some(&raw), "unused");
        assert_eq!(normalized.timestamp, TS);
        for group in normalized.groups.values() {
            assert_eq!(group.last_checked_at, TS);
            match latency_band(group.status) {
                Some((lo, hi)) => {
                    let latency = group.latency_ms.expect("latency for measured status");
                    assert!((lo..=hi).contains(&latency));
                }
                None => assert_eq!(group.latency_ms, None),
            }
            assert_eq!(group.message.as_deref(), fallback_message(group.status));
        }
    }
}

#[test]
fn fallback_never_marks_groups_missing() {
    // Every sampled status is one of the four; the normalizer must not see a
    // default group as absent.
    let mut rng = StdRng::seed_from_u64(4);
    let raw = generate_fallback_with(&mut rng, None, TS);
    for (_, entry) in raw["groups"].as_object().unwrap() {
        assert!(entry.get("status").and_then(|s| s.as_str()).is_some());
    }
}

#[test]
fn random_fallback_normalizes_to_full_group_set() {
    let raw = generate_random_fallback(None);
    let normalized = normalize(Some(&raw));
    assert_eq!(normalized.groups.len(), DEFAULT_GROUPS.len());
    assert!(
        normalized
            .snapshot
            .groups
            .iter()
            .all(|g| g.last_checked_at == normalized.timestamp)
    );
}

#[test]
fn unknown_is_sampled_without_latency() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut saw_unknown = false;
    for _ in 0..500 {
        let raw = generate_fallback_with(&mut rng, None, TS);
        for group in normalize_at(Some(&raw), TS).groups.values() {
            if group.status == HealthStatus::Unknown {
                saw_unknown = true;
                assert_eq!(group.latency_ms, None);
            }
        }
    }
    assert!(saw_unknown, "unknown has 5% weight; 2000 draws should hit it");
}
