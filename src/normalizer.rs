// Permissive mapping from an arbitrarily-shaped probe payload to the canonical model.
//
// The upstream schema is not fixed, so every loosely-named field is resolved through
// an ordered candidate-key list below; the first candidate holding a usable value wins.
// Nothing here fails: missing or malformed input degrades to defaults.

use serde_json::{Map, Value};

use crate::models::{
    HealthGroup, HealthSnapshot, HealthStatus, NormalizedHealthPayload, RawPayload,
    now_timestamp, timestamp_from_millis,
};
use crate::registry::{self, DEFAULT_GROUPS};

/// Payload-level timestamp.
pub const TIMESTAMP_KEYS: &[&str] = &["timestamp", "updatedAt"];
/// Where the per-group entries live (object keyed by id, or array of entries).
pub const GROUP_COLLECTION_KEYS: &[&str] = &["groups", "services"];
/// Group id when the collection is an array.
pub const GROUP_ID_KEYS: &[&str] = &["id", "name"];
pub const LABEL_KEYS: &[&str] = &["label", "displayName"];
pub const STATUS_KEYS: &[&str] = &["status", "state"];
pub const LATENCY_KEYS: &[&str] = &["latency", "latencyMs", "responseTime"];
pub const CHECKED_AT_KEYS: &[&str] = &["lastCheckedAt", "lastChecked", "checkedAt"];
pub const MESSAGE_KEYS: &[&str] = &["message", "details", "error"];
/// Response envelope unwrapped once before normalization.
pub const ENVELOPE_KEY: &str = "data";

/// Lowercased upstream vocabulary. Anything not listed maps to `Unknown`.
const STATUS_SYNONYMS: &[(&str, HealthStatus)] = &[
    ("healthy", HealthStatus::Healthy),
    ("ok", HealthStatus::Healthy),
    ("up", HealthStatus::Healthy),
    ("pass", HealthStatus::Healthy),
    ("passing", HealthStatus::Healthy),
    ("green", HealthStatus::Healthy),
    ("operational", HealthStatus::Healthy),
    ("online", HealthStatus::Healthy),
    ("degraded", HealthStatus::Degraded),
    ("warning", HealthStatus::Degraded),
    ("warn", HealthStatus::Degraded),
    ("slow", HealthStatus::Degraded),
    ("amber", HealthStatus::Degraded),
    ("yellow", HealthStatus::Degraded),
    ("partial", HealthStatus::Degraded),
    ("down", HealthStatus::Down),
    ("error", HealthStatus::Down),
    ("failed", HealthStatus::Down),
    ("fail", HealthStatus::Down),
    ("critical", HealthStatus::Down),
    ("red", HealthStatus::Down),
    ("offline", HealthStatus::Down),
    ("unhealthy", HealthStatus::Down),
    ("unknown", HealthStatus::Unknown),
];

/// Normalizes `raw` using the current time as the fallback timestamp.
pub fn normalize(raw: Option<&RawPayload>) -> NormalizedHealthPayload {
    normalize_at(raw, &now_timestamp())
}

/// Normalizes `raw`, using `now` when the payload carries no timestamp.
pub fn normalize_at(raw: Option<&RawPayload>, now: &str) -> NormalizedHealthPayload {
    let root = raw.and_then(Value::as_object);
    let timestamp = root
        .and_then(|r| first_timestamp(r, TIMESTAMP_KEYS))
        .unwrap_or_else(|| now.to_string());
    let entries = root.map(group_entries).unwrap_or_default();

    let mut ordered: Vec<HealthGroup> = Vec::with_capacity(DEFAULT_GROUPS.len() + entries.len());
    for def in DEFAULT_GROUPS {
        let entry = entries
            .iter()
            .find(|(id, _)| id == def.id)
            .map(|(_, value)| *value);
        ordered.push(normalize_group(def.id, def.label, entry, &timestamp));
    }
    // Extras sorted by id whatever the collection form; first entry wins on duplicates.
    let mut extras: Vec<&(String, &Value)> = entries
        .iter()
        .filter(|(id, _)| !registry::is_registered(id))
        .collect();
    extras.sort_by(|a, b| a.0.cmp(&b.0));
    extras.dedup_by(|a, b| a.0 == b.0);
    for (id, entry) in extras {
        let label = registry::derive_label(id);
        ordered.push(normalize_group(id, &label, Some(*entry), &timestamp));
    }

    let overall = overall_status(ordered.iter().map(|g| g.status));
    let groups = ordered.iter().map(|g| (g.id.clone(), g.clone())).collect();

    NormalizedHealthPayload {
        timestamp: timestamp.clone(),
        overall_status: overall,
        groups,
        snapshot: HealthSnapshot {
            timestamp,
            overall_status: overall,
            groups: ordered,
        },
    }
}

/// Worst-wins with explicit precedence: down, then degraded, then healthy.
/// An empty or all-unknown set is `Unknown`.
pub fn overall_status<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    let (mut any_degraded, mut any_healthy) = (false, false);
    for status in statuses {
        match status {
            HealthStatus::Down => return HealthStatus::Down,
            HealthStatus::Degraded => any_degraded = true,
            HealthStatus::Healthy => any_healthy = true,
            HealthStatus::Unknown => {}
        }
    }
    if any_degraded {
        HealthStatus::Degraded
    } else if any_healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unknown
    }
}

/// Maps an upstream status word (any case) to the canonical vocabulary.
pub fn parse_status(raw: &str) -> HealthStatus {
    let lowered = raw.trim().to_lowercase();
    STATUS_SYNONYMS
        .iter()
        .find(|(word, _)| *word == lowered)
        .map(|(_, status)| *status)
        .unwrap_or(HealthStatus::Unknown)
}

/// Unwraps one level of `{ "data": { ... } }` envelope. A payload that already
/// carries a group collection at the top level is returned unchanged.
pub fn extract_payload(response: RawPayload) -> RawPayload {
    match response {
        Value::Object(mut root)
            if !has_group_collection(&root)
                && root.get(ENVELOPE_KEY).is_some_and(Value::is_object) =>
        {
            root.remove(ENVELOPE_KEY).unwrap_or_default()
        }
        other => other,
    }
}

/// Group ids present in `raw`, in collection order. Used to seed fallback payloads.
pub fn group_ids(raw: &RawPayload) -> Vec<String> {
    raw.as_object()
        .map(group_entries)
        .unwrap_or_default()
        .into_iter()
        .map(|(id, _)| id)
        .collect()
}

fn has_group_collection(root: &Map<String, Value>) -> bool {
    first_present(root, GROUP_COLLECTION_KEYS).is_some()
}

fn group_entries(root: &Map<String, Value>) -> Vec<(String, &Value)> {
    match first_present(root, GROUP_COLLECTION_KEYS) {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(id, _)| !id.trim().is_empty())
            .map(|(id, value)| (id.clone(), value))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let id = first_string(item.as_object()?, GROUP_ID_KEYS)?;
                Some((id, item))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_group(
    id: &str,
    default_label: &str,
    entry: Option<&Value>,
    payload_timestamp: &str,
) -> HealthGroup {
    let fields = entry.and_then(Value::as_object);
    let status = match entry {
        // `"proxy": "ok"` is shorthand for the status alone.
        Some(Value::String(raw)) => parse_status(raw),
        _ => fields
            .and_then(|f| first_string(f, STATUS_KEYS))
            .map(|raw| parse_status(&raw))
            .unwrap_or_default(),
    };

    HealthGroup {
        id: id.to_string(),
        label: fields
            .and_then(|f| first_string(f, LABEL_KEYS))
            .unwrap_or_else(|| default_label.to_string()),
        status,
        latency_ms: fields
            .and_then(|f| first_present(f, LATENCY_KEYS))
            .and_then(parse_latency),
        last_checked_at: fields
            .and_then(|f| first_timestamp(f, CHECKED_AT_KEYS))
            .unwrap_or_else(|| payload_timestamp.to_string()),
        message: fields.and_then(|f| first_string(f, MESSAGE_KEYS)),
    }
}

/// First candidate whose value is present and not `null`.
fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
}

/// First candidate holding a non-blank string.
fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn first_timestamp(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(parse_timestamp))
}

/// ISO strings pass through; numbers are read as epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            timestamp_from_millis(ms)
        }
        _ => None,
    }
}

/// Negative, non-finite or non-numeric latency is treated as not measured.
fn parse_latency(value: &Value) -> Option<u64> {
    let ms = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    Some(ms.round() as u64)
}
