// Default group registry: the subsystems every health payload must describe.

/// A registered subsystem and its display key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDefinition {
    pub id: &'static str,
    pub label: &'static str,
}

/// Always present in normalized output, in this order.
pub const DEFAULT_GROUPS: &[GroupDefinition] = &[
    GroupDefinition {
        id: "transactions",
        label: "health.groups.transactions",
    },
    GroupDefinition {
        id: "merchants",
        label: "health.groups.merchants",
    },
    GroupDefinition {
        id: "common-codes",
        label: "health.groups.commonCodes",
    },
    GroupDefinition {
        id: "proxy",
        label: "health.groups.proxy",
    },
];

pub fn is_registered(id: &str) -> bool {
    DEFAULT_GROUPS.iter().any(|g| g.id == id)
}

/// Best-effort label for a subsystem outside the registry, e.g.
/// `"payment_links"` -> `"Payment Links"`. Falls back to the raw id when it
/// has no word characters.
pub fn derive_label(id: &str) -> String {
    let words: Vec<String> = id
        .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        id.to_string()
    } else {
        words.join(" ")
    }
}
