//! Verb-based impact classifier for API operation names.
//!
//! Operation names are PascalCase verb phrases (`GetResourceShares`,
//! `DeleteResponsePlan`). The leading verb decides how destructive the call
//! is. Conservative default: an unknown verb is treated as a write.

use super::Impact;

/// Read verbs: no confirmation ever needed.
const READ_VERBS: &[&str] = &["get", "list", "describe", "search", "batchget"];

/// Verbs that destroy or detach state. These confirm at the highest level.
const HIGH_VERBS: &[&str] = &[
    "delete",
    "disassociate",
    "reject",
    "untag",
    "remove",
    "terminate",
    "deregister",
];

/// Split a PascalCase identifier into its words.
///
/// Acronym runs stay together: `ListRAMShares` → `["List", "RAM", "Shares"]`.
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `GetResourceShares` → `get-resource-shares` (the `aws` CLI operation name).
pub fn kebab_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `ResourceShareArn` → `resourceShareArn` (request member naming).
pub fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classify an API operation name by its leading verb.
///
/// `BatchGet*` counts as a single read verb; any other `Batch*` prefix is
/// skipped so the following verb decides.
pub fn classify_operation(operation: &str) -> Impact {
    let words: Vec<String> = split_words(operation)
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect();

    let verb = match words.as_slice() {
        [first, second, ..] if first == "batch" => {
            if second == "get" {
                "batchget".to_string()
            } else {
                second.clone()
            }
        }
        [first, ..] => first.clone(),
        [] => return Impact::Medium,
    };

    if READ_VERBS.contains(&verb.as_str()) {
        return Impact::None;
    }
    if HIGH_VERBS.contains(&verb.as_str()) {
        return Impact::High;
    }

    // Everything else writes (create, update, put, start, tag, accept, ...)
    Impact::Medium
}
