//! Topic pattern matching.
//!
//! A topic is a `/`-separated path (`preview/frame`, `device/laser_488/properties`).
//! Routing matches a concrete topic against: itself (exact), every proper
//! prefix from longest to shortest, and the literal wildcard `*`.

/// Returns the patterns that match `topic`, in dispatch order: the exact
/// topic first, then each proper prefix longest-to-shortest, then `*` last.
///
/// This does not consult a handler table — callers intersect this list with
/// whatever patterns are actually registered.
pub fn match_order(topic: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    patterns.push(topic.to_string());

    let segments: Vec<&str> = topic.split('/').collect();
    for len in (1..segments.len()).rev() {
        patterns.push(segments[..len].join("/"));
    }

    patterns.push("*".to_string());
    patterns
}

/// `true` if `prefix` is a proper prefix of `topic` when both are split on `/`.
pub fn is_proper_prefix(prefix: &str, topic: &str) -> bool {
    if prefix == topic {
        return false;
    }
    let topic_segments: Vec<&str> = topic.split('/').collect();
    let prefix_segments: Vec<&str> = prefix.split('/').collect();
    prefix_segments.len() < topic_segments.len()
        && topic_segments[..prefix_segments.len()] == prefix_segments[..]
}
