//! Pending mutation queue entries

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// HTTP-style verb a queued mutation is delivered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Post,
    Put,
    Patch,
    Delete,
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

/// Where a queued mutation goes: a resource locator plus a verb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Resource path relative to the remote base URL (e.g. `/api/v1/packages/42`)
    pub resource: String,
    /// Delivery verb
    pub verb: Verb,
}

impl Target {
    pub fn new(resource: impl Into<String>, verb: Verb) -> Self {
        Self {
            resource: resource.into(),
            verb,
        }
    }
}

/// One pending mutation in the durable queue
///
/// Items are opaque to the queue and the dispatcher: only the target and
/// payload matter for delivery. `attempts` counts failed delivery attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique ID assigned at enqueue time (used for idempotent removal)
    pub id: Ulid,
    /// Delivery destination
    pub target: Target,
    /// Opaque serialized body
    pub payload: serde_json::Value,
    /// Failed delivery attempts so far
    pub attempts: u32,
    /// Enqueue timestamp (Unix milliseconds)
    pub created_at_ms: u64,
}

impl QueueItem {
    /// Create a fresh item with a new ULID and zero attempts
    pub fn new(target: Target, payload: serde_json::Value) -> Self {
        Self {
            id: Ulid::new(),
            target,
            payload,
            attempts: 0,
            created_at_ms: crate::current_timestamp_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_items_get_unique_ids() {
        let target = Target::new("/api/v1/things", Verb::Post);
        let a = QueueItem::new(target.clone(), json!({"n": 1}));
        let b = QueueItem::new(target, json!({"n": 2}));

        assert_ne!(a.id, b.id);
        assert_eq!(a.attempts, 0);
        assert!(a.created_at_ms > 0);
    }

    #[test]
    fn test_verb_serializes_uppercase() {
        let s = serde_json::to_string(&Verb::Patch).unwrap();
        assert_eq!(s, "\"PATCH\"");
    }
}
