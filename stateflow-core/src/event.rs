//! Event and history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trigger label recorded for caller-driven transitions.
pub const TRIGGER_MANUAL: &str = "manual";

/// Trigger label recorded for transitions fired by timeout polling.
pub const TRIGGER_TIMEOUT: &str = "timeout";

/// Lifecycle event kinds emitted during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Emitted after validation, before any hook runs.
    BeforeTransition,
    /// Emitted last, once the transition is fully applied.
    AfterTransition,
    /// Emitted after the target state's enter hook.
    EnterState,
    /// Emitted after the source state's exit hook.
    ExitState,
}

/// A lifecycle event delivered synchronously to listeners.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Which point of the transition protocol this event marks.
    pub kind: EventKind,

    /// State being left.
    pub from: String,

    /// State being entered.
    pub to: String,

    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

/// One committed transition in a machine's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the commit.
    pub from: String,

    /// State after the commit.
    pub to: String,

    /// Commit time.
    pub timestamp: DateTime<Utc>,

    /// What caused the transition: [`TRIGGER_MANUAL`], [`TRIGGER_TIMEOUT`],
    /// or a caller-supplied label.
    pub trigger: String,

    /// Caller-supplied annotation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serialization_skips_empty_metadata() {
        let record = TransitionRecord {
            from: "draft".to_string(),
            to: "pending".to_string(),
            timestamp: Utc::now(),
            trigger: TRIGGER_MANUAL.to_string(),
            metadata: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("metadata").is_none());
        assert_eq!(json["trigger"], "manual");
    }

    #[test]
    fn test_record_roundtrip_with_metadata() {
        let record = TransitionRecord {
            from: "pending".to_string(),
            to: "paid".to_string(),
            timestamp: Utc::now(),
            trigger: "webhook".to_string(),
            metadata: Some(json!({"amount": 100})),
        };

        let json = serde_json::to_string(&record).unwrap();
        let decoded: TransitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.to, "paid");
        assert_eq!(decoded.metadata, Some(json!({"amount": 100})));
    }
}
