//! Core error types.

use thiserror::Error;

/// Errors from the state machine runtime.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("syntax error in clause '{clause}': {reason}")]
    Syntax { clause: String, reason: String },

    #[error("hook registered for unknown state '{state}'")]
    UnknownHookState { state: String },

    #[error("record holds no state and the configuration declares no initial state")]
    NoInitialState,

    #[error("record holds unknown state '{state}'")]
    UnknownState { state: String },

    #[error("transition from '{from}' to '{to}' not allowed")]
    TransitionNotAllowed { from: String, to: String },

    #[error("guard rejected transition: {reason}")]
    GuardRejected { reason: String },

    #[error("state conflict: expected '{expected}', actual '{actual}'")]
    StateConflict { expected: String, actual: String },
}

impl FsmError {
    /// Returns whether this error is an expected runtime condition to
    /// branch on, as opposed to a configuration defect that is fatal for
    /// the host record.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FsmError::TransitionNotAllowed { .. }
                | FsmError::GuardRejected { .. }
                | FsmError::StateConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let err = FsmError::TransitionNotAllowed {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert!(err.is_recoverable());

        let err = FsmError::GuardRejected {
            reason: "not ready".to_string(),
        };
        assert!(err.is_recoverable());

        let err = FsmError::Syntax {
            clause: "a-b".to_string(),
            reason: "expected 'SRC->DST'".to_string(),
        };
        assert!(!err.is_recoverable());

        assert!(!FsmError::NoInitialState.is_recoverable());
    }

    #[test]
    fn test_guard_reason_is_verbatim() {
        let err = FsmError::GuardRejected {
            reason: "payment method missing".to_string(),
        };
        assert!(err.to_string().ends_with("payment method missing"));
    }
}
