//! Declarative transition grammar.
//!
//! Machines are configured with a compact clause grammar:
//!
//! ```text
//! initial:draft; draft->pending; pending->paid [15m]; *->cancelled
//! ```
//!
//! Clauses are separated by `;` and surrounding whitespace is ignored.
//! Three clause forms exist:
//!
//! - `initial:STATE` declares the state assigned to a record whose state
//!   field is empty at construction
//! - `SRC->DST` declares a transition edge
//! - `*->DST` declares a wildcard edge, reachable from every state
//!
//! An edge may carry a trailing `[DURATION]` suffix attaching a timeout
//! rule: once the machine has sat in `SRC` for the given duration, a poll
//! via [`Machine::check_timeouts`](crate::machine::Machine::check_timeouts)
//! moves it to `DST`. Durations are decimal-plus-unit literals with
//! composable units (`ns`, `us`, `ms`, `s`, `m`, `h`), e.g. `500ms` or
//! `1h30m`. At most one timeout rule may be declared per source state.

use crate::error::FsmError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// A timeout rule attached to a single edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutRule {
    /// Source state the rule applies to.
    pub from: String,

    /// Destination of the automatic transition.
    pub to: String,

    /// Dwell time in `from` before the transition becomes eligible.
    pub after: Duration,
}

/// Parsed machine configuration.
///
/// Immutable once built. Transition destinations are ordered lists and
/// duplicates are permitted; the edge set is a directed multigraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// State assigned to a record whose state field is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,

    /// Source state to reachable destinations.
    pub transitions: BTreeMap<String, Vec<String>>,

    /// Destinations reachable from any source state.
    pub wildcards: Vec<String>,

    /// Timeout rules indexed by source state, at most one per source.
    pub timeouts: BTreeMap<String, TimeoutRule>,
}

impl Config {
    /// Parses a grammar string into a configuration.
    ///
    /// Fails on the first offending clause; no partially populated
    /// configuration is ever returned.
    pub fn parse(grammar: &str) -> Result<Self, FsmError> {
        let mut cfg = Config::default();

        for raw in grammar.split(';') {
            let clause = raw.trim();
            if clause.is_empty() {
                continue;
            }

            if let Some(rest) = clause.strip_prefix("initial:") {
                let state = rest.trim();
                validate_state_name(clause, state)?;
                // Repeated initial clauses are not an error; last one wins.
                cfg.initial = Some(state.to_string());
                continue;
            }

            cfg.parse_edge(clause)?;
        }

        Ok(cfg)
    }

    fn parse_edge(&mut self, clause: &str) -> Result<(), FsmError> {
        let (edge, after) = split_timeout_suffix(clause)?;

        let (src, dst) = match edge.split_once("->") {
            Some(parts) => parts,
            None => {
                return Err(FsmError::Syntax {
                    clause: clause.to_string(),
                    reason: "expected 'SRC->DST'".to_string(),
                })
            }
        };

        let src = src.trim();
        let dst = dst.trim();
        validate_state_name(clause, dst)?;

        if src == "*" {
            if after.is_some() {
                return Err(FsmError::Syntax {
                    clause: clause.to_string(),
                    reason: "timeout not allowed on wildcard edge".to_string(),
                });
            }
            self.wildcards.push(dst.to_string());
            return Ok(());
        }

        validate_state_name(clause, src)?;
        self.transitions
            .entry(src.to_string())
            .or_default()
            .push(dst.to_string());

        if let Some(after) = after {
            if self.timeouts.contains_key(src) {
                return Err(FsmError::Syntax {
                    clause: clause.to_string(),
                    reason: format!("duplicate timeout rule for state '{}'", src),
                });
            }
            self.timeouts.insert(
                src.to_string(),
                TimeoutRule {
                    from: src.to_string(),
                    to: dst.to_string(),
                    after,
                },
            );
        }

        Ok(())
    }

    /// Returns every state the configuration mentions: the initial state,
    /// edge sources and destinations, wildcard targets, and states implied
    /// by timeout rules.
    pub fn known_states(&self) -> BTreeSet<String> {
        let mut states = BTreeSet::new();
        if let Some(initial) = &self.initial {
            states.insert(initial.clone());
        }
        for (src, dsts) in &self.transitions {
            states.insert(src.clone());
            for dst in dsts {
                states.insert(dst.clone());
            }
        }
        for dst in &self.wildcards {
            states.insert(dst.clone());
        }
        for rule in self.timeouts.values() {
            states.insert(rule.from.clone());
            states.insert(rule.to.clone());
        }
        states
    }

    /// Pure permission check: a transition from `from` to `to` is permitted
    /// iff `to` is a wildcard target or a declared destination of `from`.
    /// Independent of guard hooks and free of side effects.
    pub fn allows(&self, from: &str, to: &str) -> bool {
        if self.wildcards.iter().any(|w| w == to) {
            return true;
        }
        match self.transitions.get(from) {
            Some(dsts) => dsts.iter().any(|d| d == to),
            None => false,
        }
    }
}

/// Splits a trailing `[DURATION]` suffix off an edge clause.
fn split_timeout_suffix(clause: &str) -> Result<(&str, Option<Duration>), FsmError> {
    let start = match clause.find('[') {
        Some(pos) => pos,
        None => return Ok((clause, None)),
    };

    let trimmed = clause.trim_end();
    if !trimmed.ends_with(']') {
        return Err(FsmError::Syntax {
            clause: clause.to_string(),
            reason: "unterminated timeout suffix".to_string(),
        });
    }

    let inner = trimmed[start + 1..trimmed.len() - 1].trim();
    let after = match humantime::parse_duration(inner) {
        Ok(after) => after,
        Err(err) => {
            return Err(FsmError::Syntax {
                clause: clause.to_string(),
                reason: format!("invalid timeout duration '{}': {}", inner, err),
            })
        }
    };

    Ok((clause[..start].trim_end(), Some(after)))
}

fn validate_state_name(clause: &str, name: &str) -> Result<(), FsmError> {
    if name.is_empty() {
        return Err(FsmError::Syntax {
            clause: clause.to_string(),
            reason: "empty state name".to_string(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FsmError::Syntax {
            clause: clause.to_string(),
            reason: format!("invalid state name '{}'", name),
        });
    }
    Ok(())
}
