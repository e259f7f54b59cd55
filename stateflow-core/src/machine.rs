//! State machine engine - guarded transitions, timeouts, history, events.

use crate::error::FsmError;
use crate::event::{Event, EventKind, TransitionRecord, TRIGGER_MANUAL, TRIGGER_TIMEOUT};
use crate::grammar::Config;
use crate::hooks::{Hooks, StateHooks};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

/// Host record contract: one string field designated for state tracking.
///
/// The record's own field stays authoritative. The machine never keeps a
/// private copy of the current state; every read and write goes through
/// this trait.
pub trait StateRecord {
    /// Returns the current state, or `""` when unset.
    fn state(&self) -> &str;

    /// Overwrites the state field.
    fn set_state(&mut self, state: String);
}

/// Read-only snapshot of a machine's shape.
///
/// Keys, destination lists, and wildcard targets are sorted so textual
/// renderings built from a snapshot are reproducible across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStructure {
    /// Declared initial state, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,

    /// Source state to sorted destinations.
    pub transitions: BTreeMap<String, Vec<String>>,

    /// Sorted wildcard destinations.
    pub wildcards: Vec<String>,
}

/// Observer callback. Receives the machine alongside each event.
pub type Listener<R> = Arc<dyn Fn(&Machine<R>, &Event) + Send + Sync>;

/// Mutable interior guarded by the machine's lock: the host record (and
/// with it the state field), the history log, and the commit timestamp
/// used for timeout polling.
struct Inner<R> {
    record: R,
    history: Vec<TransitionRecord>,
    last_entry: Instant,
}

/// A state machine bound to one host record.
///
/// All operations take `&self`; a machine shared behind an [`Arc`] may be
/// driven from several threads. One reader/writer lock guards the record
/// and the history: reads (`current_state`, `history`, the permission
/// check, `with_record`) take the shared lock, the transition commit takes
/// the exclusive lock. Guard, enter, and exit hooks as well as listener
/// callbacks run synchronously on the calling thread with no lock held;
/// a callback may read the machine, but must not start another transition
/// on the same machine.
///
/// Timeout delivery is pull-based only: nothing fires until
/// [`check_timeouts`](Machine::check_timeouts) is called.
pub struct Machine<R: StateRecord> {
    config: Config,
    hooks: HashMap<String, StateHooks>,
    inner: RwLock<Inner<R>>,
    listeners: RwLock<Vec<Listener<R>>>,
}

impl<R: StateRecord> Machine<R> {
    /// Parses `grammar` and constructs a machine over `record`.
    pub fn new(record: R, grammar: &str, hooks: Hooks) -> Result<Self, FsmError> {
        let config = Config::parse(grammar)?;
        Self::with_config(record, config, hooks)
    }

    /// Constructs a machine over `record` from an already-built
    /// configuration.
    ///
    /// If the record's state field is empty it is set to the configured
    /// initial state. Fails when the configuration declares no initial
    /// state for an empty record, when the record holds a state the
    /// configuration never mentions, or when a hook is registered for an
    /// unknown state.
    pub fn with_config(mut record: R, config: Config, hooks: Hooks) -> Result<Self, FsmError> {
        let known = config.known_states();

        for state in hooks.states() {
            if !known.contains(state) {
                return Err(FsmError::UnknownHookState {
                    state: state.to_string(),
                });
            }
        }

        if record.state().is_empty() {
            match &config.initial {
                Some(initial) => record.set_state(initial.clone()),
                None => return Err(FsmError::NoInitialState),
            }
        } else if !known.contains(record.state()) {
            return Err(FsmError::UnknownState {
                state: record.state().to_string(),
            });
        }

        Ok(Self {
            config,
            hooks: hooks.into_map(),
            inner: RwLock::new(Inner {
                record,
                history: Vec::new(),
                last_entry: Instant::now(),
            }),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Returns a snapshot of the current state.
    pub fn current_state(&self) -> String {
        self.inner.read().record.state().to_string()
    }

    /// Returns the parsed configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks whether a transition to `target` would be permitted right
    /// now, without mutating anything.
    ///
    /// Combines the pure permission check (declared edge or wildcard) with
    /// the target state's guard, if one is registered. The error
    /// distinguishes an undeclared edge from a guard veto, whose reason is
    /// propagated verbatim.
    pub fn can_transition(&self, target: &str) -> Result<(), FsmError> {
        let current = self.current_state();
        self.check_allowed(&current, target)?;
        self.check_guard(target)
    }

    /// Transitions to `target` with the `"manual"` trigger label.
    pub fn transition(&self, target: &str) -> Result<(), FsmError> {
        self.transition_with(target, TRIGGER_MANUAL, None)
    }

    /// Transitions to `target`, recording `trigger` and optional
    /// `metadata` on the history entry.
    ///
    /// Protocol: validate permission and guard; emit `BeforeTransition`;
    /// run the source state's exit hook and emit `ExitState`; commit the
    /// state write, the history append, and the timeout clock reset
    /// atomically under the exclusive lock; run the target state's enter
    /// hook and emit `EnterState`; emit `AfterTransition`. A failed
    /// validation returns before any event or hook fires. If another
    /// transition commits between validation and commit, this attempt is
    /// abandoned with [`FsmError::StateConflict`] and mutates nothing.
    pub fn transition_with(
        &self,
        target: &str,
        trigger: &str,
        metadata: Option<Value>,
    ) -> Result<(), FsmError> {
        let from = self.current_state();
        self.check_allowed(&from, target)?;
        self.check_guard(target)?;

        self.emit(EventKind::BeforeTransition, &from, target);

        if !from.is_empty() {
            if let Some(hooks) = self.hooks.get(&from) {
                if let Some(on_exit) = &hooks.on_exit {
                    on_exit();
                }
            }
            self.emit(EventKind::ExitState, &from, target);
        }

        {
            let mut inner = self.inner.write();
            if inner.record.state() != from {
                return Err(FsmError::StateConflict {
                    expected: from,
                    actual: inner.record.state().to_string(),
                });
            }
            inner.record.set_state(target.to_string());
            inner.last_entry = Instant::now();
            inner.history.push(TransitionRecord {
                from: from.clone(),
                to: target.to_string(),
                timestamp: Utc::now(),
                trigger: trigger.to_string(),
                metadata,
            });
        }

        tracing::debug!("transition committed: '{}' -> '{}' ({})", from, target, trigger);

        if let Some(hooks) = self.hooks.get(target) {
            if let Some(on_enter) = &hooks.on_enter {
                on_enter();
            }
        }
        self.emit(EventKind::EnterState, &from, target);
        self.emit(EventKind::AfterTransition, &from, target);

        Ok(())
    }

    /// Polls the current state's timeout rule.
    ///
    /// If a rule is configured for the current state and its duration has
    /// elapsed since the last commit, fires the automatic transition with
    /// the `"timeout"` trigger and returns `Ok(true)`. Returns `Ok(false)`
    /// when nothing is due. Errors from the fired transition (an edge the
    /// transition table no longer permits, or a guard veto) propagate.
    pub fn check_timeouts(&self) -> Result<bool, FsmError> {
        let (current, elapsed) = {
            let inner = self.inner.read();
            (inner.record.state().to_string(), inner.last_entry.elapsed())
        };

        let rule = match self.config.timeouts.get(&current) {
            Some(rule) if elapsed > rule.after => rule,
            _ => return Ok(false),
        };

        tracing::debug!("timeout elapsed in '{}', firing transition to '{}'", current, rule.to);
        self.transition_with(&rule.to, TRIGGER_TIMEOUT, None)?;
        Ok(true)
    }

    /// Returns a copy of the transition history, oldest first.
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.inner.read().history.clone()
    }

    /// Appends a listener to the observer registry.
    ///
    /// Listeners are invoked synchronously, in registration order, for
    /// every emitted event. The registry is append-only; there is no
    /// unsubscribe.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Machine<R>, &Event) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Exports the machine's shape for external renderers, with
    /// deterministic sorted ordering.
    pub fn structure(&self) -> MachineStructure {
        let mut transitions = self.config.transitions.clone();
        for dsts in transitions.values_mut() {
            dsts.sort_unstable();
        }
        let mut wildcards = self.config.wildcards.clone();
        wildcards.sort_unstable();
        MachineStructure {
            initial: self.config.initial.clone(),
            transitions,
            wildcards,
        }
    }

    /// Runs `f` with shared access to the host record.
    pub fn with_record<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.inner.read().record)
    }

    /// Consumes the machine, returning the host record.
    pub fn into_record(self) -> R {
        self.inner.into_inner().record
    }

    fn check_allowed(&self, from: &str, to: &str) -> Result<(), FsmError> {
        if self.config.allows(from, to) {
            Ok(())
        } else {
            Err(FsmError::TransitionNotAllowed {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn check_guard(&self, target: &str) -> Result<(), FsmError> {
        if let Some(hooks) = self.hooks.get(target) {
            if let Some(guard) = &hooks.guard {
                if let Err(reason) = guard() {
                    return Err(FsmError::GuardRejected { reason });
                }
            }
        }
        Ok(())
    }

    fn emit(&self, kind: EventKind, from: &str, to: &str) {
        let listeners = self.listeners.read().clone();
        if listeners.is_empty() {
            return;
        }

        let event = Event {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
        };
        for listener in &listeners {
            listener(self, &event);
        }
    }
}
