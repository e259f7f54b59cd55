//! Per-state lifecycle hooks.
//!
//! Hooks are registered explicitly on a [`Hooks`] registry and handed to
//! the machine constructor, which resolves them once against the set of
//! states the configuration mentions. Every hook is optional, and the
//! binding is fixed for the machine's lifetime; there is no way to add or
//! replace hooks after construction.

use std::collections::HashMap;

/// Guard callback invoked before entering a state. Returning `Err` vetoes
/// the transition; the message is propagated to the caller verbatim.
pub type GuardFn = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Enter/exit callback.
pub type ActionFn = Box<dyn Fn() + Send + Sync>;

/// Hook bundle for a single state.
#[derive(Default)]
pub struct StateHooks {
    pub(crate) guard: Option<GuardFn>,
    pub(crate) on_enter: Option<ActionFn>,
    pub(crate) on_exit: Option<ActionFn>,
}

/// Registry mapping state names to their optional hook bundles.
///
/// Built with the chaining methods, then consumed by
/// [`Machine::new`](crate::machine::Machine::new) or
/// [`Machine::with_config`](crate::machine::Machine::with_config).
#[derive(Default)]
pub struct Hooks {
    by_state: HashMap<String, StateHooks>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a guard for `state`.
    pub fn guard<F>(mut self, state: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.by_state.entry(state.into()).or_default().guard = Some(Box::new(f));
        self
    }

    /// Registers an enter callback for `state`.
    pub fn on_enter<F>(mut self, state: impl Into<String>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.by_state.entry(state.into()).or_default().on_enter = Some(Box::new(f));
        self
    }

    /// Registers an exit callback for `state`.
    pub fn on_exit<F>(mut self, state: impl Into<String>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.by_state.entry(state.into()).or_default().on_exit = Some(Box::new(f));
        self
    }

    pub(crate) fn states(&self) -> impl Iterator<Item = &str> {
        self.by_state.keys().map(String::as_str)
    }

    pub(crate) fn into_map(self) -> HashMap<String, StateHooks> {
        self.by_state
    }
}
