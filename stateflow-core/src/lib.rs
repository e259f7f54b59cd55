//! # stateflow-core
//!
//! Grammar-driven state machine runtime for host records.
//!
//! This crate provides:
//! - Declarative transition grammar parsing
//! - Guarded transition execution with enter/exit hooks
//! - Poll-based timeout auto-transitions
//! - Append-only transition history and synchronous lifecycle events
//!
//! ```
//! use stateflow_core::{Hooks, Machine, StateRecord};
//!
//! struct Order {
//!     status: String,
//! }
//!
//! impl StateRecord for Order {
//!     fn state(&self) -> &str {
//!         &self.status
//!     }
//!
//!     fn set_state(&mut self, state: String) {
//!         self.status = state;
//!     }
//! }
//!
//! let order = Order { status: String::new() };
//! let machine = Machine::new(
//!     order,
//!     "initial:draft; draft->pending; pending->paid; *->cancelled",
//!     Hooks::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(machine.current_state(), "draft");
//! machine.transition("pending").unwrap();
//! assert!(machine.transition("draft").is_err());
//! ```

pub mod error;
pub mod event;
pub mod grammar;
pub mod hooks;
pub mod machine;

pub use error::FsmError;
pub use event::{Event, EventKind, TransitionRecord, TRIGGER_MANUAL, TRIGGER_TIMEOUT};
pub use grammar::{Config, TimeoutRule};
pub use hooks::Hooks;
pub use machine::{Listener, Machine, MachineStructure, StateRecord};
