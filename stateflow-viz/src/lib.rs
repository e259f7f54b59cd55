//! # stateflow-viz
//!
//! Textual diagram rendering for stateflow machines.
//!
//! Both renderers consume the read-only
//! [`MachineStructure`](stateflow_core::MachineStructure) snapshot
//! exported by `Machine::structure`. Snapshots carry sorted keys and
//! lists, so renderings are byte-stable across calls.

pub mod graphviz;
pub mod mermaid;

pub use graphviz::to_graphviz;
pub use mermaid::to_mermaid;
