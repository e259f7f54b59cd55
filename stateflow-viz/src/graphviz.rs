//! Graphviz `digraph` rendering.

use stateflow_core::MachineStructure;

/// Renders the structure as a Graphviz digraph.
///
/// Wildcard edges originate from an `ANY_STATE` pseudo-node, labeled `*`.
pub fn to_graphviz(structure: &MachineStructure) -> String {
    let mut out = String::from("digraph FSM {\n");
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [shape=box style=rounded];\n");

    if let Some(initial) = &structure.initial {
        out.push_str("    start [shape=point];\n");
        out.push_str(&format!("    start -> {};\n", initial));
    }

    for (src, dsts) in &structure.transitions {
        for dst in dsts {
            out.push_str(&format!("    {} -> {};\n", src, dst));
        }
    }

    for dst in &structure.wildcards {
        out.push_str(&format!("    ANY_STATE -> {} [label=\"*\"];\n", dst));
    }

    out.push_str("}\n");
    out
}
