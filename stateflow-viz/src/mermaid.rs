//! Mermaid `stateDiagram-v2` rendering.

use stateflow_core::MachineStructure;

/// Renders the structure as a Mermaid state diagram.
pub fn to_mermaid(structure: &MachineStructure) -> String {
    let mut out = String::from("stateDiagram-v2\n");

    if let Some(initial) = &structure.initial {
        out.push_str(&format!("    [*] --> {}\n", initial));
    }

    for (src, dsts) in &structure.transitions {
        for dst in dsts {
            out.push_str(&format!("    {} --> {}\n", src, dst));
        }
    }

    for dst in &structure.wildcards {
        out.push_str(&format!("    [*] --> {} : (wildcard)\n", dst));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn order_structure() -> MachineStructure {
        let mut transitions = BTreeMap::new();
        transitions.insert("draft".to_string(), vec!["pending".to_string()]);
        transitions.insert("paid".to_string(), vec!["shipped".to_string()]);
        transitions.insert("pending".to_string(), vec!["paid".to_string()]);
        MachineStructure {
            initial: Some("draft".to_string()),
            transitions,
            wildcards: vec!["cancelled".to_string()],
        }
    }

    #[test]
    fn test_mermaid_rendering() {
        let diagram = to_mermaid(&order_structure());
        assert_eq!(
            diagram,
            "stateDiagram-v2\n\
             \x20   [*] --> draft\n\
             \x20   draft --> pending\n\
             \x20   paid --> shipped\n\
             \x20   pending --> paid\n\
             \x20   [*] --> cancelled : (wildcard)\n"
        );
    }

    #[test]
    fn test_mermaid_without_initial() {
        let mut structure = order_structure();
        structure.initial = None;
        let diagram = to_mermaid(&structure);
        assert!(!diagram.contains("[*] --> draft"));
        assert!(diagram.starts_with("stateDiagram-v2\n"));
    }

    #[test]
    fn test_mermaid_is_stable_across_calls() {
        let structure = order_structure();
        assert_eq!(to_mermaid(&structure), to_mermaid(&structure));
    }
}
