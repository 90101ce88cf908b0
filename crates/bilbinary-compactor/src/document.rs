//! Top-level document compaction.
//!
//! A document is either a bare list of declarations or a mapping carrying
//! `port-settings`, `port-parameters` and `scripts`.

use bilbinary_tree::{Mapping, Node, keys};

use crate::compactor::{SymbolResolutionError, compact_scripts};
use crate::symbol_table::SymbolTable;

/// Compact a whole document.
///
/// For the mapping form, only the script kinds the target runs are kept and
/// `port-parameters` is narrowed to each port's selected device.
pub fn compact(document: &Node) -> Result<Node, SymbolResolutionError> {
    if let Some(scripts) = document.get(keys::SCRIPTS) {
        return compact_document(document, scripts);
    }
    let table = match document {
        Node::Sequence(decls) => SymbolTable::build(decls)?,
        _ => SymbolTable::new(),
    };
    compact_scripts(document, &table)
}

fn compact_document(document: &Node, scripts: &Node) -> Result<Node, SymbolResolutionError> {
    let scripts: Vec<Node> = scripts
        .as_sequence()
        .unwrap_or(&[])
        .iter()
        .filter(|script| script.block_kind().is_toplevel())
        .cloned()
        .collect();
    let table = SymbolTable::build(&scripts)?;

    let settings = document
        .get(keys::PORT_SETTINGS)
        .cloned()
        .unwrap_or_else(Node::empty_mapping);
    let parameters = select_port_parameters(document.get(keys::PORT_PARAMETERS), &settings);

    let mut out = Mapping::new();
    out.insert(keys::PORT_SETTINGS.to_string(), settings);
    out.insert(keys::PORT_PARAMETERS.to_string(), parameters);
    out.insert(
        keys::SCRIPTS.to_string(),
        compact_scripts(&Node::Sequence(scripts), &table)?,
    );
    Ok(Node::Mapping(out))
}

/// Keep, per port, only the parameters of the device selected in `settings`.
///
/// `parameters` maps port → device type → parameter mapping. Ports without a
/// selected device, or whose selected device has no parameter mapping, are
/// dropped. The result follows the port order of `settings`.
pub fn select_port_parameters(parameters: Option<&Node>, settings: &Node) -> Node {
    let Some(settings) = settings.as_mapping() else {
        return Node::empty_mapping();
    };
    settings
        .iter()
        .filter_map(|(port, device)| {
            let device = device.as_str()?;
            let selected = parameters?.get(port)?.get(device)?;
            selected
                .as_mapping()
                .map(|_| (port.clone(), selected.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_bare_list_builds_its_own_table() {
        let out = compact(&node(json!([
            { "name": "function", "function": "f", "blocks": [] },
            { "name": "when-green-flag-clicked",
              "blocks": [ { "name": "call-function", "function": "f" } ] },
        ])))
        .unwrap();

        assert_eq!(
            out,
            node(json!([
                { "name": "function", "function": 0, "blocks": [] },
                { "name": "when-green-flag-clicked",
                  "blocks": [ { "name": "call-function", "function": 0 } ] },
            ]))
        );
    }

    #[test]
    fn test_document_shape() {
        let out = compact(&node(json!({
            "scripts": [
                { "name": "fragment", "blocks": [ { "name": "variable-ref", "variable": "nope" } ] },
                { "name": "variable", "variable": "v", "value": 1 },
                { "name": "when-green-flag-clicked",
                  "blocks": [ { "name": "variable-ref", "variable": "v" } ] },
            ],
        })))
        .unwrap();

        // Fragments are dropped before their names are resolved.
        assert_eq!(
            out,
            node(json!({
                "port-settings": {},
                "port-parameters": {},
                "scripts": [
                    { "name": "variable", "variable": 0, "value": 1 },
                    { "name": "when-green-flag-clicked",
                      "blocks": [ { "name": "variable-ref", "variable": 0 } ] },
                ],
            }))
        );
    }

    #[test]
    fn test_port_parameters_follow_settings() {
        let out = compact(&node(json!({
            "port-settings": { "V0": "dc-motor", "V6": "servo-motor", "A0": "touch-sensor" },
            "port-parameters": {
                "V0": { "dc-motor": { "scale": 0.8 } },
                "V2": { "servo-motor": { "drift": 3.0 } },
                "V6": { "servo-motor": { "drift": -3.0 }, "buzzer": { "drift": -9.0 } },
                "A0": { "touch-sensor": 1 },
            },
            "scripts": [],
        })))
        .unwrap();

        assert_eq!(
            out.get("port-parameters"),
            Some(&node(json!({
                "V0": { "scale": 0.8 },
                "V6": { "drift": -3.0 },
            })))
        );
        assert_eq!(
            out.get("port-settings"),
            Some(&node(json!({ "V0": "dc-motor", "V6": "servo-motor", "A0": "touch-sensor" })))
        );
    }

    #[test]
    fn test_select_without_parameters() {
        let settings = node(json!({ "V0": "dc-motor" }));
        assert_eq!(select_port_parameters(None, &settings), Node::empty_mapping());
        assert_eq!(
            select_port_parameters(Some(&node(json!({ "V0": { "servo-motor": {} } }))), &settings),
            Node::empty_mapping()
        );
    }

    #[test]
    fn test_document_errors_propagate() {
        let err = compact(&node(json!({
            "scripts": [
                { "name": "function", "function": "f",
                  "args": [ { "variable": "a" }, { "variable": "a" } ] },
            ],
        })))
        .unwrap_err();
        assert!(matches!(err, SymbolResolutionError::DuplicateLocal { .. }));
    }
}
