use std::collections::HashMap;
use weavecore::{Edge, Node, NodeId, Value};

/// The one additive input port: multiple edges accumulate into an ordered
/// list instead of overwriting each other.
pub const IMAGES_HANDLE: &str = "images";

/// Merge a node's static data with values delivered over its incoming edges.
///
/// The node's own `data` fields are the defaults. Edges are applied in
/// declaration order so `images` fan-in is deterministic. An upstream node
/// absent from the output map contributes nothing; missing required inputs
/// are the dispatcher's problem, not a resolution error.
pub fn resolve_inputs(
    node: &Node,
    edges: &[Edge],
    outputs: &HashMap<NodeId, Value>,
) -> HashMap<String, Value> {
    let mut inputs = node.data.clone();

    for edge in edges.iter().filter(|e| e.target == node.id) {
        let Some(value) = outputs.get(&edge.source) else {
            continue;
        };
        if edge.target_handle == IMAGES_HANDLE {
            let mut list = match inputs.remove(IMAGES_HANDLE) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            list.push(value.clone());
            inputs.insert(IMAGES_HANDLE.to_string(), Value::Array(list));
        } else {
            inputs.insert(edge.target_handle.clone(), value.clone());
        }
    }

    inputs
}
