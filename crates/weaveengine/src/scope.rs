use std::collections::{HashSet, VecDeque};
use weavecore::{ExecutionScope, Graph, NodeId, ValidationError};

/// Resolve an execution scope to the set of node ids that will run.
///
/// PARTIAL expands the requested ids to their transitive in-graph
/// predecessors so every executed node resolves its inputs from values
/// computed in the same run. SINGLE runs exactly one node; its upstream
/// values come from prior outputs.
pub fn execution_set(
    graph: &Graph,
    scope: &ExecutionScope,
) -> Result<HashSet<NodeId>, ValidationError> {
    match scope {
        ExecutionScope::Full => Ok(graph.nodes.iter().map(|n| n.id.clone()).collect()),

        ExecutionScope::Single { node_id } => {
            require_known(graph, node_id)?;
            Ok(HashSet::from([node_id.clone()]))
        }

        ExecutionScope::Partial { node_ids } => {
            if node_ids.is_empty() {
                return Err(ValidationError::EmptyScope);
            }
            let mut set = HashSet::new();
            let mut queue = VecDeque::new();
            for id in node_ids {
                require_known(graph, id)?;
                if set.insert(id.clone()) {
                    queue.push_back(id.clone());
                }
            }
            while let Some(id) = queue.pop_front() {
                for edge in &graph.edges {
                    if edge.target == id && set.insert(edge.source.clone()) {
                        queue.push_back(edge.source.clone());
                    }
                }
            }
            Ok(set)
        }
    }
}

fn require_known(graph: &Graph, id: &NodeId) -> Result<(), ValidationError> {
    if graph.node(id).is_none() {
        return Err(ValidationError::UnknownHandle {
            node_id: id.clone(),
        });
    }
    Ok(())
}
