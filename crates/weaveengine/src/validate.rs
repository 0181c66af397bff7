use crate::depgraph::build_graph;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use weavecore::{Graph, NodeId, PortDirection, ValidationError};

/// Check structural well-formedness of a graph before execution.
///
/// Pure function: verifies that every edge references known nodes and
/// declared ports, rejects self-loops, and reports the first cycle found by
/// depth-first traversal. Handle checks cover the whole submitted graph;
/// acyclicity is only required of the nodes that will actually run, so the
/// cycle check is restricted to `set` when one is given. Nothing is
/// persisted when validation fails.
pub fn validate(graph: &Graph, set: Option<&HashSet<NodeId>>) -> Result<(), ValidationError> {
    let types: HashMap<&str, _> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.node_type))
        .collect();

    for edge in &graph.edges {
        let source_type =
            types
                .get(edge.source.as_str())
                .ok_or_else(|| ValidationError::UnknownHandle {
                    node_id: edge.source.clone(),
                })?;
        let target_type =
            types
                .get(edge.target.as_str())
                .ok_or_else(|| ValidationError::UnknownHandle {
                    node_id: edge.target.clone(),
                })?;

        if edge.source == edge.target {
            return Err(ValidationError::SelfLoop {
                node_id: edge.source.clone(),
            });
        }

        if !source_type
            .output_handles()
            .contains(&edge.source_handle.as_str())
        {
            return Err(ValidationError::IncompatibleHandle {
                node_id: edge.source.clone(),
                handle: edge.source_handle.clone(),
                direction: PortDirection::Output,
            });
        }
        if !target_type
            .input_handles()
            .contains(&edge.target_handle.as_str())
        {
            return Err(ValidationError::IncompatibleHandle {
                node_id: edge.target.clone(),
                handle: edge.target_handle.clone(),
                direction: PortDirection::Input,
            });
        }
    }

    let (dag, _) = build_graph(graph, set);
    if let Some(cycle) = find_cycle(&dag) {
        return Err(ValidationError::CycleDetected { cycle });
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search with a recursion stack; returns the node ids of the
/// first back-edge cycle found.
fn find_cycle(dag: &DiGraph<NodeId, ()>) -> Option<Vec<NodeId>> {
    let mut marks = vec![Mark::Unvisited; dag.node_count()];
    let mut stack = Vec::new();

    for start in dag.node_indices() {
        if marks[start.index()] == Mark::Unvisited {
            if let Some(cycle) = visit(dag, start, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    dag: &DiGraph<NodeId, ()>,
    node: NodeIndex,
    marks: &mut Vec<Mark>,
    stack: &mut Vec<NodeIndex>,
) -> Option<Vec<NodeId>> {
    marks[node.index()] = Mark::OnStack;
    stack.push(node);

    for next in dag.neighbors_directed(node, Direction::Outgoing) {
        match marks[next.index()] {
            Mark::OnStack => {
                // Back-edge: the cycle is the stack suffix from `next` down,
                // closed by `next` itself.
                let pos = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle: Vec<NodeId> =
                    stack[pos..].iter().map(|&n| dag[n].clone()).collect();
                cycle.push(dag[next].clone());
                return Some(cycle);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(dag, next, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node.index()] = Mark::Done;
    None
}
