use crate::depgraph::build_graph;
use petgraph::Direction;
use std::collections::HashSet;
use weavecore::{EngineError, Graph, NodeId};

/// Slice the execution set into dependency layers (Kahn's algorithm).
///
/// Every node in a layer depends only on nodes in strictly earlier layers;
/// nodes within a layer are independent and may run concurrently. In-degrees
/// count only edges whose source is also inside the execution set. The set
/// of nodes per layer is deterministic (ids sorted within a layer); nothing
/// downstream may rely on completion order inside a layer.
pub fn layers(graph: &Graph, set: &HashSet<NodeId>) -> Result<Vec<Vec<NodeId>>, EngineError> {
    let (dag, _) = build_graph(graph, Some(set));

    let mut in_degree: Vec<usize> = dag
        .node_indices()
        .map(|idx| dag.neighbors_directed(idx, Direction::Incoming).count())
        .collect();
    let mut remaining = dag.node_count();
    let mut placed = vec![false; dag.node_count()];
    let mut result = Vec::new();

    while remaining > 0 {
        let mut layer: Vec<_> = dag
            .node_indices()
            .filter(|idx| !placed[idx.index()] && in_degree[idx.index()] == 0)
            .collect();

        if layer.is_empty() {
            // The validator rejects cycles before we get here, so leftover
            // nodes mean the engine state is inconsistent.
            let stuck: Vec<&str> = dag
                .node_indices()
                .filter(|idx| !placed[idx.index()])
                .map(|idx| dag[idx].as_str())
                .collect();
            return Err(EngineError::Internal(format!(
                "unresolvable dependencies among nodes: {}",
                stuck.join(", ")
            )));
        }

        layer.sort_by(|a, b| dag[*a].cmp(&dag[*b]));

        for &idx in &layer {
            placed[idx.index()] = true;
            remaining -= 1;
            for next in dag.neighbors_directed(idx, Direction::Outgoing) {
                in_degree[next.index()] -= 1;
            }
        }

        result.push(layer.into_iter().map(|idx| dag[idx].clone()).collect());
    }

    Ok(result)
}
