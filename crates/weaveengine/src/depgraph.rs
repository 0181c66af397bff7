use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use weavecore::{Graph, NodeId};

/// Build a petgraph dependency graph from the submitted edges.
///
/// When `set` is given, nodes outside it are omitted and edges crossing the
/// boundary are dropped; those sources feed the run through seeded prior
/// outputs instead. Parallel edges between the same pair collapse to one
/// dependency.
pub(crate) fn build_graph(
    graph: &Graph,
    set: Option<&HashSet<NodeId>>,
) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>) {
    let mut dag = DiGraph::new();
    let mut index = HashMap::new();

    for node in &graph.nodes {
        if let Some(set) = set {
            if !set.contains(&node.id) {
                continue;
            }
        }
        let idx = dag.add_node(node.id.clone());
        index.insert(node.id.clone(), idx);
    }

    let mut seen = HashSet::new();
    for edge in &graph.edges {
        let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        if seen.insert((from, to)) {
            dag.add_edge(from, to, ());
        }
    }

    (dag, index)
}
