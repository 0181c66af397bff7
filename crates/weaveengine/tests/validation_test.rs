// crates/weaveengine/tests/validation_test.rs

use std::collections::HashSet;
use weavecore::{Edge, Graph, Node, NodeType, PortDirection, ValidationError};
use weaveengine::validate;

fn text_node(id: &str) -> Node {
    Node::new(id, NodeType::Text).with_data("text", "hello")
}

#[test]
fn test_valid_graph_passes() {
    let mut graph = Graph::new();
    graph.add_node(text_node("a"));
    graph.add_node(Node::new("b", NodeType::Llm));
    graph.connect("a", "b", "user_message");

    assert!(validate(&graph, None).is_ok());
}

#[test]
fn test_edge_to_unknown_node_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(text_node("a"));
    graph.connect("a", "ghost", "user_message");

    let err = validate(&graph, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownHandle {
            node_id: "ghost".to_string()
        }
    );
}

#[test]
fn test_edge_from_unknown_node_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(Node::new("b", NodeType::Llm));
    graph.connect("ghost", "b", "user_message");

    let err = validate(&graph, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownHandle {
            node_id: "ghost".to_string()
        }
    );
}

#[test]
fn test_undeclared_target_handle_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(text_node("a"));
    graph.add_node(Node::new("b", NodeType::Llm));
    graph.connect("a", "b", "not_a_port");

    let err = validate(&graph, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::IncompatibleHandle {
            node_id: "b".to_string(),
            handle: "not_a_port".to_string(),
            direction: PortDirection::Input,
        }
    );
}

#[test]
fn test_undeclared_source_handle_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(text_node("a"));
    graph.add_node(Node::new("b", NodeType::Llm));
    let mut edge = Edge::new("a", "b", "user_message");
    edge.source_handle = "side_channel".to_string();
    graph.edges.push(edge);

    let err = validate(&graph, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::IncompatibleHandle {
            node_id: "a".to_string(),
            handle: "side_channel".to_string(),
            direction: PortDirection::Output,
        }
    );
}

#[test]
fn test_self_loop_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(Node::new("a", NodeType::Llm));
    graph.connect("a", "a", "user_message");

    let err = validate(&graph, None).unwrap_err();
    assert_eq!(
        err,
        ValidationError::SelfLoop {
            node_id: "a".to_string()
        }
    );
}

#[test]
fn test_cycle_is_reported_with_its_node_ids() {
    let mut graph = Graph::new();
    graph.add_node(Node::new("a", NodeType::Llm));
    graph.add_node(Node::new("b", NodeType::Llm));
    graph.add_node(Node::new("c", NodeType::Llm));
    graph.connect("a", "b", "user_message");
    graph.connect("b", "c", "user_message");
    graph.connect("c", "a", "user_message");

    match validate(&graph, None).unwrap_err() {
        ValidationError::CycleDetected { cycle } => {
            assert!(cycle.len() >= 4, "cycle should be closed: {:?}", cycle);
            assert_eq!(cycle.first(), cycle.last(), "cycle should start and end on the same node");
            for id in ["a", "b", "c"] {
                assert!(cycle.contains(&id.to_string()), "cycle should contain {id}: {:?}", cycle);
            }
        }
        other => panic!("expected CycleDetected, got {:?}", other),
    }
}

#[test]
fn test_cycle_outside_the_execution_set_is_ignored() {
    // a <-> b form a cycle, but only c runs.
    let mut graph = Graph::new();
    graph.add_node(Node::new("a", NodeType::Llm));
    graph.add_node(Node::new("b", NodeType::Llm));
    graph.add_node(Node::new("c", NodeType::Text).with_data("text", "hi"));
    graph.connect("a", "b", "user_message");
    graph.connect("b", "a", "user_message");

    let set = HashSet::from(["c".to_string()]);
    assert!(validate(&graph, Some(&set)).is_ok());
    assert!(validate(&graph, None).is_err(), "the full graph is still cyclic");
}

#[test]
fn test_branching_dag_is_not_a_cycle() {
    // Diamond: two paths from a to d must not be mistaken for a cycle.
    let mut graph = Graph::new();
    for id in ["a", "b", "c", "d"] {
        graph.add_node(Node::new(id, NodeType::Llm));
    }
    graph.connect("a", "b", "user_message");
    graph.connect("a", "c", "user_message");
    graph.connect("b", "d", "user_message");
    graph.connect("c", "d", "system_prompt");

    assert!(validate(&graph, None).is_ok());
}
