use crate::graph::NodeId;
use thiserror::Error;

/// Top-level error for the execution core
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("internal consistency error: {0}")]
    Internal(String),

    #[error("no executor registered for node type: {0}")]
    UnknownExecutor(String),
}

/// Structural graph errors, rejected before any node executes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("edge references unknown node: {node_id}")]
    UnknownHandle { node_id: NodeId },

    #[error("handle '{handle}' is not a declared {direction} port on node {node_id}")]
    IncompatibleHandle {
        node_id: NodeId,
        handle: String,
        direction: PortDirection,
    },

    #[error("cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<NodeId> },

    #[error("edge connects node {node_id} to itself")]
    SelfLoop { node_id: NodeId },

    #[error("scope requires node ids but none were provided")]
    EmptyScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Failures produced by node executors.
///
/// Only the transient upstream variants are eligible for retry; missing-input
/// errors are terminal for the node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("no media uploaded")]
    MissingMedia,

    #[error("user message is required")]
    MissingMessage,

    #[error("image URL is required")]
    MissingImage,

    #[error("video URL is required")]
    MissingVideo,

    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("invalid input type for '{field}': expected {expected}")]
    InvalidInputType { field: String, expected: String },

    #[error("invalid crop region: {0}")]
    InvalidCropRegion(String),

    #[error("unsupported timestamp format: {0}")]
    UnsupportedTimestampFormat(String),

    #[error("upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream call timed out after {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl NodeError {
    /// Whether the dispatch layer may retry this failure
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NodeError::UpstreamUnavailable(_) | NodeError::UpstreamTimeout { .. }
        )
    }
}

/// Durability-layer failures; logged by the coordinator, never fatal
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("node result not found: {0}")]
    ResultNotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
