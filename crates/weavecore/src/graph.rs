use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type NodeId = String;

/// Default output port name for every node type
pub const OUTPUT_HANDLE: &str = "output";

/// The node types the engine can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Text,
    UploadImage,
    UploadVideo,
    Llm,
    CropImage,
    ExtractFrame,
}

impl NodeType {
    /// Input ports the editor may connect edges to
    pub fn input_handles(&self) -> &'static [&'static str] {
        match self {
            NodeType::Text | NodeType::UploadImage | NodeType::UploadVideo => &[],
            NodeType::Llm => &["system_prompt", "user_message", "images", "model"],
            NodeType::CropImage => &[
                "image_url",
                "x_percent",
                "y_percent",
                "width_percent",
                "height_percent",
            ],
            NodeType::ExtractFrame => &["video_url", "timestamp"],
        }
    }

    /// Output ports; every node produces a single value on `output`
    pub fn output_handles(&self) -> &'static [&'static str] {
        &[OUTPUT_HANDLE]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Text => "text",
            NodeType::UploadImage => "uploadImage",
            NodeType::UploadVideo => "uploadVideo",
            NodeType::Llm => "llm",
            NodeType::CropImage => "cropImage",
            NodeType::ExtractFrame => "extractFrame",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed processing node placed on the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    /// Value produced by a prior run, used as a fixed input when the node
    /// is outside the execution scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_output: Option<Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            data: HashMap::new(),
            last_output: None,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_last_output(mut self, value: impl Into<Value>) -> Self {
        self.last_output = Some(value.into());
        self
    }
}

/// Directed connection between an output port and an input port
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: NodeId,
    #[serde(default = "default_source_handle")]
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
}

fn default_source_handle() -> String {
    OUTPUT_HANDLE.to_string()
}

impl Edge {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: default_source_handle(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }
}

/// Which kind of subgraph a run was requested over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScopeKind {
    Full,
    Partial,
    Single,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Full => f.write_str("FULL"),
            ScopeKind::Partial => f.write_str("PARTIAL"),
            ScopeKind::Single => f.write_str("SINGLE"),
        }
    }
}

/// Execution scope resolved from a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionScope {
    /// Every node in the graph
    Full,
    /// The requested nodes plus everything they transitively depend on
    Partial { node_ids: Vec<NodeId> },
    /// Exactly one node; upstream values come from prior outputs
    Single { node_id: NodeId },
}

impl ExecutionScope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            ExecutionScope::Full => ScopeKind::Full,
            ExecutionScope::Partial { .. } => ScopeKind::Partial,
            ExecutionScope::Single { .. } => ScopeKind::Single,
        }
    }
}

/// A node/edge graph as submitted for execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        target_handle: impl Into<String>,
    ) {
        self.edges.push(Edge::new(source, target, target_handle));
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges feeding the given node, in declaration order
    pub fn edges_into<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == id)
    }
}
