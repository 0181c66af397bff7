use crate::{NodeError, NodeId, NodeType, Value};
use async_trait::async_trait;
use std::collections::HashMap;

/// Contract every node executor implements.
///
/// Executors are pure with respect to engine state: they receive a resolved
/// input map and return a structured success or error, never panic.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// The node type this executor handles
    fn node_type(&self) -> NodeType;

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError>;
}

/// Resolved inputs handed to an executor for one node
#[derive(Debug, Clone)]
pub struct ExecutorContext {
    pub node_id: NodeId,
    pub inputs: HashMap<String, Value>,
}

impl ExecutorContext {
    pub fn new(node_id: impl Into<NodeId>, inputs: HashMap<String, Value>) -> Self {
        Self {
            node_id: node_id.into(),
            inputs,
        }
    }

    /// Get a required input or fail with the given error
    pub fn require(&self, name: &str, missing: NodeError) -> Result<&Value, NodeError> {
        self.inputs.get(name).ok_or(missing)
    }

    /// Get a required non-empty text input. Accepts plain strings and
    /// text-bearing structured outputs (see [`Value::as_text`]).
    pub fn require_str(&self, name: &str, missing: NodeError) -> Result<&str, NodeError> {
        match self.inputs.get(name) {
            None => Err(missing),
            Some(Value::Null) => Err(missing),
            Some(value) => {
                let s = value.as_text().ok_or_else(|| NodeError::InvalidInputType {
                    field: name.to_string(),
                    expected: "string".to_string(),
                })?;
                if s.is_empty() {
                    Err(missing)
                } else {
                    Ok(s)
                }
            }
        }
    }

    /// Get an optional text input
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|v| v.as_text())
    }

    /// Get a numeric input with a default
    pub fn get_f64_or(&self, name: &str, default: f64) -> Result<f64, NodeError> {
        match self.inputs.get(name) {
            None => Ok(default),
            Some(Value::Null) => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| NodeError::InvalidInputType {
                field: name.to_string(),
                expected: "number".to_string(),
            }),
        }
    }
}
