use async_trait::async_trait;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// Pass-through: emits the node's `text` value verbatim, empty if unset
pub struct TextExecutor;

#[async_trait]
impl NodeExecutor for TextExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::Text
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let text = ctx.get_str("text").unwrap_or("");
        Ok(Value::String(text.to_string()))
    }
}
