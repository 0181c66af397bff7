use async_trait::async_trait;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// The editor writes camelCase data keys (`imageUrl`), while edge handles
/// use snake_case; accept either spelling.
fn media_url<'a>(ctx: &'a ExecutorContext, keys: [&'a str; 2]) -> Result<&'a str, NodeError> {
    for key in keys {
        match ctx.require_str(key, NodeError::MissingMedia) {
            Ok(url) => return Ok(url),
            Err(NodeError::MissingMedia) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(NodeError::MissingMedia)
}

/// Emits the pre-resolved image URL the editor uploaded for this node
pub struct UploadImageExecutor;

#[async_trait]
impl NodeExecutor for UploadImageExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::UploadImage
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let url = media_url(&ctx, ["image_url", "imageUrl"])?;
        Ok(Value::String(url.to_string()))
    }
}

/// Emits the pre-resolved video URL the editor uploaded for this node
pub struct UploadVideoExecutor;

#[async_trait]
impl NodeExecutor for UploadVideoExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::UploadVideo
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let url = media_url(&ctx, ["video_url", "videoUrl"])?;
        Ok(Value::String(url.to_string()))
    }
}
