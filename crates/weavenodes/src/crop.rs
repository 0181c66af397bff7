use async_trait::async_trait;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// Crops an image to a percent-based region, producing a derived reference.
///
/// Region parameters come from edges or the node's static data; x/y default
/// to 0 and width/height to 100. Empty or out-of-bounds regions are rejected
/// outright, never clamped.
pub struct CropImageExecutor;

#[async_trait]
impl NodeExecutor for CropImageExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::CropImage
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let image_url = ctx.require_str("image_url", NodeError::MissingImage)?;
        let x = ctx.get_f64_or("x_percent", 0.0)?;
        let y = ctx.get_f64_or("y_percent", 0.0)?;
        let width = ctx.get_f64_or("width_percent", 100.0)?;
        let height = ctx.get_f64_or("height_percent", 100.0)?;

        validate_region(x, y, width, height)?;

        tracing::debug!(node_id = %ctx.node_id, x, y, width, height, "cropping image");
        Ok(Value::String(format!(
            "{image_url}#crop={x},{y},{width},{height}"
        )))
    }
}

fn validate_region(x: f64, y: f64, width: f64, height: f64) -> Result<(), NodeError> {
    for (name, value) in [
        ("x_percent", x),
        ("y_percent", y),
        ("width_percent", width),
        ("height_percent", height),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(NodeError::InvalidCropRegion(format!(
                "{name} must be between 0 and 100, got {value}"
            )));
        }
    }
    if width == 0.0 || height == 0.0 {
        return Err(NodeError::InvalidCropRegion(
            "crop region is empty".to_string(),
        ));
    }
    if x + width > 100.0 {
        return Err(NodeError::InvalidCropRegion(format!(
            "region extends past the right edge: x {x} + width {width} > 100"
        )));
    }
    if y + height > 100.0 {
        return Err(NodeError::InvalidCropRegion(format!(
            "region extends past the bottom edge: y {y} + height {height} > 100"
        )));
    }
    Ok(())
}
