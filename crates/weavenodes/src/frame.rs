use async_trait::async_trait;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// Extracts a still frame from a video at a timestamp, producing a derived
/// frame image reference.
///
/// The timestamp may be a non-negative number of seconds or a clock string
/// (`"SS"`, `"MM:SS"`, `"HH:MM:SS"`); anything else is rejected. Defaults to
/// the first frame.
pub struct ExtractFrameExecutor;

#[async_trait]
impl NodeExecutor for ExtractFrameExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::ExtractFrame
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let video_url = ctx.require_str("video_url", NodeError::MissingVideo)?;
        let seconds = match ctx.inputs.get("timestamp") {
            None | Some(Value::Null) => 0.0,
            Some(value) => parse_timestamp(value)?,
        };

        tracing::debug!(node_id = %ctx.node_id, seconds, "extracting frame");
        Ok(Value::String(format!("{video_url}#frame={seconds}")))
    }
}

fn parse_timestamp(value: &Value) -> Result<f64, NodeError> {
    match value {
        Value::Number(n) if n.is_finite() && *n >= 0.0 => Ok(*n),
        Value::Number(n) => Err(NodeError::UnsupportedTimestampFormat(n.to_string())),
        Value::String(s) => parse_clock(s)
            .ok_or_else(|| NodeError::UnsupportedTimestampFormat(s.clone())),
        other => Err(NodeError::UnsupportedTimestampFormat(format!("{other:?}"))),
    }
}

/// `"SS"`, `"MM:SS"` or `"HH:MM:SS"`, where the seconds part may carry a
/// fraction. Components below the leading one must stay under 60.
fn parse_clock(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let (whole, seconds_part) = parts.split_at(parts.len() - 1);
    let seconds: f64 = seconds_part[0].parse().ok().filter(|v: &f64| *v >= 0.0)?;
    if !whole.is_empty() && seconds >= 60.0 {
        return None;
    }

    let mut total = seconds;
    let mut multiplier = 60.0;
    for (i, part) in whole.iter().rev().enumerate() {
        let unit: u64 = part.parse().ok()?;
        if i + 1 < whole.len() && unit >= 60 {
            return None;
        }
        total += unit as f64 * multiplier;
        multiplier *= 60.0;
    }
    Some(total)
}
