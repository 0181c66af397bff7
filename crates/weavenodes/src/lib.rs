//! Built-in node executors
//!
//! One executor per node type the engine dispatches: text pass-through,
//! media uploads, LLM calls, image cropping and video frame extraction.

mod crop;
mod frame;
mod llm;
mod media;
mod text;

pub use crop::CropImageExecutor;
pub use frame::ExtractFrameExecutor;
pub use llm::{GeminiClient, LlmClient, LlmExecutor, LlmRequest, LlmResponse, DEFAULT_MODEL};
pub use media::{UploadImageExecutor, UploadVideoExecutor};
pub use text::TextExecutor;

use std::sync::Arc;
use weaveengine::ExecutorRegistry;

/// Register every built-in executor with a registry
pub fn register_all(registry: &mut ExecutorRegistry, llm_client: Arc<dyn LlmClient>) {
    registry.register(Arc::new(TextExecutor));
    registry.register(Arc::new(UploadImageExecutor));
    registry.register(Arc::new(UploadVideoExecutor));
    registry.register(Arc::new(LlmExecutor::new(llm_client)));
    registry.register(Arc::new(CropImageExecutor));
    registry.register(Arc::new(ExtractFrameExecutor));
}
