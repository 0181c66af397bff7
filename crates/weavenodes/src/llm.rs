use async_trait::async_trait;
use base64::Engine as _;
use std::sync::Arc;
use std::time::Duration;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// Model used when the node supplies none
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// A fully resolved LLM call
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub user_message: String,
    /// Image references (data URLs or fetchable URLs), in fan-in order
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tokens: Option<u64>,
}

/// Provider boundary for LLM inference
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, NodeError>;
}

/// Executor for `llm` nodes: validates inputs and delegates to the provider
pub struct LlmExecutor {
    client: Arc<dyn LlmClient>,
}

impl LlmExecutor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeExecutor for LlmExecutor {
    fn node_type(&self) -> NodeType {
        NodeType::Llm
    }

    async fn execute(&self, ctx: ExecutorContext) -> Result<Value, NodeError> {
        let user_message = ctx.require_str("user_message", NodeError::MissingMessage)?;
        let system_prompt = ctx.get_str("system_prompt").map(str::to_string);
        let model = ctx.get_str("model").unwrap_or(DEFAULT_MODEL).to_string();
        let images: Vec<String> = ctx
            .inputs
            .get("images")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let response = self
            .client
            .generate(LlmRequest {
                model,
                system_prompt,
                user_message: user_message.to_string(),
                images,
            })
            .await?;

        let mut output = std::collections::HashMap::new();
        output.insert("text".to_string(), Value::String(response.text));
        output.insert(
            "tokens".to_string(),
            match response.tokens {
                Some(n) => Value::Number(n as f64),
                None => Value::Null,
            },
        );
        Ok(Value::Object(output))
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://generativelanguage.googleapis.com")
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Turn an image reference into an inline-data part. Data URLs are
    /// decoded in place; remote URLs are fetched and base64-encoded. An image
    /// that cannot be resolved is skipped with a warning rather than failing
    /// the call.
    async fn inline_image(&self, reference: &str) -> Option<serde_json::Value> {
        if let Some(rest) = reference.strip_prefix("data:") {
            let (mime_type, data) = rest.split_once(";base64,")?;
            return Some(serde_json::json!({
                "inlineData": { "mimeType": mime_type, "data": data }
            }));
        }

        let response = match self.client.get(reference).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(image = reference, error = %e, "failed to fetch image, skipping");
                return None;
            }
        };
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(image = reference, error = %e, "failed to read image, skipping");
                return None;
            }
        };
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Some(serde_json::json!({
            "inlineData": { "mimeType": mime_type, "data": data }
        }))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, NodeError> {
        let mut parts = vec![serde_json::json!({ "text": request.user_message })];
        for image in &request.images {
            if let Some(part) = self.inline_image(image).await {
                parts.push(part);
            }
        }

        let mut body = serde_json::json!({
            "contents": [{ "parts": parts }]
        });
        if let Some(system_prompt) = &request.system_prompt {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system_prompt }]
            });
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NodeError::UpstreamTimeout {
                        seconds: REQUEST_TIMEOUT_SECS,
                    }
                } else {
                    NodeError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NodeError::UpstreamUnavailable(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NodeError::UpstreamUnavailable(format!("malformed response: {e}")))?;

        let text = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                NodeError::UpstreamUnavailable("provider response contained no text".to_string())
            })?;
        let tokens = payload["usageMetadata"]["totalTokenCount"].as_u64();

        Ok(LlmResponse { text, tokens })
    }
}
