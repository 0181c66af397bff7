// crates/weavenodes/tests/executor_test.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use weavecore::{ExecutorContext, NodeError, NodeExecutor, Value};
use weavenodes::{
    CropImageExecutor, ExtractFrameExecutor, LlmClient, LlmExecutor, LlmRequest, LlmResponse,
    TextExecutor, UploadImageExecutor, UploadVideoExecutor, DEFAULT_MODEL,
};

fn ctx(pairs: &[(&str, Value)]) -> ExecutorContext {
    let inputs: HashMap<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    ExecutorContext::new("test-node", inputs)
}

// --- text -------------------------------------------------------------------

#[tokio::test]
async fn test_text_emits_its_content() {
    let out = TextExecutor
        .execute(ctx(&[("text", Value::from("hello"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("hello"));
}

#[tokio::test]
async fn test_text_defaults_to_empty_string() {
    let out = TextExecutor.execute(ctx(&[])).await.unwrap();
    assert_eq!(out, Value::from(""));
}

// --- uploads ----------------------------------------------------------------

#[tokio::test]
async fn test_upload_image_passes_url_through() {
    let out = UploadImageExecutor
        .execute(ctx(&[("image_url", Value::from("https://x/cat.jpg"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("https://x/cat.jpg"));
}

#[tokio::test]
async fn test_upload_image_without_media_fails() {
    let err = UploadImageExecutor.execute(ctx(&[])).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingMedia));
}

#[tokio::test]
async fn test_upload_image_with_empty_url_fails() {
    let err = UploadImageExecutor
        .execute(ctx(&[("image_url", Value::from(""))]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::MissingMedia));
}

#[tokio::test]
async fn test_uploads_accept_the_editor_camel_case_keys() {
    let out = UploadImageExecutor
        .execute(ctx(&[("imageUrl", Value::from("cat.jpg"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("cat.jpg"));

    let out = UploadVideoExecutor
        .execute(ctx(&[("videoUrl", Value::from("clip.mp4"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("clip.mp4"));
}

#[tokio::test]
async fn test_upload_video_passes_url_through() {
    let out = UploadVideoExecutor
        .execute(ctx(&[("video_url", Value::from("https://x/clip.mp4"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("https://x/clip.mp4"));
}

#[tokio::test]
async fn test_upload_video_without_media_fails() {
    let err = UploadVideoExecutor.execute(ctx(&[])).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingMedia));
}

// --- cropImage --------------------------------------------------------------

#[tokio::test]
async fn test_crop_applies_region_to_reference() {
    let out = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("x_percent", Value::Number(10.0)),
            ("y_percent", Value::Number(20.0)),
            ("width_percent", Value::Number(30.0)),
            ("height_percent", Value::Number(40.0)),
        ]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("img.png#crop=10,20,30,40"));
}

#[tokio::test]
async fn test_crop_defaults_to_the_whole_image() {
    let out = CropImageExecutor
        .execute(ctx(&[("image_url", Value::from("img.png"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("img.png#crop=0,0,100,100"));
}

#[tokio::test]
async fn test_crop_without_image_fails() {
    let err = CropImageExecutor.execute(ctx(&[])).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingImage));
}

#[tokio::test]
async fn test_crop_rejects_out_of_range_origin() {
    let err = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("x_percent", Value::Number(120.0)),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidCropRegion(_)));
}

#[tokio::test]
async fn test_crop_rejects_empty_region() {
    let err = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("width_percent", Value::Number(0.0)),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidCropRegion(_)));
}

#[tokio::test]
async fn test_crop_rejects_region_past_the_right_edge() {
    // 60 + 60 > 100: rejected, not clamped.
    let err = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("x_percent", Value::Number(60.0)),
            ("width_percent", Value::Number(60.0)),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidCropRegion(_)));
}

#[tokio::test]
async fn test_crop_rejects_region_past_the_bottom_edge() {
    let err = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("y_percent", Value::Number(50.0)),
            ("height_percent", Value::Number(51.0)),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidCropRegion(_)));
}

#[tokio::test]
async fn test_crop_rejects_non_numeric_region() {
    let err = CropImageExecutor
        .execute(ctx(&[
            ("image_url", Value::from("img.png")),
            ("x_percent", Value::from("ten")),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidInputType { .. }));
}

// --- extractFrame -----------------------------------------------------------

#[tokio::test]
async fn test_frame_defaults_to_the_first_frame() {
    let out = ExtractFrameExecutor
        .execute(ctx(&[("video_url", Value::from("clip.mp4"))]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("clip.mp4#frame=0"));
}

#[tokio::test]
async fn test_frame_accepts_numeric_seconds() {
    let out = ExtractFrameExecutor
        .execute(ctx(&[
            ("video_url", Value::from("clip.mp4")),
            ("timestamp", Value::Number(12.5)),
        ]))
        .await
        .unwrap();
    assert_eq!(out, Value::from("clip.mp4#frame=12.5"));
}

#[tokio::test]
async fn test_frame_parses_clock_strings() {
    // The leading component is unbounded: "90:00" is ninety minutes.
    for (clock, seconds) in [
        ("45", 45.0),
        ("1:30", 90.0),
        ("01:02:03", 3723.0),
        ("0:05.5", 5.5),
        ("90:00", 5400.0),
    ] {
        let out = ExtractFrameExecutor
            .execute(ctx(&[
                ("video_url", Value::from("clip.mp4")),
                ("timestamp", Value::from(clock)),
            ]))
            .await
            .unwrap();
        assert_eq!(out, Value::from(format!("clip.mp4#frame={seconds}")), "clock {clock}");
    }
}

#[tokio::test]
async fn test_frame_rejects_negative_and_garbage_timestamps() {
    for bad in [
        Value::Number(-1.0),
        Value::from("later"),
        Value::from("1:2:3:4"),
        Value::from("1:99"),
        Value::from("1:60:05"),
    ] {
        let err = ExtractFrameExecutor
            .execute(ctx(&[
                ("video_url", Value::from("clip.mp4")),
                ("timestamp", bad),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::UnsupportedTimestampFormat(_)));
    }
}

#[tokio::test]
async fn test_frame_without_video_fails() {
    let err = ExtractFrameExecutor.execute(ctx(&[])).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingVideo));
}

// --- llm --------------------------------------------------------------------

/// Records the request it receives and answers with a canned response
struct RecordingClient {
    seen: Mutex<Vec<LlmRequest>>,
    response: LlmResponse,
}

impl RecordingClient {
    fn new(text: &str, tokens: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            response: LlmResponse {
                text: text.to_string(),
                tokens,
            },
        })
    }

    fn last_request(&self) -> LlmRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LlmClient for RecordingClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, NodeError> {
        self.seen.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn test_llm_emits_text_and_token_count() {
    let client = RecordingClient::new("a cat", Some(42));
    let executor = LlmExecutor::new(client);

    let out = executor
        .execute(ctx(&[("user_message", Value::from("describe"))]))
        .await
        .unwrap();

    let object = out.as_object().unwrap();
    assert_eq!(object.get("text"), Some(&Value::from("a cat")));
    assert_eq!(object.get("tokens"), Some(&Value::Number(42.0)));
    assert_eq!(out.as_text(), Some("a cat"), "chains into downstream text inputs");
}

#[tokio::test]
async fn test_llm_without_user_message_fails_before_calling_the_provider() {
    let client = RecordingClient::new("unused", None);
    let executor = LlmExecutor::new(client.clone());

    let err = executor.execute(ctx(&[])).await.unwrap_err();

    assert!(matches!(err, NodeError::MissingMessage));
    assert!(client.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_llm_defaults_the_model() {
    let client = RecordingClient::new("ok", None);
    let executor = LlmExecutor::new(client.clone());

    executor
        .execute(ctx(&[("user_message", Value::from("hi"))]))
        .await
        .unwrap();

    assert_eq!(client.last_request().model, DEFAULT_MODEL);
}

#[tokio::test]
async fn test_llm_forwards_prompt_model_and_images() {
    let client = RecordingClient::new("ok", None);
    let executor = LlmExecutor::new(client.clone());

    executor
        .execute(ctx(&[
            ("user_message", Value::from("compare these")),
            ("system_prompt", Value::from("be terse")),
            ("model", Value::from("gemini-1.5-pro")),
            (
                "images",
                Value::Array(vec![Value::from("a.png"), Value::from("b.png")]),
            ),
        ]))
        .await
        .unwrap();

    let request = client.last_request();
    assert_eq!(request.user_message, "compare these");
    assert_eq!(request.system_prompt.as_deref(), Some("be terse"));
    assert_eq!(request.model, "gemini-1.5-pro");
    assert_eq!(request.images, vec!["a.png", "b.png"]);
}

#[tokio::test]
async fn test_llm_missing_tokens_serializes_as_null() {
    let client = RecordingClient::new("ok", None);
    let executor = LlmExecutor::new(client);

    let out = executor
        .execute(ctx(&[("user_message", Value::from("hi"))]))
        .await
        .unwrap();

    assert_eq!(out.as_object().unwrap().get("tokens"), Some(&Value::Null));
}

#[tokio::test]
async fn test_llm_accepts_structured_upstream_text() {
    // Output of one llm node wired into the user_message of another.
    let client = RecordingClient::new("ok", None);
    let executor = LlmExecutor::new(client.clone());

    let mut upstream = HashMap::new();
    upstream.insert("text".to_string(), Value::from("previous answer"));
    upstream.insert("tokens".to_string(), Value::Number(7.0));

    executor
        .execute(ctx(&[("user_message", Value::Object(upstream))]))
        .await
        .unwrap();

    assert_eq!(client.last_request().user_message, "previous answer");
}

#[tokio::test]
async fn test_llm_provider_errors_propagate() {
    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, NodeError> {
            Err(NodeError::UpstreamUnavailable("503".to_string()))
        }
    }

    let executor = LlmExecutor::new(Arc::new(FailingClient));
    let err = executor
        .execute(ctx(&[("user_message", Value::from("hi"))]))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::UpstreamUnavailable(_)));
}
