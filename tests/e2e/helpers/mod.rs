use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use gpt4o_tts::domain::tts::{ClientConfig, Provider, TtsService};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub mod fixtures;

/// Credential-shaped key used by every test client
pub const TEST_API_KEY: &str = "sk-test1234567890abcdefXYZ";

const SPEECH_PATH: &str = "/v1/audio/speech";

/// What the mock endpoint answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given body pieces, sent as separate chunks
    Raw(Vec<Vec<u8>>),
    /// 200 `text/event-stream` with the given text pieces
    Sse(Vec<String>),
    /// Error status with a body
    Status(u16, String),
    /// Waits before answering `Raw(b"late")`
    Slow(Duration),
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Clone)]
struct MockState {
    reply: Arc<Reply>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct MockSpeechServer {
    pub url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockSpeechServer {
    pub async fn start(reply: Reply) -> Self {
        let state = MockState {
            reply: Arc::new(reply),
            captured: Arc::new(Mutex::new(Vec::new())),
        };
        let captured = state.captured.clone();

        let app = Router::new()
            .route(SPEECH_PATH, post(speech))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}{}", addr, SPEECH_PATH),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }

    /// The only request received; panics if there were none or several
    pub fn single_request(&self) -> CapturedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }

    /// OpenAI-flavoured client settings pointed at this server
    pub fn openai_config(&self) -> ClientConfig {
        ClientConfig::new(Provider::OpenAi, TEST_API_KEY).with_endpoint(self.url.clone())
    }

    pub fn azure_config(&self) -> ClientConfig {
        ClientConfig::new(Provider::Azure, TEST_API_KEY).with_endpoint(self.url.clone())
    }
}

async fn speech(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .captured
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, body });

    match state.reply.as_ref() {
        Reply::Raw(pieces) => chunked_response("application/octet-stream", pieces.clone()),
        Reply::Sse(pieces) => chunked_response(
            "text/event-stream",
            pieces.iter().map(|p| p.as_bytes().to_vec()).collect(),
        ),
        Reply::Status(status, body) => (
            StatusCode::from_u16(*status).unwrap(),
            body.clone(),
        )
            .into_response(),
        Reply::Slow(delay) => {
            tokio::time::sleep(*delay).await;
            chunked_response("application/octet-stream", vec![b"late".to_vec()])
        }
    }
}

fn chunked_response(content_type: &str, pieces: Vec<Vec<u8>>) -> Response {
    let stream = futures::stream::iter(pieces.into_iter().map(Ok::<_, std::io::Error>));
    Response::builder()
        .header("content-type", content_type)
        .body(Body::from_stream(stream))
        .unwrap()
}

/// A `speech.audio.delta` frame carrying `audio`
pub fn delta_frame(audio: &[u8]) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "type": "speech.audio.delta", "audio": BASE64.encode(audio) })
    )
}

pub fn done_frame() -> String {
    "data: {\"type\": \"speech.audio.done\"}\n\n".to_string()
}

pub fn service(config: ClientConfig) -> TtsService {
    TtsService::from_config(config).expect("Failed to build TTS service")
}
