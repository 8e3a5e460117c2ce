use crate::e2e::helpers::{self, MockSpeechServer, Reply, TEST_API_KEY};

use futures::StreamExt;
use gpt4o_tts::domain::tts::{CallOptions, ClientConfig, Provider, TtsServiceApi};
use serde_json::json;
use std::time::Duration;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn it_should_redact_api_key_from_upstream_error() {
    let body = json!({
        "error": {
            "message": format!("Incorrect API key provided: {}. Check your key.", TEST_API_KEY),
            "type": "invalid_request_error",
            "code": "invalid_api_key"
        }
    })
    .to_string();
    let server = MockSpeechServer::start(Reply::Status(401, body)).await;
    let service = helpers::service(server.openai_config());

    let result = service.synthesize("hello", &CallOptions::new()).await;

    assert!(result.is_none());
    assert!(logs_contain("Speech API rejected request"));
    assert!(logs_contain("Incorrect API key provided: sk-***"));
    assert!(!logs_contain(TEST_API_KEY));
}

#[tokio::test]
#[traced_test]
async fn it_should_redact_plain_text_error_body() {
    let body = format!("upstream proxy refused key {}", TEST_API_KEY);
    let server = MockSpeechServer::start(Reply::Status(502, body)).await;
    let service = helpers::service(server.openai_config());

    assert!(service.synthesize("hello", &CallOptions::new()).await.is_none());
    assert!(logs_contain("upstream proxy refused key sk-***"));
    assert!(!logs_contain(TEST_API_KEY));
}

#[tokio::test]
async fn it_should_yield_no_chunks_on_rejection() {
    let server = MockSpeechServer::start(Reply::Status(429, "slow down".to_string())).await;
    let service = helpers::service(server.openai_config());

    let (_, stream) = service.synthesize_stream("hello", &CallOptions::new());
    let chunks: Vec<_> = stream.collect().await;

    assert!(chunks.is_empty());
    assert!(service
        .synthesize_handle("hello", &CallOptions::new())
        .await
        .is_none());
}

#[tokio::test]
async fn it_should_return_none_when_connection_is_refused() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(Provider::OpenAi, TEST_API_KEY)
        .with_endpoint(format!("http://{}/v1/audio/speech", addr));
    let service = helpers::service(config);

    assert!(service.synthesize("hello", &CallOptions::new()).await.is_none());
    assert!(service
        .synthesize_handle("hello", &CallOptions::new())
        .await
        .is_none());
}

#[tokio::test]
#[traced_test]
async fn it_should_return_none_on_timeout() {
    let server = MockSpeechServer::start(Reply::Slow(Duration::from_secs(5))).await;
    let config = server
        .openai_config()
        .with_request_timeout(Duration::from_millis(200));
    let service = helpers::service(config);

    let started = std::time::Instant::now();
    let result = service.synthesize("hello", &CallOptions::new()).await;

    assert!(result.is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(logs_contain("Speech request timed out"));
}

#[tokio::test]
async fn it_should_fail_to_build_azure_client_without_endpoint() {
    let config = ClientConfig::new(Provider::Azure, TEST_API_KEY);
    assert!(gpt4o_tts::domain::tts::TtsService::from_config(config).is_err());
}
