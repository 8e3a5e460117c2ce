use crate::e2e::helpers::{self, fixtures, MockSpeechServer, Reply, TEST_API_KEY};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use gpt4o_tts::domain::tts::{AudioFormat, CallOptions, TtsServiceApi};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn it_should_return_configured_format_and_raw_audio() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let service = helpers::service(server.openai_config());

    let audio = service
        .synthesize("hello", &CallOptions::new())
        .await
        .expect("Expected audio");

    assert_eq!(audio.format(), AudioFormat::Mp3);
    assert_eq!(audio.data(), b"audio");

    let request = server.single_request();
    assert_eq!(
        request.body,
        json!({
            "model": "gpt-4o-mini-tts",
            "voice": "sage",
            "input": "hello",
            "response_format": "mp3",
            "speed": 1.0,
            "stream_format": "audio"
        })
    );
}

#[tokio::test]
async fn it_should_send_bearer_token_for_openai() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let service = helpers::service(server.openai_config());

    service.synthesize("hello", &CallOptions::new()).await.unwrap();

    let request = server.single_request();
    let expected = format!("Bearer {}", TEST_API_KEY);
    assert_eq!(request.header("authorization"), Some(expected.as_str()));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("api-key"), None);
}

#[tokio::test]
async fn it_should_send_api_key_header_for_azure() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let service = helpers::service(server.azure_config());

    service.synthesize("hello", &CallOptions::new()).await.unwrap();

    let request = server.single_request();
    assert_eq!(request.header("api-key"), Some(TEST_API_KEY));
    assert_eq!(request.header("authorization"), None);
}

#[tokio::test]
async fn it_should_merge_call_options_over_configuration() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let config = server
        .openai_config()
        .with_voice("alloy")
        .with_instructions("Speak like a pirate");
    let service = helpers::service(config);

    let options = CallOptions::new()
        .with_voice("nova")
        .with_instructions("")
        .with_audio_output("opus")
        .with_playback_speed(1.5);
    let audio = service.synthesize("hello", &options).await.unwrap();

    assert_eq!(audio.format(), AudioFormat::Opus);
    let body = server.single_request().body;
    assert_eq!(body["voice"], "nova");
    assert_eq!(body["instructions"], "Speak like a pirate");
    assert_eq!(body["response_format"], "opus");
    assert_eq!(body["speed"], 1.5);
}

#[tokio::test]
async fn it_should_omit_instructions_for_tts_1() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let config = server
        .openai_config()
        .with_model("tts-1")
        .with_instructions("Speak like a pirate");
    let service = helpers::service(config);

    service.synthesize("hello", &CallOptions::new()).await.unwrap();

    let body = server.single_request().body;
    assert_eq!(body["model"], "tts-1");
    assert!(body.get("instructions").is_none());
}

#[tokio::test]
async fn it_should_reassemble_chunked_body_in_order() {
    let big: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    let pieces = vec![b"head-".to_vec(), Vec::new(), big.clone(), b"-tail".to_vec()];
    let server = MockSpeechServer::start(Reply::Raw(pieces)).await;
    let service = helpers::service(server.openai_config());

    let audio = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    let mut expected = b"head-".to_vec();
    expected.extend_from_slice(&big);
    expected.extend_from_slice(b"-tail");
    assert_eq!(audio.data().len(), expected.len());
    assert!(audio.data() == expected.as_slice());
}

#[tokio::test]
async fn it_should_apply_gain_to_wav_audio() {
    let wav = fixtures::wav16(&[1000, -1000, 20000, -20000]);
    let server = MockSpeechServer::start(Reply::Raw(vec![wav])).await;
    let config = server
        .openai_config()
        .with_audio_output(AudioFormat::Wav)
        .with_volume_gain(2.0);
    let service = helpers::service(config);

    let audio = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    let (spec, samples) = fixtures::read_wav16(audio.data());
    assert_eq!(spec, fixtures::WAV_SPEC);
    assert_eq!(samples, vec![2000, -2000, i16::MAX, i16::MIN]);
}

#[tokio::test]
async fn it_should_prefer_call_gain_over_configured_gain() {
    let pcm = fixtures::pcm16(&[1000, -1000]);
    let server = MockSpeechServer::start(Reply::Raw(vec![pcm])).await;
    let config = server
        .openai_config()
        .with_audio_output(AudioFormat::Pcm)
        .with_volume_gain(3.0);
    let service = helpers::service(config);

    let audio = service
        .synthesize("hello", &CallOptions::new().with_volume_gain("0.5"))
        .await
        .unwrap();

    assert_eq!(fixtures::unpack_pcm16(audio.data()), vec![500, -500]);
}

#[tokio::test]
async fn it_should_decode_base64_wrapped_pcm() {
    let pcm = fixtures::pcm16(&[0, 1, -1, 32767, -32768, 1234]);
    let wrapped = BASE64.encode(&pcm).into_bytes();
    let server = MockSpeechServer::start(Reply::Raw(vec![wrapped])).await;
    let config = server.openai_config().with_audio_output(AudioFormat::Pcm);
    let service = helpers::service(config);

    let audio = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    assert_eq!(audio.data(), pcm.as_slice());
}

#[tokio::test]
async fn it_should_decode_json_wrapped_audio() {
    let mp3 = vec![0xFFu8, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00, 0x01];
    let body = json!({ "audio": BASE64.encode(&mp3) }).to_string().into_bytes();
    let server = MockSpeechServer::start(Reply::Raw(vec![body])).await;
    let service = helpers::service(server.openai_config());

    let audio = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    assert_eq!(audio.data(), mp3.as_slice());
}

#[tokio::test]
async fn it_should_not_call_upstream_for_blank_text() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let service = helpers::service(server.openai_config());

    assert!(service.synthesize("  \n ", &CallOptions::new()).await.is_none());
    assert!(server.requests().is_empty());
}
