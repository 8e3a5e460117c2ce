use crate::e2e::helpers::{self, MockSpeechServer, Reply};

use gpt4o_tts::domain::tts::{
    AudioFormat, CallOptions, ClientConfig, Provider, ReloadableTtsService, TtsServiceApi,
};

#[tokio::test]
async fn it_should_send_new_calls_to_reloaded_configuration() {
    let first = MockSpeechServer::start(Reply::Raw(vec![b"first".to_vec()])).await;
    let second = MockSpeechServer::start(Reply::Raw(vec![b"second".to_vec()])).await;
    let service = ReloadableTtsService::new(helpers::service(first.openai_config()));

    let before = service.synthesize("hello", &CallOptions::new()).await.unwrap();
    service
        .reload_from_config(
            second
                .openai_config()
                .with_voice("nova")
                .with_audio_output(AudioFormat::Flac),
        )
        .unwrap();
    let after = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    assert_eq!(before.data(), b"first");
    assert_eq!(after.data(), b"second");
    assert_eq!(after.format(), AudioFormat::Flac);
    assert_eq!(first.requests().len(), 1);
    assert_eq!(second.single_request().body["voice"], "nova");
}

#[tokio::test]
async fn it_should_let_in_flight_instance_finish_after_reload() {
    let first = MockSpeechServer::start(Reply::Raw(vec![b"first".to_vec()])).await;
    let second = MockSpeechServer::start(Reply::Raw(vec![b"second".to_vec()])).await;
    let service = ReloadableTtsService::new(helpers::service(first.openai_config()));

    let in_flight = service.current();
    service.reload(helpers::service(second.openai_config()));

    let old = in_flight.synthesize("hello", &CallOptions::new()).await.unwrap();
    let new = service.synthesize("hello", &CallOptions::new()).await.unwrap();

    assert_eq!(old.data(), b"first");
    assert_eq!(new.data(), b"second");
}

#[tokio::test]
async fn it_should_keep_serving_when_reload_is_invalid() {
    let server = MockSpeechServer::start(Reply::Raw(vec![b"audio".to_vec()])).await;
    let service = ReloadableTtsService::new(helpers::service(server.openai_config()));

    let reload = service.reload_from_config(ClientConfig::new(Provider::Azure, "key"));

    assert!(reload.is_err());
    assert!(service
        .synthesize("hello", &CallOptions::new())
        .await
        .is_some());
}
