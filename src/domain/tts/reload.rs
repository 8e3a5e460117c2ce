use super::dto::{CallOptions, SynthesizedAudio};
use super::service::{AudioStreamHandle, TtsService, TtsServiceApi};
use super::settings::ClientConfig;
use crate::error::AppResult;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;

/// A [`TtsService`] that can be swapped for a freshly configured one.
///
/// Each call loads the current instance once and keeps it for its whole
/// lifetime, so a reload never changes the settings of a request in flight.
pub struct ReloadableTtsService {
    current: ArcSwap<TtsService>,
}

impl ReloadableTtsService {
    pub fn new(service: TtsService) -> Self {
        Self {
            current: ArcSwap::from_pointee(service),
        }
    }

    pub fn current(&self) -> Arc<TtsService> {
        self.current.load_full()
    }

    pub fn reload(&self, service: TtsService) {
        self.current.store(Arc::new(service));
    }

    /// Rebuild from new settings, keeping the current transcoder.
    ///
    /// On error the running instance is left in place.
    pub fn reload_from_config(&self, config: ClientConfig) -> AppResult<()> {
        let mut service = TtsService::from_config(config)?;
        if let Some(transcoder) = self.current().transcoder() {
            service = service.with_transcoder(transcoder);
        }
        tracing::info!(
            provider = %service.config().provider,
            model = %service.config().model,
            voice = %service.config().voice,
            "TTS client reloaded"
        );
        self.reload(service);
        Ok(())
    }
}

#[async_trait]
impl TtsServiceApi for ReloadableTtsService {
    async fn synthesize(&self, text: &str, options: &CallOptions) -> Option<SynthesizedAudio> {
        let service = self.current();
        service.synthesize(text, options).await
    }

    async fn synthesize_handle(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Option<AudioStreamHandle> {
        let service = self.current();
        service.synthesize_handle(text, options).await
    }
}
