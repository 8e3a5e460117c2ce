use anyhow::Context;
use futures::StreamExt;
use gpt4o_tts::domain::tts::{CallOptions, StreamFormat, TtsService, TtsServiceApi};
use gpt4o_tts::infrastructure::config::{Config, LogFormat};
use gpt4o_tts::infrastructure::ffmpeg::FfmpegTranscoder;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        provider = config.client.provider.display_name(),
        model = %config.client.model,
        voice = %config.client.voice,
        format = %config.client.audio_output,
        stream_format = %config.client.stream_format,
        "Starting gpt4o-tts"
    );

    let text = read_input().await?;

    let mut service =
        TtsService::from_config(config.client.clone()).context("Failed to initialise TTS client")?;
    match FfmpegTranscoder::detect(&config.ffmpeg_path) {
        Some(transcoder) => service = service.with_transcoder(Arc::new(transcoder)),
        None => tracing::info!(
            ffmpeg = %config.ffmpeg_path,
            "FFmpeg not found; compressed audio will not be volume-adjusted"
        ),
    }

    let options = CallOptions::new();
    let written = match config.client.stream_format {
        StreamFormat::Audio => write_buffered(&service, &text, &options, &config).await?,
        StreamFormat::Sse => write_streamed(&service, &text, &options, &config).await?,
    };

    tracing::info!(
        path = %config.output_path.display(),
        audio_size_bytes = written,
        "Audio written"
    );

    Ok(())
}

async fn write_buffered(
    service: &TtsService,
    text: &str,
    options: &CallOptions,
    config: &Config,
) -> anyhow::Result<usize> {
    let audio = service
        .synthesize(text, options)
        .await
        .context("No audio was produced")?;

    tokio::fs::write(&config.output_path, audio.data())
        .await
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;
    Ok(audio.data().len())
}

async fn write_streamed(
    service: &TtsService,
    text: &str,
    options: &CallOptions,
    config: &Config,
) -> anyhow::Result<usize> {
    let mut handle = service
        .synthesize_handle(text, options)
        .await
        .context("No audio stream was produced")?;

    let mut file = tokio::fs::File::create(&config.output_path)
        .await
        .with_context(|| format!("Failed to create {}", config.output_path.display()))?;

    let mut written = 0;
    while let Some(chunk) = handle.stream.next().await {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    anyhow::ensure!(written > 0, "No audio was produced");
    Ok(written)
}

/// Text comes from the arguments, or stdin when there are none
async fn read_input() -> anyhow::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let text = if args.is_empty() {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read text from stdin")?;
        buffer
    } else {
        args.join(" ")
    };

    anyhow::ensure!(!text.trim().is_empty(), "Nothing to synthesize");
    Ok(text)
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "gpt4o_tts=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "gpt4o_tts=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
