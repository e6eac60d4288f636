//! Nexus Renal: CKD risk prediction service.
//!
//! Main entry point for the HTTP server.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nexus_renal::adapters::http::router;
use nexus_renal::adapters::sanitize::SanitizingMakeWriter;
use nexus_renal::adapters::PipelineAdapter;
use nexus_renal::application::InferenceService;
use nexus_renal::config::{Config, LogMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    let (writer, _guard) = match &config.log_mode {
        LogMode::File(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: a missing directory is reported by the open below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("failed to open log file {log_file:?}"))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Nexus Renal...");

    // Loaded once; a failure only disables /predict.
    let service = InferenceService::from_load_result(PipelineAdapter::load(
        &config.model_path,
        config.model_sha256.as_deref(),
    ));
    if !service.is_ready() {
        tracing::warn!(
            "No usable pipeline at {:?}; /predict will fail until the service is restarted with a valid artifact",
            config.model_path
        );
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Nexus Renal shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
