// src/main.rs

use std::process::ExitCode;

use exam_cache::config::Config;
use exam_cache::{GatewayError, HttpGateway, Session};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "exam-cache.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Hydrates subjects, users and every subject's exams, then logs a summary.
async fn run(config: &Config) -> Result<(), GatewayError> {
    let gateway = HttpGateway::new(config)?;
    tracing::info!("Syncing from {}", gateway.base_url());

    let session = Session::new(gateway);

    let (subjects, users) = tokio::join!(session.fetch_subjects(), session.fetch_users());
    let subjects = subjects?;
    users?;

    for subject in &subjects {
        let exams = session.fetch_exams(&subject.id).await?;
        tracing::info!("Subject '{}' has {} exam(s)", subject.name, exams.len());
    }

    session.read(|state| {
        tracing::info!(
            subjects = state.subjects.store.len(),
            exams = state.exams.store.len(),
            users = state.users.store.len(),
            "Local mirror hydrated"
        );
        for (kind, status) in state.statuses() {
            tracing::debug!("{} status: {:?}", kind, status);
        }
    });

    Ok(())
}
