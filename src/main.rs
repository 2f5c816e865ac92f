mod agent;
mod bridge;
mod config;
mod error;
mod handlers;
mod protocol;
mod state;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agent::BackendFactory;
use config::{Config, SessionMode};
use handlers::Dispatcher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout carries the response document only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent_bridge=warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::discover();
    let backend = BackendFactory::create_backend_or_demo(&config.library);
    info!(
        "Agent bridge ready: backend={}, session_mode={:?}",
        backend.name(),
        config.bridge.session_mode
    );

    let mut dispatcher = Dispatcher::new(backend);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    match config.bridge.session_mode {
        SessionMode::Single => bridge::serve_once(&mut dispatcher, stdin.lock(), stdout.lock()).await,
        SessionMode::Lines => bridge::serve_lines(&mut dispatcher, stdin.lock(), stdout.lock()).await,
    }
}
