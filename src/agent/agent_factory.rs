use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::agent::backend::{AgentBackend, DemoBackend, LibraryBackend};
use crate::agent::openai_compatible::OpenAICompatibleLibrary;
use crate::config::LibraryConfig;

/// Factory for selecting the agent backend at startup
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend for the configured provider.
    ///
    /// # Arguments
    /// * `config` - Library section of the bridge configuration
    pub fn create_backend(config: &LibraryConfig) -> Result<Box<dyn AgentBackend>> {
        info!("Initializing agent backend: {}", config.provider);

        match config.provider.as_str() {
            "" | "demo" => Ok(Box::new(DemoBackend)),
            "openai_compatible" | "openai" | "ollama" | "deepseek" | "groq" | "mistral" => {
                let library = OpenAICompatibleLibrary::new(
                    config.base_url.clone(),
                    config.api_key.clone(),
                    config.tools.clone(),
                    config.timeout_secs.map(Duration::from_secs),
                )?;
                Ok(Box::new(LibraryBackend::new(Arc::new(library))))
            }
            _ => Err(anyhow::anyhow!(
                "Unsupported agent provider: {}",
                config.provider
            )),
        }
    }

    /// Like [`create_backend`](Self::create_backend), but never fails: any
    /// problem leaves the bridge running in demo mode.
    pub fn create_backend_or_demo(config: &LibraryConfig) -> Box<dyn AgentBackend> {
        let backend = Self::create_backend(config).unwrap_or_else(|e| {
            warn!("Agent library unavailable ({:#}), falling back to demo mode", e);
            Box::new(DemoBackend)
        });
        if backend.is_demo() {
            warn!("Agent library not configured. Running in compatibility mode.");
        }
        backend
    }
}
