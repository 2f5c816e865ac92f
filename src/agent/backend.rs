use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::agent::demo;
use crate::agent::input_types::{
    AgentSettings, CompletionOptions, Message, DEFAULT_AGENT_NAME, DEFAULT_DESCRIPTION,
    DEFAULT_MODEL,
};
use crate::agent::interface::{AgentLibrary, AgentSpec};
use crate::agent::output_types::AgentDescriptor;
use crate::agent::transformers::{to_generation_params, to_library_messages};
use crate::error::BridgeError;
use crate::state::Session;

/// What the dispatcher can ask of an agent, independent of whether a real
/// library sits behind it. Selected once at startup.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Backend name used in log output
    fn name(&self) -> &str;

    /// Whether a real agent library backs this backend
    fn is_demo(&self) -> bool;

    async fn initialize_agent(
        &self,
        session: &mut Session,
        settings: AgentSettings,
    ) -> Result<AgentDescriptor, BridgeError>;

    async fn generate_completion(
        &self,
        session: &Session,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<String, BridgeError>;

    async fn execute_tool(
        &self,
        session: &Session,
        tool_name: &str,
        params: Map<String, Value>,
    ) -> Result<Value, BridgeError>;
}

/// Backend used when no agent library is available
#[derive(Debug, Default)]
pub struct DemoBackend;

#[async_trait]
impl AgentBackend for DemoBackend {
    fn name(&self) -> &str {
        "demo"
    }

    fn is_demo(&self) -> bool {
        true
    }

    async fn initialize_agent(
        &self,
        _session: &mut Session,
        settings: AgentSettings,
    ) -> Result<AgentDescriptor, BridgeError> {
        Ok(demo::agent_descriptor(settings))
    }

    async fn generate_completion(
        &self,
        _session: &Session,
        messages: Vec<Message>,
        _options: CompletionOptions,
    ) -> Result<String, BridgeError> {
        Ok(demo::completion(&messages))
    }

    async fn execute_tool(
        &self,
        _session: &Session,
        tool_name: &str,
        params: Map<String, Value>,
    ) -> Result<Value, BridgeError> {
        Ok(Value::String(demo::tool_execution(tool_name, &params)))
    }
}

/// Backend that drives a real agent library
pub struct LibraryBackend {
    library: Arc<dyn AgentLibrary>,
}

impl LibraryBackend {
    pub fn new(library: Arc<dyn AgentLibrary>) -> Self {
        info!("Using agent library: {}", library.name());
        Self { library }
    }
}

#[async_trait]
impl AgentBackend for LibraryBackend {
    fn name(&self) -> &str {
        self.library.name()
    }

    fn is_demo(&self) -> bool {
        false
    }

    async fn initialize_agent(
        &self,
        session: &mut Session,
        settings: AgentSettings,
    ) -> Result<AgentDescriptor, BridgeError> {
        let spec = AgentSpec {
            name: settings
                .agent_name
                .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            description: settings
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            model: settings
                .model_name
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };
        info!("Initializing agent: {} (model={})", spec.name, spec.model);

        let agent = self
            .library
            .create_agent(spec)
            .map_err(BridgeError::InitializeAgent)?;
        let descriptor = AgentDescriptor::from_agent(agent.as_ref());

        if let Some(previous) = session.replace_agent(agent) {
            warn!(
                "Replacing previously initialized agent '{}' with '{}'",
                previous.name(),
                descriptor.name
            );
        }

        Ok(descriptor)
    }

    async fn generate_completion(
        &self,
        session: &Session,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<String, BridgeError> {
        let Some(agent) = session.agent() else {
            debug!("No agent initialized, answering with demo completion");
            return Ok(demo::completion(&messages));
        };

        let completion = agent
            .generate(to_library_messages(&messages), to_generation_params(options))
            .await
            .map_err(BridgeError::GenerateCompletion)?;
        Ok(completion.content)
    }

    async fn execute_tool(
        &self,
        session: &Session,
        tool_name: &str,
        params: Map<String, Value>,
    ) -> Result<Value, BridgeError> {
        let Some(agent) = session.agent() else {
            debug!("No agent initialized, answering with demo tool execution");
            return Ok(Value::String(demo::tool_execution(tool_name, &params)));
        };

        if !agent.has_tool(tool_name) {
            return Err(BridgeError::ToolNotFound(tool_name.to_string()));
        }

        agent
            .execute_tool(tool_name, params)
            .await
            .map_err(|error| BridgeError::ExecuteTool {
                tool: tool_name.to_string(),
                error,
            })
    }
}
