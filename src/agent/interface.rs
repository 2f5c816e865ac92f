use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::agent::output_types::Completion;
use crate::agent::tools::ToolRegistry;

/// Arguments for constructing an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    pub model: String,
}

/// The library's own message representation, one variant per role family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
    Function { content: String, name: String },
}

impl LibraryMessage {
    pub fn role(&self) -> &'static str {
        match self {
            LibraryMessage::System { .. } => "system",
            LibraryMessage::User { .. } => "user",
            LibraryMessage::Assistant { .. } => "assistant",
            LibraryMessage::Function { .. } => "function",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            LibraryMessage::System { content }
            | LibraryMessage::User { content }
            | LibraryMessage::Assistant { content }
            | LibraryMessage::Function { content, .. } => content,
        }
    }
}

/// Sampling parameters passed through to a generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub stop: Option<Vec<String>>,
}

/// Entry point of an agent library: builds agents.
pub trait AgentLibrary: Send + Sync {
    /// Library name used in log output.
    fn name(&self) -> &str;

    /// Construct a new agent. Construction either fully succeeds or fails;
    /// no partially built agent is ever returned.
    fn create_agent(&self, spec: AgentSpec) -> anyhow::Result<Box<dyn Agent>>;
}

/// A configured conversational agent.
///
/// `name`, `description` and `model` report what the library actually set up,
/// which may differ from what was requested.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn model(&self) -> &str;

    /// Tools registered with this agent
    fn tools(&self) -> &ToolRegistry;

    fn has_tool(&self, name: &str) -> bool {
        self.tools().contains(name)
    }

    /// Run one blocking generation over the full conversation.
    async fn generate(
        &self,
        messages: Vec<LibraryMessage>,
        params: GenerationParams,
    ) -> anyhow::Result<Completion>;

    /// Invoke a registered tool with named arguments. The result is passed
    /// back to the caller uninterpreted.
    async fn execute_tool(&self, name: &str, args: Map<String, Value>) -> anyhow::Result<Value> {
        self.tools().execute(name, args).await
    }
}
