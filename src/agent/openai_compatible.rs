use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::interface::{Agent, AgentLibrary, AgentSpec, GenerationParams, LibraryMessage};
use crate::agent::output_types::Completion;
use crate::agent::tools::{registry_from_names, ToolRegistry};

/// Agent library backed by any OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAICompatibleLibrary {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tools: Vec<String>,
}

impl OpenAICompatibleLibrary {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        tools: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        // Fail at startup rather than on first initialize_agent
        let registry = registry_from_names(&tools)?;
        if registry.is_empty() {
            warn!("No tools configured; execute_tool will report every tool as missing");
        }
        for name in registry.names() {
            if let Some(tool) = registry.get(name) {
                debug!("Tool available: {} - {}", name, tool.description());
            }
        }

        info!(
            "Initialized OpenAICompatibleLibrary: base_url={}, tools={:?}",
            base_url, tools
        );
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            tools,
        })
    }
}

impl AgentLibrary for OpenAICompatibleLibrary {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    fn create_agent(&self, spec: AgentSpec) -> Result<Box<dyn Agent>> {
        let name = spec.name.trim().to_string();
        let model = spec.model.trim().to_string();
        if name.is_empty() {
            anyhow::bail!("agent name must not be empty");
        }
        if model.is_empty() {
            anyhow::bail!("model name must not be empty");
        }

        Ok(Box::new(OpenAICompatibleAgent {
            name,
            description: spec.description.trim().to_string(),
            model,
            tools: registry_from_names(&self.tools)?,
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        }))
    }
}

pub struct OpenAICompatibleAgent {
    name: String,
    description: String,
    model: String,
    tools: ToolRegistry,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a LibraryMessage> for ChatMessage<'a> {
    fn from(message: &'a LibraryMessage) -> Self {
        let name = match message {
            LibraryMessage::Function { name, .. } => Some(name.as_str()),
            _ => None,
        };
        Self {
            role: message.role(),
            content: message.content(),
            name,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAICompatibleAgent {
    fn build_request<'a>(
        &'a self,
        messages: &'a [LibraryMessage],
        params: &'a GenerationParams,
    ) -> ChatCompletionRequest<'a> {
        let mut chat_messages = Vec::with_capacity(messages.len() + 1);

        // The description acts as the system prompt unless the caller sent one
        let has_system = messages
            .iter()
            .any(|m| matches!(m, LibraryMessage::System { .. }));
        if !has_system && !self.description.is_empty() {
            chat_messages.push(ChatMessage {
                role: "system",
                content: &self.description,
                name: None,
            });
        }
        chat_messages.extend(messages.iter().map(ChatMessage::from));

        ChatCompletionRequest {
            model: &self.model,
            messages: chat_messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stop: params.stop.as_deref(),
        }
    }
}

#[async_trait]
impl Agent for OpenAICompatibleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    async fn generate(
        &self,
        messages: Vec<LibraryMessage>,
        params: GenerationParams,
    ) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(&messages, &params);
        debug!("POST {} ({} messages)", url, body.messages.len());

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("POST {}", url))?
            .error_for_status()?;
        let result: ChatCompletionResponse = response
            .json()
            .await
            .context("Malformed chat completion response")?;

        let content = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion response contained no choices"))?
            .message
            .content
            .unwrap_or_default();
        Ok(Completion::new(content))
    }
}
