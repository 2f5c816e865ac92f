use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Number;

pub const DEFAULT_AGENT_NAME: &str = "Agent Nexus";
pub const DEFAULT_DESCRIPTION: &str = "An advanced cognitive agent architecture";
pub const DEFAULT_MODEL: &str = "gpt-4";

pub const DEMO_DESCRIPTION: &str = "Demo Agent (agent library not available)";
pub const DEMO_MODEL: &str = "demo-model";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Conversational role of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
    Tool,
    /// Any role outside the known set; kept so the message still decodes
    Other(String),
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "function" => Role::Function,
            "tool" => Role::Tool,
            _ => Role::Other(role),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::System => "system".to_string(),
            Role::User => "user".to_string(),
            Role::Assistant => "assistant".to_string(),
            Role::Function => "function".to_string(),
            Role::Tool => "tool".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// A single conversational message as sent by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// `null` (assistant tool-call turns) decodes as empty text
    #[serde(deserialize_with = "null_as_empty")]
    pub content: String,
    /// Function/tool name for `function` and `tool` messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }
}

/// Stop sequences may be given as a single string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

impl StopSequences {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StopSequences::One(s) => vec![s],
            StopSequences::Many(v) => v,
        }
    }
}

/// Options accepted by `generate_completion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens", deserialize_with = "lenient_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub stop: Option<StopSequences>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any non-negative JSON number. Fractions are truncated and values past
/// `u32::MAX` saturate; `null` means the default.
fn lenient_max_tokens<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(DEFAULT_MAX_TOKENS);
    };
    if let Some(n) = number.as_u64() {
        return Ok(u32::try_from(n).unwrap_or(u32::MAX));
    }
    match number.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n as u32),
        _ => Err(de::Error::custom(format!(
            "maxTokens must be a non-negative number, got {}",
            number
        ))),
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stop: None,
        }
    }
}

/// Payload of `generate_completion`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub options: CompletionOptions,
}

/// Payload of `initialize_agent`. Every field is optional; defaults depend on
/// whether a real library is available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Payload of `execute_tool`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}
