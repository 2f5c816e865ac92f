//! Wire types for the one-document-in, one-document-out exchange.
//!
//! Request: `{"action": "ping" | "initialize_agent" | ..., "data": {...}}`
//! Response: `{"success": true, "data": ...}` or
//! `{"success": false, "error": "...", "traceback": "..."}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// The closed set of operations a caller can select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ping,
    InitializeAgent,
    GenerateCompletion,
    ExecuteTool,
    /// Raw selector text of anything outside the set above.
    Unknown(String),
}

impl Action {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(name)) => Self::from_name(name),
            Some(other) => Action::Unknown(other.to_string()),
            None => Action::Unknown(Value::Null.to_string()),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "ping" => Action::Ping,
            "initialize_agent" => Action::InitializeAgent,
            "generate_completion" => Action::GenerateCompletion,
            "execute_tool" => Action::ExecuteTool,
            other => Action::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Ping => "ping",
            Action::InitializeAgent => "initialize_agent",
            Action::GenerateCompletion => "generate_completion",
            Action::ExecuteTool => "execute_tool",
            Action::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded request. `data` is kept untyped until the handler for `action`
/// decodes the shape it expects.
#[derive(Debug, Clone)]
pub struct Request {
    pub action: Action,
    pub data: Value,
}

impl Request {
    pub fn new(action: Action, data: Value) -> Self {
        Self { action, data }
    }

    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        let Value::Object(mut fields) = value else {
            return Err(BridgeError::Unexpected(
                "request must be a JSON object".to_string(),
            ));
        };

        let action = Action::from_value(fields.get("action"));
        let data = match fields.remove("data") {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(data) => data,
        };

        Ok(Self { action, data })
    }

    /// Decode `data` into the payload type of this request's action.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        T::deserialize(&self.data).map_err(|e| BridgeError::InvalidRequest {
            action: self.action.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            traceback: None,
        }
    }

    pub fn from_error(error: &BridgeError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            traceback: error.traceback().map(str::to_string),
        }
    }

    /// Serialize to the single-line wire form.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            Err(e) => serde_json::json!({
                "success": false,
                "error": format!("Unexpected error: {}", e),
            })
            .to_string(),
        }
    }
}
