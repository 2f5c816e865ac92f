pub mod builtin;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use builtin::*;

/// A named capability an agent can invoke with keyword arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn call(&self, args: ToolArgs) -> Result<Value>;
}

/// Keyword arguments of a single tool call.
///
/// Arguments are consumed as the tool reads them; `finish` rejects anything
/// left over, the way an unexpected keyword argument would be rejected.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    tool: String,
    args: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }

    pub fn required(&mut self, key: &str) -> Result<Value> {
        self.args.remove(key).ok_or_else(|| {
            anyhow!(
                "{}() missing required argument: '{}'",
                self.tool,
                key
            )
        })
    }

    pub fn required_str(&mut self, key: &str) -> Result<String> {
        match self.required(key)? {
            Value::String(s) => Ok(s),
            other => Err(anyhow!(
                "{}() argument '{}' must be a string, got {}",
                self.tool,
                key,
                other
            )),
        }
    }

    pub fn optional_str(&mut self, key: &str) -> Result<Option<String>> {
        match self.args.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(anyhow!(
                "{}() argument '{}' must be a string, got {}",
                self.tool,
                key,
                other
            )),
        }
    }

    /// Take every remaining argument.
    pub fn take_all(&mut self) -> Map<String, Value> {
        std::mem::take(&mut self.args)
    }

    pub fn finish(self) -> Result<()> {
        match self.args.keys().next() {
            Some(key) => Err(anyhow!(
                "{}() got an unexpected keyword argument '{}'",
                self.tool,
                key
            )),
            None => Ok(()),
        }
    }
}

/// Tools available to one agent, keyed by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool already registered under its name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, args: Map<String, Value>) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| anyhow!("tool '{}' is not registered", name))?;
        tool.call(ToolArgs::new(name, args)).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
