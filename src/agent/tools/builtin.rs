use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::{Tool, ToolArgs, ToolRegistry};

/// Names of every builtin tool, in registration order
pub const BUILTIN_TOOLS: &[&str] = &["echo", "current_time", "word_count"];

/// Look up a builtin tool by name
pub fn builtin_tool(name: &str) -> Option<Arc<dyn Tool>> {
    match name {
        "echo" => Some(Arc::new(EchoTool)),
        "current_time" => Some(Arc::new(CurrentTimeTool)),
        "word_count" => Some(Arc::new(WordCountTool)),
        _ => None,
    }
}

/// Build a registry from builtin tool names. Unknown names are an error.
pub fn registry_from_names<I, S>(names: I) -> Result<ToolRegistry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut registry = ToolRegistry::new();
    for name in names {
        let name = name.as_ref();
        let tool = builtin_tool(name).ok_or_else(|| anyhow!("Unknown builtin tool: {}", name))?;
        registry.register(tool);
    }
    Ok(registry)
}

/// Returns its keyword arguments unchanged.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Return the given arguments unchanged"
    }

    async fn call(&self, mut args: ToolArgs) -> Result<Value> {
        Ok(Value::Object(args.take_all()))
    }
}

/// Current UTC time, RFC 3339 by default or formatted with strftime syntax.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Current UTC time; optional `format` in strftime syntax"
    }

    async fn call(&self, mut args: ToolArgs) -> Result<Value> {
        let format = args.optional_str("format")?;
        args.finish()?;

        let now = Utc::now();
        let text = match format {
            Some(fmt) => {
                use std::fmt::Write;
                let mut out = String::new();
                // chrono reports a bad specifier through fmt::Error
                write!(out, "{}", now.format(&fmt))
                    .map_err(|_| anyhow!("invalid time format: {}", fmt))?;
                out
            }
            None => now.to_rfc3339(),
        };
        Ok(Value::String(text))
    }
}

pub struct WordCountTool;

#[async_trait]
impl Tool for WordCountTool {
    fn name(&self) -> &str {
        "word_count"
    }

    fn description(&self) -> &str {
        "Count words and characters in `text`"
    }

    async fn call(&self, mut args: ToolArgs) -> Result<Value> {
        let text = args.required_str("text")?;
        args.finish()?;

        Ok(json!({
            "words": text.split_whitespace().count(),
            "characters": text.chars().count(),
        }))
    }
}
