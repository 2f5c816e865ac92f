//! Deterministic placeholder outputs used when no agent library is available
//! or no agent has been initialized yet.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use crate::agent::input_types::{
    AgentSettings, Message, Role, DEFAULT_AGENT_NAME, DEMO_DESCRIPTION, DEMO_MODEL,
};
use crate::agent::output_types::AgentDescriptor;

/// How much of the user's message is quoted back
pub const PREVIEW_CHARS: usize = 50;

pub fn agent_descriptor(settings: AgentSettings) -> AgentDescriptor {
    AgentDescriptor {
        name: settings
            .agent_name
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
        description: settings
            .description
            .unwrap_or_else(|| DEMO_DESCRIPTION.to_string()),
        model: settings.model_name.unwrap_or_else(|| DEMO_MODEL.to_string()),
        demo: true,
    }
}

pub fn completion(messages: &[Message]) -> String {
    let user_message = messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("");
    let preview: String = user_message.chars().take(PREVIEW_CHARS).collect();

    format!(
        "Demo response to: '{}...'\n\n\
         This is a demo response because the agent library is not available. \
         Configure an agent library for full functionality.",
        preview
    )
}

pub fn tool_execution(tool_name: &str, params: &Map<String, Value>) -> String {
    let params_json = spaced_json(params);
    format!(
        "Demo tool execution for: {}\nParameters: {}\n\n\
         This is a demo response because the agent library is not available.",
        tool_name, params_json
    )
}

/// Single-line JSON with `", "` and `": "` separators and non-ASCII escaped
/// as `\uXXXX`: `{"q": "caf\u00e9"}`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

fn spaced_json(params: &Map<String, Value>) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if params.serialize(&mut serializer).is_err() {
        return "{}".to_string();
    }
    // only ASCII is written
    String::from_utf8_lossy(&buf).into_owned()
}
