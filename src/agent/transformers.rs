// Translation from caller-facing types into the agent library's own types

use tracing::debug;

use crate::agent::input_types::{CompletionOptions, Message, Role};
use crate::agent::interface::{GenerationParams, LibraryMessage};

/// Name given to function/tool messages that arrive without one
pub const DEFAULT_FUNCTION_NAME: &str = "function";

/// Translate one message by role. Messages with an unrecognized role have no
/// library counterpart and translate to `None`.
pub fn to_library_message(message: &Message) -> Option<LibraryMessage> {
    let content = message.content.clone();
    match &message.role {
        Role::System => Some(LibraryMessage::System { content }),
        Role::User => Some(LibraryMessage::User { content }),
        Role::Assistant => Some(LibraryMessage::Assistant { content }),
        Role::Function | Role::Tool => Some(LibraryMessage::Function {
            content,
            name: message
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_string()),
        }),
        Role::Other(role) => {
            debug!("Skipping message with unsupported role: {}", role);
            None
        }
    }
}

/// Translate a conversation, preserving order.
pub fn to_library_messages(messages: &[Message]) -> Vec<LibraryMessage> {
    messages.iter().filter_map(to_library_message).collect()
}

pub fn to_generation_params(options: CompletionOptions) -> GenerationParams {
    GenerationParams {
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        stop: options.stop.map(|s| s.into_vec()),
    }
}
