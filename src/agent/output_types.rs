use serde::{Deserialize, Serialize};

/// What `initialize_agent` reports back about the agent it set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub model: String,
    /// True when no agent library backs this descriptor
    pub demo: bool,
}

impl AgentDescriptor {
    /// Describe a live agent by what it reports about itself.
    pub fn from_agent(agent: &dyn super::Agent) -> Self {
        Self {
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            model: agent.model().to_string(),
            demo: false,
        }
    }
}

/// Result of a single generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
