use crate::agent::Agent;

/// Per-session state: the one live agent handle, if any.
///
/// Created empty, filled by `initialize_agent`, and overwritten by any later
/// `initialize_agent`. Never cleared.
#[derive(Default)]
pub struct Session {
    agent: Option<Box<dyn Agent>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(&self) -> Option<&dyn Agent> {
        self.agent.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.agent.is_some()
    }

    /// Install `agent`, returning the handle it replaces.
    pub fn replace_agent(&mut self, agent: Box<dyn Agent>) -> Option<Box<dyn Agent>> {
        self.agent.replace(agent)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("agent", &self.agent.as_ref().map(|a| a.name()))
            .finish()
    }
}
