//! Scripted in-memory agent library for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::agent::interface::{Agent, AgentLibrary, AgentSpec, GenerationParams, LibraryMessage};
use crate::agent::output_types::Completion;
use crate::agent::tools::{registry_from_names, ToolRegistry};

/// How fake agents behave
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub reply: String,
    /// Model name the library reports instead of the requested one
    pub normalize_model: Option<String>,
    pub generate_error: Option<String>,
    pub panic_on_generate: bool,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            reply: "fake reply".to_string(),
            normalize_model: None,
            generate_error: None,
            panic_on_generate: false,
        }
    }
}

#[derive(Default)]
struct Record {
    created: Vec<AgentSpec>,
    construction_error: Option<String>,
    last_generation: Option<(Vec<LibraryMessage>, GenerationParams)>,
    tool_calls: usize,
}

pub struct FakeLibrary {
    script: FakeScript,
    record: Arc<Mutex<Record>>,
}

impl FakeLibrary {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            record: Arc::new(Mutex::new(Record::default())),
        }
    }

    pub fn fail_construction(&self, message: &str) {
        self.record.lock().unwrap().construction_error = Some(message.to_string());
    }

    pub fn created(&self) -> Vec<AgentSpec> {
        self.record.lock().unwrap().created.clone()
    }

    pub fn last_generation(&self) -> Option<(Vec<LibraryMessage>, GenerationParams)> {
        self.record.lock().unwrap().last_generation.clone()
    }

    pub fn tool_calls(&self) -> usize {
        self.record.lock().unwrap().tool_calls
    }
}

impl AgentLibrary for FakeLibrary {
    fn name(&self) -> &str {
        "fake"
    }

    fn create_agent(&self, spec: AgentSpec) -> anyhow::Result<Box<dyn Agent>> {
        let mut record = self.record.lock().unwrap();
        if let Some(message) = &record.construction_error {
            anyhow::bail!("{}", message);
        }
        record.created.push(spec.clone());

        Ok(Box::new(FakeAgent {
            name: spec.name,
            description: spec.description,
            model: self.script.normalize_model.clone().unwrap_or(spec.model),
            tools: registry_from_names(["echo", "word_count"])?,
            script: self.script.clone(),
            record: self.record.clone(),
        }))
    }
}

struct FakeAgent {
    name: String,
    description: String,
    model: String,
    tools: ToolRegistry,
    script: FakeScript,
    record: Arc<Mutex<Record>>,
}

#[async_trait]
impl Agent for FakeAgent {
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
    ) -> anyhow::Result<Completion> {
        if self.script.panic_on_generate {
            panic!("generator exploded");
        }
        self.record.lock().unwrap().last_generation = Some((messages, params));
        match &self.script.generate_error {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(Completion::new(self.script.reply.clone())),
        }
    }

    async fn execute_tool(&self, name: &str, args: Map<String, Value>) -> anyhow::Result<Value> {
        self.record.lock().unwrap().tool_calls += 1;
        self.tools.execute(name, args).await
    }
}
