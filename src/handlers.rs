use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::agent::{AgentBackend, AgentSettings, CompletionRequest, ToolInvocation};
use crate::error::BridgeError;
use crate::protocol::{Action, Request, Response};
use crate::state::Session;

thread_local! {
    /// Backtrace of the most recent panic on this thread, taken at the panic site
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the current panic hook that records where the
/// panic happened. `catch_unwind` only sees the payload after unwinding.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            // gone during thread teardown
            let _ = PANIC_TRACE.try_with(|trace| {
                *trace.borrow_mut() = Some(Backtrace::force_capture());
            });
            previous(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    PANIC_TRACE
        .with(|trace| trace.borrow_mut().take())
        .map(|backtrace| backtrace.to_string())
}

/// Routes requests to the backend, owning the session they share.
pub struct Dispatcher {
    backend: Box<dyn AgentBackend>,
    session: Session,
}

impl Dispatcher {
    pub fn new(backend: Box<dyn AgentBackend>) -> Self {
        install_panic_hook();
        Self {
            backend,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one request. Never fails: every error, including a panic inside
    /// a handler, becomes an error response.
    pub async fn dispatch(&mut self, request: Request) -> Response {
        let action = request.action.clone();
        debug!("Dispatching action: {}", action);

        match AssertUnwindSafe(self.route(request)).catch_unwind().await {
            Ok(Ok(data)) => Response::ok(data),
            Ok(Err(e)) => {
                warn!(kind = ?e.kind(), "{}", e);
                Response::from_error(&e)
            }
            Err(payload) => {
                let error = BridgeError::Panicked {
                    action: action.to_string(),
                    message: panic_message(payload.as_ref()),
                    traceback: take_panic_trace(),
                };
                warn!(kind = ?error.kind(), "{}", error);
                Response::from_error(&error)
            }
        }
    }

    async fn route(&mut self, request: Request) -> Result<Value, BridgeError> {
        match &request.action {
            Action::Ping => Ok(Value::Bool(true)),
            Action::InitializeAgent => {
                let settings: AgentSettings = request.payload()?;
                let descriptor = self
                    .backend
                    .initialize_agent(&mut self.session, settings)
                    .await?;
                to_value(&request.action, descriptor)
            }
            Action::GenerateCompletion => {
                let CompletionRequest { messages, options } = request.payload()?;
                let content = self
                    .backend
                    .generate_completion(&self.session, messages, options)
                    .await?;
                Ok(Value::String(content))
            }
            Action::ExecuteTool => {
                let ToolInvocation { tool_name, params } = request.payload()?;
                self.backend
                    .execute_tool(&self.session, &tool_name, params)
                    .await
            }
            Action::Unknown(name) => Err(BridgeError::UnknownAction(name.clone())),
        }
    }
}

fn to_value<T: serde::Serialize>(action: &Action, value: T) -> Result<Value, BridgeError> {
    serde_json::to_value(value).map_err(|e| BridgeError::InvalidRequest {
        action: action.to_string(),
        message: e.to_string(),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeLibrary, FakeScript};
    use crate::agent::{DemoBackend, LibraryBackend};
    use crate::error::FailureKind;
    use serde_json::json;
    use std::sync::Arc;

    fn request(action: &str, data: Value) -> Request {
        Request::new(Action::from_name(action), data)
    }

    fn demo() -> Dispatcher {
        Dispatcher::new(Box::new(DemoBackend))
    }

    fn library(script: FakeScript) -> Dispatcher {
        Dispatcher::new(Box::new(LibraryBackend::new(Arc::new(FakeLibrary::new(script)))))
    }

    #[tokio::test]
    async fn ping_is_always_true() {
        let mut dispatcher = demo();
        for _ in 0..3 {
            let response = dispatcher.dispatch(request("ping", json!({}))).await;
            assert_eq!(response, Response::ok(json!(true)));
        }
    }

    #[tokio::test]
    async fn unknown_action_sets_only_error() {
        let response = demo().dispatch(request("fly", json!({}))).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": false, "error": "Unknown action: fly"})
        );
    }

    #[tokio::test]
    async fn demo_initialize_with_empty_config() {
        let mut dispatcher = demo();
        let response = dispatcher.dispatch(request("initialize_agent", json!({}))).await;
        assert_eq!(
            response.data,
            Some(json!({
                "name": "Agent Nexus",
                "description": "Demo Agent (agent library not available)",
                "model": "demo-model",
                "demo": true,
            }))
        );
        assert!(!dispatcher.session().is_initialized());
    }

    #[tokio::test]
    async fn demo_completion_quotes_user() {
        let response = demo()
            .dispatch(request(
                "generate_completion",
                json!({"messages": [{"role": "user", "content": "hello"}]}),
            ))
            .await;
        assert!(response.success);
        let text = response.data.unwrap();
        assert!(text.as_str().unwrap().starts_with("Demo response to: 'hello...'"));
    }

    #[tokio::test]
    async fn demo_tool_echoes_params() {
        let response = demo()
            .dispatch(request(
                "execute_tool",
                json!({"toolName": "search", "params": {"q": "x"}}),
            ))
            .await;
        assert!(response.success);
        let text = response.data.unwrap();
        let text = text.as_str().unwrap();
        assert!(text.contains("search"));
        assert!(text.contains(r#"{"q": "x"}"#));
    }

    #[tokio::test]
    async fn malformed_payload_names_the_action() {
        let response = demo()
            .dispatch(request("generate_completion", json!({"messages": "nope"})))
            .await;
        assert!(!response.success);
        assert!(response
            .error
            .unwrap()
            .starts_with("Error processing generate_completion: "));
    }

    #[tokio::test]
    async fn tool_call_turns_and_float_max_tokens_are_accepted() {
        let response = demo()
            .dispatch(request(
                "generate_completion",
                json!({
                    "messages": [
                        {"role": "assistant", "content": null},
                        {"role": "user", "content": "hello"},
                    ],
                    "options": {"maxTokens": 1000.0},
                }),
            ))
            .await;
        assert!(response.success, "{:?}", response.error);
        let text = response.data.unwrap();
        assert!(text.as_str().unwrap().starts_with("Demo response to: 'hello...'"));
    }

    #[tokio::test]
    async fn initialized_agent_serves_later_requests() {
        let mut dispatcher = library(FakeScript {
            reply: "real answer".to_string(),
            ..FakeScript::default()
        });

        let init = dispatcher
            .dispatch(request("initialize_agent", json!({"agentName": "Scout"})))
            .await;
        assert_eq!(init.data.as_ref().unwrap()["demo"], json!(false));
        assert_eq!(init.data.as_ref().unwrap()["model"], json!("gpt-4"));

        let completion = dispatcher
            .dispatch(request(
                "generate_completion",
                json!({"messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await;
        assert_eq!(completion, Response::ok(json!("real answer")));

        let missing = dispatcher
            .dispatch(request("execute_tool", json!({"toolName": "search"})))
            .await;
        assert_eq!(missing.error.as_deref(), Some("Tool not found: search"));

        let echoed = dispatcher
            .dispatch(request(
                "execute_tool",
                json!({"toolName": "echo", "params": {"q": "x"}}),
            ))
            .await;
        assert_eq!(echoed, Response::ok(json!({"q": "x"})));
    }

    #[tokio::test]
    async fn reinitialize_overwrites() {
        let mut dispatcher = library(FakeScript::default());
        dispatcher
            .dispatch(request("initialize_agent", json!({"agentName": "one"})))
            .await;
        dispatcher
            .dispatch(request("initialize_agent", json!({"agentName": "two"})))
            .await;
        assert_eq!(dispatcher.session().agent().map(|a| a.name()), Some("two"));
    }

    #[tokio::test]
    async fn handler_panic_becomes_error_response() {
        let mut dispatcher = library(FakeScript {
            panic_on_generate: true,
            ..FakeScript::default()
        });
        dispatcher
            .dispatch(request("initialize_agent", json!({})))
            .await;

        let response = dispatcher
            .dispatch(request("generate_completion", json!({"messages": []})))
            .await;
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Error processing generate_completion: generator exploded")
        );

        let traceback = response.traceback.unwrap();
        // points at the panicking frame, not at the dispatcher that caught it
        assert!(traceback.contains("agent::testing::FakeAgent"), "{}", traceback);

        // the dispatcher keeps working afterwards
        let ping = dispatcher.dispatch(request("ping", json!({}))).await;
        assert_eq!(ping, Response::ok(json!(true)));
    }

    #[test]
    fn panic_kind_is_unexpected() {
        let err = BridgeError::Panicked {
            action: "ping".to_string(),
            message: "x".to_string(),
            traceback: Some("trace".to_string()),
        };
        assert_eq!(err.kind(), FailureKind::Unexpected);
        assert_eq!(Response::from_error(&err).traceback.as_deref(), Some("trace"));
    }
}
