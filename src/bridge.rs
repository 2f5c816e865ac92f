//! Process boundary: bytes in, one JSON document out.
//!
//! `serve_once` is the default: all of stdin is one request. `serve_lines`
//! keeps a session alive and answers one request per input line.

use std::io::{BufRead, Read, Write};

use anyhow::Result;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::handlers::Dispatcher;
use crate::protocol::{Request, Response};

/// Decode and dispatch one request document.
pub async fn handle_input(dispatcher: &mut Dispatcher, input: &str) -> Response {
    let value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(e) => {
            let error = BridgeError::InvalidJson(e);
            warn!("{}", error);
            return Response::from_error(&error);
        }
    };

    match Request::from_value(value) {
        Ok(request) => dispatcher.dispatch(request).await,
        Err(error) => {
            warn!("{}", error);
            Response::from_error(&error)
        }
    }
}

/// Read the whole of `reader` as one request and write one response line.
pub async fn serve_once<R: Read, W: Write>(
    dispatcher: &mut Dispatcher,
    mut reader: R,
    mut writer: W,
) -> Result<()> {
    let mut buf = Vec::new();
    let response = match reader.read_to_end(&mut buf) {
        Err(e) => Response::from_error(&BridgeError::Unexpected(e.to_string())),
        Ok(_) => match String::from_utf8(buf) {
            Ok(input) => handle_input(dispatcher, &input).await,
            Err(e) => Response::from_error(&BridgeError::Unexpected(e.to_string())),
        },
    };

    write_response(&mut writer, &response)
}

/// Answer one request per line until EOF, sharing the dispatcher's session.
pub async fn serve_lines<R: BufRead, W: Write>(
    dispatcher: &mut Dispatcher,
    mut reader: R,
    mut writer: W,
) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        let response = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                handle_input(dispatcher, input).await
            }
            // A line that is not UTF-8 is consumed and reported; the session goes on
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                Response::from_error(&BridgeError::Unexpected(e.to_string()))
            }
            Err(e) => {
                let response = Response::from_error(&BridgeError::Unexpected(e.to_string()));
                write_response(&mut writer, &response)?;
                return Err(e.into());
            }
        };
        write_response(&mut writer, &response)?;
    }

    debug!("Input closed, ending session");
    Ok(())
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writeln!(writer, "{}", response.to_line())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeLibrary, FakeScript};
    use crate::agent::{DemoBackend, LibraryBackend};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Arc;

    fn demo() -> Dispatcher {
        Dispatcher::new(Box::new(DemoBackend))
    }

    async fn once(input: &[u8]) -> Value {
        let mut out = Vec::new();
        serve_once(&mut demo(), Cursor::new(input.to_vec()), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn ping_round_trip() {
        let response = once(br#"{"action": "ping"}"#).await;
        assert_eq!(response, json!({"success": true, "data": true}));
    }

    #[tokio::test]
    async fn invalid_json_is_reported_in_band() {
        let response = once(b"not valid json").await;
        assert_eq!(response["success"], json!(false));
        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON: "));
    }

    #[tokio::test]
    async fn empty_input_is_invalid_json() {
        let response = once(b"").await;
        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON: "));
    }

    #[tokio::test]
    async fn non_utf8_input_is_unexpected() {
        let response = once(&[0xff, 0xfe, 0x00]).await;
        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Unexpected error: "));
    }

    #[tokio::test]
    async fn non_object_request_is_unexpected() {
        let response = once(b"[1, 2]").await;
        assert_eq!(
            response,
            json!({"success": false, "error": "Unexpected error: request must be a JSON object"})
        );
    }

    #[tokio::test]
    async fn lines_mode_keeps_the_session() {
        let mut dispatcher =
            Dispatcher::new(Box::new(LibraryBackend::new(Arc::new(FakeLibrary::new(
                FakeScript {
                    reply: "from agent".to_string(),
                    ..FakeScript::default()
                },
            )))));

        let input = concat!(
            r#"{"action": "generate_completion", "data": {"messages": [{"role": "user", "content": "a"}]}}"#,
            "\n",
            "\n",
            r#"{"action": "initialize_agent", "data": {"agentName": "Scout"}}"#,
            "\n",
            "garbage\n",
            r#"{"action": "generate_completion", "data": {"messages": [{"role": "user", "content": "a"}]}}"#,
            "\n",
        );

        let mut out = Vec::new();
        serve_lines(&mut dispatcher, Cursor::new(input), &mut out)
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 4);
        assert!(responses[0]["data"]
            .as_str()
            .unwrap()
            .starts_with("Demo response to: 'a...'"));
        assert_eq!(responses[1]["data"]["name"], json!("Scout"));
        assert!(responses[2]["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON: "));
        assert_eq!(responses[3], json!({"success": true, "data": "from agent"}));
    }
}
