use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

const SERVER_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(200);

#[test]
fn initialize_smoke() {
    let mut server = spawn_server();
    let mut reader = take_reader(&mut server);

    send_lsp_message(&mut server, &create_initialize_request());
    let (response, _) = read_until_response(&mut reader, 1);
    validate_initialize_response(&response);

    shutdown_server(server);
}

#[test]
fn open_command_rejects_spec_file() {
    let mut server = spawn_server();
    let mut reader = take_reader(&mut server);

    send_lsp_message(&mut server, &create_initialize_request());
    read_until_response(&mut reader, 1);
    send_lsp_message(
        &mut server,
        &json!({ "jsonrpc": "2.0", "method": "initialized", "params": {} }),
    );

    send_lsp_message(
        &mut server,
        &json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "workspace/executeCommand",
            "params": {
                "command": "angularComponentViewer.openCombinedView",
                "arguments": ["/nonexistent/foo.component.spec.ts"]
            }
        }),
    );
    let (response, notifications) = read_until_response(&mut reader, 2);

    assert_eq!(response.get("result"), Some(&Value::Null));

    let error_message = notifications
        .iter()
        .find(|n| n.get("method").and_then(|m| m.as_str()) == Some("window/showMessage"))
        .expect("Invalid target should be shown to the user");
    assert_eq!(
        error_message.pointer("/params/type").and_then(|t| t.as_i64()),
        Some(1),
        "Should be an error message"
    );
    assert!(error_message
        .pointer("/params/message")
        .and_then(|m| m.as_str())
        .is_some_and(|m| m.contains(".spec.ts")));

    shutdown_server(server);
}

fn spawn_server() -> Child {
    let bin_path = std::env::var("CARGO_BIN_EXE_acv-ls")
        .unwrap_or_else(|_| "target/debug/acv-ls".to_string());

    Command::new(bin_path)
        .arg("--no-watch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env("ACV_LS_TEST_EXIT", "1")
        .spawn()
        .expect("Failed to spawn language server")
}

fn take_reader(child: &mut Child) -> BufReader<ChildStdout> {
    BufReader::new(
        child
            .stdout
            .take()
            .expect("Child stdout should be available"),
    )
}

fn create_initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "processId": null,
            "rootUri": null,
            "capabilities": {
                "workspace": {
                    "applyEdit": true,
                    "executeCommand": { "dynamicRegistration": false }
                },
                "window": {
                    "showDocument": { "support": true }
                }
            },
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }
    })
}

fn send_lsp_message(child: &mut Child, message: &Value) {
    let body = message.to_string();
    let request = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

    let stdin = child
        .stdin
        .as_mut()
        .expect("Child stdin should be available");
    stdin
        .write_all(request.as_bytes())
        .expect("Failed to write request");
    stdin.flush().expect("Failed to flush stdin");
}

/// Read messages until the response to `id`; returns it with every
/// server-originated message seen before it
fn read_until_response(reader: &mut BufReader<ChildStdout>, id: i64) -> (Value, Vec<Value>) {
    let start_time = Instant::now();
    let mut others = Vec::new();

    loop {
        if start_time.elapsed() > SERVER_TIMEOUT {
            panic!("Timeout waiting for response {}", id);
        }

        let message = read_lsp_message(reader);
        let is_response = message.get("method").is_none()
            && message.get("id").and_then(|v| v.as_i64()) == Some(id);
        if is_response {
            return (message, others);
        }
        others.push(message);
    }
}

fn read_lsp_message(reader: &mut BufReader<ChildStdout>) -> Value {
    let mut content_length = None;

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => panic!("Unexpected EOF while reading headers"),
            Ok(_) => {
                if line.trim().is_empty() {
                    break;
                }
                if let Some(length_str) = line.strip_prefix("Content-Length:") {
                    content_length = Some(
                        length_str
                            .trim()
                            .parse::<usize>()
                            .expect("Invalid Content-Length header"),
                    );
                }
            }
            Err(e) => panic!("Error reading headers: {}", e),
        }
    }

    let mut body = vec![0u8; content_length.expect("Missing Content-Length header")];
    reader
        .read_exact(&mut body)
        .expect("Failed to read response body");
    let body = String::from_utf8(body).expect("Response body should be valid UTF-8");

    serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("Invalid JSON response: {}\nBody: {}", e, body))
}

fn validate_initialize_response(response: &Value) {
    assert_eq!(
        response.get("jsonrpc").and_then(|v| v.as_str()),
        Some("2.0"),
        "Response should have jsonrpc: '2.0'"
    );

    let capabilities = response
        .pointer("/result/capabilities")
        .expect("Result should contain server capabilities");
    assert!(capabilities.is_object(), "Capabilities should be an object");

    let commands: Vec<&str> = capabilities
        .pointer("/executeCommandProvider/commands")
        .and_then(|v| v.as_array())
        .expect("Should advertise executable commands")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(commands.contains(&"angularComponentViewer.openCombinedView"));
    assert!(commands.contains(&"angularComponentViewer.cycleLanguage"));

    assert_eq!(
        capabilities
            .pointer("/textDocumentSync/save/includeText")
            .and_then(|v| v.as_bool()),
        Some(true),
        "Saved text should be included in didSave"
    );
}

fn shutdown_server(mut child: Child) {
    // Close stdin to signal we're done
    drop(child.stdin.take());

    std::thread::sleep(SHUTDOWN_GRACE_PERIOD);

    match child.try_wait() {
        Ok(Some(status)) => {
            if !status.success() {
                eprintln!("Server exited with non-zero status: {:?}", status);
            }
        }
        Ok(None) => {
            eprintln!("Server didn't exit gracefully, forcing termination");
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(e) => panic!("Error checking server status: {}", e),
    }
}
