use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("rpckit_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Schema exercised by most tests: one command per payload shape.
fn write_schema(dir: &TempDir) -> PathBuf {
    let json = serde_json::json!({
        "send": {
            "desc": "send coins to an address",
            "request": {
                "type": "object",
                "content": {
                    "to": {"type": "string", "desc": "destination address"},
                    "amount": {
                        "type": "double",
                        "desc": "amount to send",
                        "required": false,
                        "opt": "amount",
                        "default": 1.0
                    }
                }
            },
            "response": {"type": "string", "name": "txid"}
        },
        "listunspent": {
            "desc": "list unspent outputs",
            "request": {
                "type": "object",
                "content": {
                    "verbose": {"type": "bool", "required": false},
                    "address": {"type": "string"}
                }
            }
        },
        "ping": {
            "desc": "liveness probe",
            "request": {"type": "object", "content": {}}
        }
    });
    let path = dir.join("schema.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
        .expect("failed to write schema");
    path
}

fn write_modes(dir: &TempDir) -> PathBuf {
    let json = serde_json::json!({
        "server": {
            "usage": "rpckit-server [options]",
            "desc": "Run the RPC server."
        }
    });
    let path = dir.join("modes.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
        .expect("failed to write modes");
    path
}

fn rpckit(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_rpckit"))
        .args(args)
        .output()
        .expect("failed to run rpckit")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_reports_declaration_counts() {
    let dir = TempDir::new("check_counts");
    let schema = write_schema(&dir);
    let modes = write_modes(&dir);

    let output = rpckit(&[
        "check",
        schema.to_str().unwrap(),
        "--modes",
        modes.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "check should succeed");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("3 command(s)"), "stdout: {stdout}");
    assert!(stdout.contains("1 mode(s)"), "stdout: {stdout}");
}

#[test]
fn check_dump_prints_compiled_model_as_json() {
    let dir = TempDir::new("check_dump");
    let schema = write_schema(&dir);
    let modes = write_modes(&dir);

    let output = rpckit(&[
        "check",
        schema.to_str().unwrap(),
        "--modes",
        modes.to_str().unwrap(),
        "--dump",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let dump: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");

    // Registry types carry their normalized field lists, required first.
    let fields = &dump["types"]["send-request"]["object"]["fields"];
    assert_eq!(fields[0]["key"], serde_json::json!("to"));
    assert!(fields[0].get("opt").is_none(), "bare field grew an opt key");
    assert_eq!(fields[1]["opt"], serde_json::json!("amount"));
    assert_eq!(fields[1]["default"], serde_json::json!({"literal": 1.0}));

    // Commands keep declaration order and reference their request roots.
    assert_eq!(dump["commands"][0]["name"], serde_json::json!("send"));
    assert_eq!(
        dump["commands"][0]["request"]["object"]["target"],
        serde_json::json!("send-request")
    );
    assert!(
        dump["commands"][2].get("response").is_none(),
        "ping declares no response"
    );
    assert_eq!(dump["modes"][0]["name"], serde_json::json!("server"));
}

#[test]
fn check_rejects_unknown_type_with_path() {
    let dir = TempDir::new("check_unknown_type");
    let schema = dir.join("schema.json");
    fs::write(
        &schema,
        r#"{"getblock": {"desc": "x", "request": {"type": "object", "content": {
            "block": {"type": "blok"}
        }}}}"#,
    )
    .expect("failed to write schema");

    let output = rpckit(&["check", schema.to_str().unwrap()]);

    assert!(!output.status.success(), "check should fail");
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("[getblock-request-block] unknown type 'blok'"),
        "stderr: {stderr}"
    );
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_prints_commands_in_declaration_order() {
    let dir = TempDir::new("list_order");
    let schema = write_schema(&dir);

    let output = rpckit(&["list", schema.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["send", "listunspent", "ping"]);
    assert!(stdout.contains("send coins to an address"));
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

#[test]
fn describe_renders_command_help_page() {
    let dir = TempDir::new("describe_command");
    let schema = write_schema(&dir);

    let output = rpckit(&["describe", schema.to_str().unwrap(), "send"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("\nUsage:\n"), "stdout: {stdout}");
    assert!(stdout.contains("send <\"to\"> (-amount=$amount$)"));
    assert!(stdout.contains("Arguments:"));
}

#[test]
fn describe_renders_mode_page() {
    let dir = TempDir::new("describe_mode");
    let schema = write_schema(&dir);
    let modes = write_modes(&dir);

    let output = rpckit(&[
        "describe",
        schema.to_str().unwrap(),
        "server",
        "--modes",
        modes.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("rpckit-server [options]"), "stdout: {stdout}");
}

#[test]
fn describe_unknown_name_fails() {
    let dir = TempDir::new("describe_unknown");
    let schema = write_schema(&dir);

    let output = rpckit(&["describe", schema.to_str().unwrap(), "nothere"]);

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("No command or mode named 'nothere'"));
}

// ---------------------------------------------------------------------------
// call
// ---------------------------------------------------------------------------

#[test]
fn call_binds_option_and_positional_tokens() {
    let dir = TempDir::new("call_bind");
    let schema = write_schema(&dir);

    let output = rpckit(&[
        "call",
        schema.to_str().unwrap(),
        "send",
        "1xyz",
        "-amount=2.5",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let wire: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");
    assert_eq!(wire, serde_json::json!({"to": "1xyz", "amount": 2.5}));
}

#[test]
fn call_fills_defaults_for_unbound_fields() {
    let dir = TempDir::new("call_default");
    let schema = write_schema(&dir);

    let output = rpckit(&["call", schema.to_str().unwrap(), "send", "1xyz"]);

    assert!(output.status.success());
    let wire: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");
    assert_eq!(wire["amount"], serde_json::json!(1.0));
}

#[test]
fn call_missing_required_argument_fails_with_code() {
    let dir = TempDir::new("call_missing");
    let schema = write_schema(&dir);

    let output = rpckit(&["call", schema.to_str().unwrap(), "send"]);

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("[to] is required"), "stderr: {stderr}");
    assert!(stderr.contains("(rpc code -32700)"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

#[test]
fn decode_reprints_request_in_normalized_order() {
    let dir = TempDir::new("decode_order");
    let schema = write_schema(&dir);
    let message = dir.join("message.json");
    fs::write(&message, r#"{"verbose": true, "address": "1xyz"}"#)
        .expect("failed to write message");

    let output = rpckit(&[
        "decode",
        schema.to_str().unwrap(),
        "listunspent",
        "--input",
        message.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    let address_at = stdout.find("\"address\"").expect("address key in output");
    let verbose_at = stdout.find("\"verbose\"").expect("verbose key in output");
    assert!(address_at < verbose_at, "required key should come first: {stdout}");
}

#[test]
fn decode_rejects_wrong_wire_type_with_code() {
    let dir = TempDir::new("decode_wrong_type");
    let schema = write_schema(&dir);
    let message = dir.join("message.json");
    fs::write(&message, r#"{"to": 5}"#).expect("failed to write message");

    let output = rpckit(&[
        "decode",
        schema.to_str().unwrap(),
        "send",
        "--input",
        message.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("(rpc code -32602)"), "stderr: {stderr}");
}

#[test]
fn decode_response_unwraps_named_single() {
    let dir = TempDir::new("decode_response");
    let schema = write_schema(&dir);
    let message = dir.join("message.json");
    fs::write(&message, r#""0xdead""#).expect("failed to write message");

    let output = rpckit(&[
        "decode",
        schema.to_str().unwrap(),
        "send",
        "--response",
        "--input",
        message.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let wire: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");
    assert_eq!(wire, serde_json::json!("0xdead"));
}

#[test]
fn decode_response_passes_undeclared_payload_through() {
    let dir = TempDir::new("decode_passthrough");
    let schema = write_schema(&dir);
    let message = dir.join("message.json");
    fs::write(&message, r#"{"uptime": 421}"#).expect("failed to write message");

    let output = rpckit(&[
        "decode",
        schema.to_str().unwrap(),
        "ping",
        "--response",
        "--input",
        message.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let wire: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");
    assert_eq!(wire, serde_json::json!({"uptime": 421}));
}
