#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn mecu(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mecu"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("MECU_PORT")
        .env_remove("MECU_BAUD")
        .output()
        .expect("mecu should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn encode_get_hash_detailed() {
    let output = mecu(&["--format", "raw", "encode", "system", "get_hash", "--payload", "01"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "4d45010000040101060f");
}

#[test]
fn encode_by_numeric_codes() {
    let output = mecu(&["--format", "raw", "encode", "4", "0x00"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "4d4500000004000408");
}

#[test]
fn decode_emits_one_json_line_per_frame() {
    let output = mecu(&[
        "--format",
        "json",
        "decode",
        "4d450100000002010305",
        "4d450100000001000102",
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"variant\":\"SetState\""));
    assert!(lines[1].contains("\"variant\":\"SendAck\""));
}

#[test]
fn decode_report_with_entity_table() {
    let output = mecu(&[
        "--format",
        "json",
        "decode",
        "4d45 0400 0f 00 00 2a3412fe 7ed1",
        "--entities",
        "1:uint16,14:int8",
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("\"variant\":\"SendReport\""));
    assert!(text.contains("{\"id\":1,\"value_type\":\"UINT16\",\"value\":4660}"));
    assert!(text.contains("{\"id\":14,\"value_type\":\"INT8\",\"value\":-2}"));
}

#[test]
fn encode_send_report_response() {
    let output = mecu(&[
        "--format",
        "raw",
        "encode",
        "reporting",
        "send_report",
        "--type",
        "response",
        "--payload",
        "2a3412fe",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "4d4504000f00002a3412fe7ed1");
}

#[test]
fn decode_bad_checksum_exits_60() {
    let output = mecu(&["decode", "4d450100000001000103"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("checksum"));
}

#[test]
fn decode_lenient_accepts_bad_checksum() {
    let output = mecu(&["--format", "raw", "decode", "--lenient", "4d450100000001000103"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "4d450100000001000102");
}

#[test]
fn decode_odd_hex_is_usage_error() {
    let output = mecu(&["decode", "4d4"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_port_is_transport_error() {
    let output = mecu(&["info", "--port", "/dev/mecu-does-not-exist", "--timeout", "100ms"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn version_prints_package_version() {
    let output = mecu(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("mecu {}", env!("CARGO_PKG_VERSION"))
    );
}
