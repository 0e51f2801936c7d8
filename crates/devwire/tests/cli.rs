#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use devwire::frame::{Packet, REGISTER};
use devwire::payload::{
    BinaryStruct, CommandMetadata, DataType, DeviceRegistration, ParameterMetadata,
    RegisteredCommand,
};

const LED_COMMAND: &str = r#"{
    "intent": 257,
    "name": "UpdateLedState",
    "parameters": [
        {"type": "string", "name": "equipment"},
        {"type": "byte", "name": "state"}
    ]
}"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "devwire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn devwire(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_devwire"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("devwire should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should be writable");
    child.wait_with_output().expect("devwire should finish")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

fn packet(version: u8, flags: u8, intent: u16, data: Vec<u8>) -> Vec<u8> {
    Packet::with_default_signature(version, flags, intent, data)
        .expect("payload fits")
        .to_binary()
        .to_vec()
}

#[test]
fn encode_hex_produces_reference_frame() {
    let output = devwire(
        &[
            "--format",
            "pretty",
            "encode",
            "--intent",
            "4",
            "--packet-version",
            "2",
            "--flags",
            "3",
            "--hex",
            "313233",
        ],
        b"",
    );

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "c5c3020303000400313233d5"
    );
}

#[test]
fn encode_raw_writes_frame_bytes() {
    let output = devwire(
        &["--format", "raw", "encode", "--intent", "300", "--hex", "ff"],
        b"",
    );

    assert!(output.status.success());
    assert_eq!(output.stdout, packet(1, 0, 300, vec![0xff]));
}

#[test]
fn encode_invalid_hex_is_usage_error() {
    let output = devwire(&["encode", "--intent", "300", "--hex", "xyz"], b"");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_skips_junk_and_corrupt_frames() {
    let mut stream = vec![0xba, 0xdb, 0xad];
    stream.extend(packet(2, 3, 4, b"123".to_vec()));
    let mut corrupt = packet(1, 0, 500, b"bad".to_vec());
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xff;
    stream.extend(corrupt);
    stream.extend(packet(1, 0, 501, b"good".to_vec()));

    let output = devwire(&["--format", "json", "decode"], &stream);
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["intent"], 4);
    assert_eq!(lines[0]["version"], 2);
    assert_eq!(lines[0]["flags"], 3);
    assert_eq!(lines[0]["checksum"], "d5");
    assert_eq!(lines[0]["payload"], "313233");
    assert_eq!(lines[1]["intent"], 501);
    assert_eq!(lines[1]["intent_name"], "USER");
}

#[test]
fn decode_recovers_packet_behind_unsatisfiable_header() {
    let mut stream = vec![0xc5, 0xc3, 0x01, 0x00, 0x00, 0x10, 0x00, 0x00];
    stream.extend(packet(1, 0, 42, b"late".to_vec()));

    let output = devwire(&["--format", "json", "decode"], &stream);
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["intent"], 42);
    assert_eq!(lines[0]["payload"], "6c617465");
}

#[test]
fn decode_uses_command_metadata_for_fields() {
    let dir = unique_temp_dir("decode-fields");
    std::fs::write(dir.join("led.command.json"), LED_COMMAND).expect("metadata should write");
    let input = dir.join("capture.bin");
    std::fs::write(&input, packet(1, 0, 257, vec![0x03, 0x00, b'L', b'E', b'D', 0x01]))
        .expect("capture should write");

    let output = devwire(
        &[
            "--format",
            "json",
            "decode",
            input.to_str().expect("utf-8 path"),
            "--commands",
            dir.to_str().expect("utf-8 path"),
        ],
        b"",
    );
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["intent_name"], "UpdateLedState");
    assert_eq!(lines[0]["fields"]["equipment"], "LED");
    assert_eq!(lines[0]["fields"]["state"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_learns_types_from_device_registration() {
    let blink = CommandMetadata::new(
        260,
        "blink",
        vec![ParameterMetadata::new(DataType::Word, "period")],
    );
    let registration = DeviceRegistration {
        name: "board".into(),
        commands: vec![RegisteredCommand::from(&blink)],
        ..DeviceRegistration::default()
    };
    let payload = registration.to_binary().expect("registration encodes");

    let mut stream = packet(1, 0, REGISTER, payload.to_vec());
    stream.extend(packet(1, 0, 260, vec![0xe8, 0x03]));

    let output = devwire(&["--format", "json", "decode"], &stream);
    assert!(output.status.success(), "{output:?}");

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["intent_name"], "REGISTER");
    assert_eq!(lines[1]["intent_name"], "blink");
    assert_eq!(lines[1]["fields"]["period"], 1000);
}

#[test]
fn decode_count_stops_early() {
    let mut stream = packet(1, 0, 300, vec![1]);
    stream.extend(packet(1, 0, 301, vec![2]));

    let output = devwire(&["--format", "json", "decode", "--count", "1"], &stream);
    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 1);
}

#[test]
fn decode_missing_file_fails() {
    let output = devwire(&["decode", "/nonexistent/devwire/capture.bin"], b"");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed opening"));
}

#[test]
fn encode_json_with_commands_roundtrips_through_decode() {
    let dir = unique_temp_dir("encode-json");
    std::fs::write(dir.join("led.command.json"), LED_COMMAND).expect("metadata should write");
    let commands = dir.to_str().expect("utf-8 path");

    let encoded = devwire(
        &[
            "--format",
            "raw",
            "encode",
            "--intent",
            "257",
            "--json",
            r#"{"equipment":"LED","state":0}"#,
            "--commands",
            commands,
        ],
        b"",
    );
    assert!(encoded.status.success(), "{encoded:?}");
    assert_eq!(
        encoded.stdout,
        packet(1, 0, 257, vec![0x03, 0x00, b'L', b'E', b'D', 0x00])
    );

    let unknown = devwire(
        &[
            "encode",
            "--intent",
            "257",
            "--json",
            r#"{"colour":"red"}"#,
            "--commands",
            commands,
        ],
        b"",
    );
    assert_eq!(unknown.status.code(), Some(60));

    let missing = devwire(
        &[
            "encode",
            "--intent",
            "999",
            "--json",
            "{}",
            "--commands",
            commands,
        ],
        b"",
    );
    assert_eq!(missing.status.code(), Some(64));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn commands_lists_loaded_types() {
    let dir = unique_temp_dir("commands");
    std::fs::write(dir.join("led.command.json"), LED_COMMAND).expect("metadata should write");

    let output = devwire(
        &["--format", "json", "commands", dir.to_str().expect("utf-8 path")],
        b"",
    );
    assert!(output.status.success(), "{output:?}");

    let listed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(listed[0]["intent"], 257);
    assert_eq!(listed[0]["parameters"][1]["type"], "byte");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = devwire(&["version"], b"");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("devwire {}", env!("CARGO_PKG_VERSION"))
    );
}
