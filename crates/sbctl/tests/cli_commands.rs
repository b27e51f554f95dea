#![cfg(feature = "cli")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::BytesMut;
use sbctl::frame::{cipher, decode, encode_frame, HEADER_SIZE};
use serde_json::{json, Value};

/// Accepts one connection and answers each command with the next reply.
/// Returns the commands it received.
fn spawn_device(replies: Vec<Value>) -> (u16, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");

        let mut received = Vec::new();
        for reply in replies {
            received.push(read_command(&mut stream));
            let mut frame = BytesMut::new();
            encode_frame(&cipher::encrypt(reply.to_string().as_bytes()), &mut frame);
            stream.write_all(&frame).expect("write reply");
        }
        received
    });

    (port, handle)
}

fn read_command(stream: &mut TcpStream) -> Value {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).expect("read header");
    let mut frame = header.to_vec();
    frame.resize(HEADER_SIZE + header[4] as usize, 0);
    stream
        .read_exact(&mut frame[HEADER_SIZE..])
        .expect("read body");
    decode(&frame).expect("command should decode").into_value()
}

fn sbctl(port: u16, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .env_remove("SBCTL_HOST")
        .env_remove("SBCTL_PORT")
        .env_remove("SBCTL_LOG")
        .args(["--log-level", "off", "--format", "json", "--timeout", "3s"])
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(args)
        .output()
        .expect("sbctl should run")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be JSON")
}

#[test]
fn get_prints_device_response() {
    let (port, device) = spawn_device(vec![json!({
        "msg": "PLAY_INFO",
        "data": {"i_stream_type": 0, "s_albumname": "Blue"}
    })]);

    let output = sbctl(port, &["get", "play_info"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output)["data"]["s_albumname"], "Blue");

    let received = device.join().unwrap();
    assert_eq!(received, vec![json!({"cmd": "get", "msg": "PLAY_INFO"})]);
}

#[test]
fn relative_volume_reads_then_sets_on_one_connection() {
    let (port, device) = spawn_device(vec![
        json!({"data": {"i_vol": 12, "b_mute": false}}),
        json!({"data": {"i_vol": 14}}),
    ]);

    let output = sbctl(port, &["volume", "+2"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!({"volume": 14}));

    let received = device.join().unwrap();
    assert_eq!(
        received,
        vec![
            json!({"cmd": "get", "msg": "SPK_LIST_VIEW_INFO"}),
            json!({"cmd": "set", "msg": "SPK_LIST_VIEW_INFO", "data": {"i_vol": 14}}),
        ]
    );
}

#[test]
fn equalizer_name_is_case_insensitive() {
    let (port, device) = spawn_device(vec![json!({"data": {"i_curr_eq": 18}})]);

    let output = sbctl(port, &["eq", "dts x"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!({"equalizer": "DTS X"}));

    let received = device.join().unwrap();
    assert_eq!(received[0]["data"], json!({"i_curr_eq": 18}));
}

#[test]
fn input_reports_unknown_for_out_of_range_index() {
    let (port, device) = spawn_device(vec![json!({"data": {"i_curr_func": 42}})]);

    let output = sbctl(port, &["input"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!({"input": "Unknown"}));
    device.join().unwrap();
}

#[test]
fn unknown_input_is_usage_error_without_connecting() {
    // Nothing listens on this port; a connect attempt would time out instead.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let output = sbctl(port, &["input", "Cassette"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown input: Cassette"));
}

#[test]
fn unreachable_device_exits_with_transport_code() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let output = Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .env_remove("SBCTL_LOG")
        .args(["--log-level", "off", "--timeout", "500ms"])
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .arg("volume")
        .output()
        .expect("sbctl should run");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn silent_device_exits_with_timeout_code() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let device = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_command(&mut stream);
        // Hold the socket open without answering.
        thread::sleep(Duration::from_millis(1500));
    });

    let output = Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .env_remove("SBCTL_LOG")
        .args(["--log-level", "off", "--timeout", "500ms"])
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["get", "PRODUCT_INFO"])
        .output()
        .expect("sbctl should run");
    assert_eq!(output.status.code(), Some(124));
    device.join().unwrap();
}

#[test]
fn set_rejects_non_object_json() {
    let output = sbctl(9, &["set", "SETTING_VIEW_INFO", "--json", "[1]"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_host_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .env_remove("SBCTL_HOST")
        .args(["--log-level", "off", "volume"])
        .output()
        .expect("sbctl should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn input_list_needs_no_device() {
    let output = Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .args(["--format", "json", "input", "--list"])
        .output()
        .expect("sbctl should run");
    assert!(output.status.success());
    let names = stdout_json(&output);
    assert_eq!(names.as_array().map(Vec::len), Some(21));
    assert_eq!(names[20], "E-ARC");
}

#[test]
fn version_prints_name() {
    let output = Command::new(env!("CARGO_BIN_EXE_sbctl"))
        .arg("version")
        .output()
        .expect("sbctl should run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("sbctl "));
}
