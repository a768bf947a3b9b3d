//! Binary-level tests against a fake snapd socket and a fake agent port.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;

fn snapwatch_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("snapwatch"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1");
    cmd
}

fn drain_request(stream: &mut impl Read) {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => buf.push(byte[0]),
        }
    }
}

/// Serves the current snap list on `<dir>/snapd.socket`.
fn start_snapd(dir: &Path, snaps: Arc<Mutex<Value>>) -> PathBuf {
    let socket = dir.join("snapd.socket");
    let listener = UnixListener::bind(&socket).expect("bind");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            drain_request(&mut stream);
            let body = json!({
                "type": "sync",
                "status-code": 200,
                "status": "OK",
                "result": snaps.lock().expect("lock").clone(),
            })
            .to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    socket
}

/// Agent control port that installs `next` when called.
fn start_agent(snaps: Arc<Mutex<Value>>, next: Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            drain_request(&mut stream);
            *snaps.lock().expect("lock") = next.clone();
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        }
    });
    format!("http://{addr}/update_version_force")
}

fn agent(revision: &str) -> Value {
    json!([
        {"name": "core22", "version": "20240111", "revision": "x1"},
        {
            "name": "phantom-agent",
            "version": "0.6.14",
            "revision": revision,
            "apps": [{"name": "phantom-agent", "daemon": "simple", "active": true}],
        },
    ])
}

// ---------------------------------------------------------------------------
// 1. Queries
// ---------------------------------------------------------------------------

#[test]
fn info_json_reports_parsed_revision_and_flags() {
    let home = TempDir::new().expect("home");
    let socket = start_snapd(home.path(), Arc::new(Mutex::new(agent("x42"))));

    let output = snapwatch_cmd(home.path())
        .args(["info", "phantom-agent", "--json", "--socket"])
        .arg(&socket)
        .output()
        .expect("run info");
    assert!(
        output.status.success(),
        "info failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["name"], json!("phantom-agent"));
    assert_eq!(value["revision"], json!(42));
    assert_eq!(value["is_daemon"], json!(true));
    assert_eq!(value["is_running"], json!(true));
}

#[test]
fn list_prints_every_package() {
    let home = TempDir::new().expect("home");
    let socket = start_snapd(home.path(), Arc::new(Mutex::new(agent("x42"))));

    snapwatch_cmd(home.path())
        .arg("list")
        .arg("--socket")
        .arg(&socket)
        .assert()
        .success()
        .stdout(contains("core22"))
        .stdout(contains("phantom-agent"))
        .stdout(contains("active"));
}

#[test]
fn installed_fails_for_absent_package() {
    let home = TempDir::new().expect("home");
    let socket = start_snapd(home.path(), Arc::new(Mutex::new(agent("x42"))));

    snapwatch_cmd(home.path())
        .env("RUST_LOG", "info")
        .args(["installed", "phantom-agent", "--socket"])
        .arg(&socket)
        .assert()
        .success()
        .stdout(contains("'phantom-agent' is installed"))
        .stderr(contains("0.6.14"))
        .stderr(contains("package is installed"));

    snapwatch_cmd(home.path())
        .args(["installed", "ghost", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .stderr(contains("package 'ghost' is not installed"));
}

#[test]
fn missing_socket_reports_unreachable_daemon() {
    let home = TempDir::new().expect("home");

    snapwatch_cmd(home.path())
        .args(["info", "--socket"])
        .arg(home.path().join("nope.socket"))
        .assert()
        .failure()
        .stderr(contains("snapd is not reachable"));
}

#[test]
fn config_file_supplies_socket_and_package() {
    let home = TempDir::new().expect("home");
    let socket = start_snapd(home.path(), Arc::new(Mutex::new(agent("x7"))));
    let config = home.path().join("snapwatch.yaml");
    std::fs::write(
        &config,
        format!("socket_path: {}\npackage: phantom-agent\n", socket.display()),
    )
    .expect("write config");

    snapwatch_cmd(home.path())
        .args(["info", "--json", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("\"revision\": 7"));
}

#[test]
fn malformed_config_file_is_reported_with_path() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("snapwatch.yaml");
    std::fs::write(&config, "poll_interval_secs: [not, a, number]\n").expect("write config");

    snapwatch_cmd(home.path())
        .args(["info", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("snapwatch.yaml"));
}

// ---------------------------------------------------------------------------
// 2. Watch
// ---------------------------------------------------------------------------

#[test]
fn watch_succeeds_when_trigger_installs_next_revision() {
    let home = TempDir::new().expect("home");
    let snaps = Arc::new(Mutex::new(agent("x42")));
    let socket = start_snapd(home.path(), snaps.clone());
    let url = start_agent(snaps, agent("x43"));

    snapwatch_cmd(home.path())
        .args(["watch", "--interval", "1", "--timeout", "10", "--trigger-url", &url])
        .arg("--socket")
        .arg(&socket)
        .assert()
        .success()
        .stdout(contains("revision 42 → 43"))
        .stdout(contains("trigger: accepted (200)"));
}

#[test]
fn watch_json_reports_last_known_state_on_timeout() {
    let home = TempDir::new().expect("home");
    let snaps = Arc::new(Mutex::new(agent("x42")));
    let socket = start_snapd(home.path(), snaps.clone());
    // Agent accepts but never installs anything new.
    let url = start_agent(snaps, agent("x42"));

    let output = snapwatch_cmd(home.path())
        .args([
            "watch",
            "--interval",
            "1",
            "--max-polls",
            "1",
            "--json",
            "--trigger-url",
            &url,
        ])
        .arg("--socket")
        .arg(&socket)
        .output()
        .expect("run watch");
    assert!(!output.status.success(), "watch should fail on timeout");
    assert!(String::from_utf8_lossy(&output.stderr).contains("no update observed"));

    let sessions: Value = serde_json::from_slice(&output.stdout).expect("json");
    let session = &sessions[0];
    assert_eq!(session["outcome"], json!("timed_out"));
    assert_eq!(session["last_known"]["revision"], json!(42));
    assert_eq!(session["trigger"]["result"], json!("accepted"));
}

#[test]
fn watch_fails_for_missing_package() {
    let home = TempDir::new().expect("home");
    let snaps = Arc::new(Mutex::new(json!([{"name": "core22", "revision": "x1"}])));
    let socket = start_snapd(home.path(), snaps.clone());
    let url = start_agent(snaps, json!([]));

    snapwatch_cmd(home.path())
        .args(["watch", "--interval", "1", "--timeout", "5", "--trigger-url", &url])
        .arg("--socket")
        .arg(&socket)
        .assert()
        .failure()
        .stdout(contains("failed"))
        .stderr(contains("package 'phantom-agent' is not installed"));
}
