//! Integration tests for the `tindev` binary.
//! Runs the binary with a real temp config and storage file against httpmock
//! and an in-process WebSocket server.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write as _;
use std::path::{Path, PathBuf};

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a config pointing at `base_url`, with storage inside `dir`.
fn write_config(dir: &tempfile::TempDir, base_url: &str, realtime: Option<u16>) -> PathBuf {
    let path = dir.path().join("config.yaml");
    let storage = dir.path().join("storage.json");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "api:\n  base_url: {}", base_url).unwrap();
    match realtime {
        Some(port) => writeln!(
            f,
            "realtime:\n  url: ws://127.0.0.1:{}\n  reconnect_attempts: 0",
            port
        )
        .unwrap(),
        None => writeln!(f, "realtime:\n  enabled: false").unwrap(),
    }
    writeln!(f, "storage:\n  path: {}", storage.display()).unwrap();
    path
}

fn seed_session(dir: &tempfile::TempDir, user_id: &str) {
    std::fs::write(
        dir.path().join("storage.json"),
        json!({ "userId": user_id }).to_string(),
    )
    .unwrap();
}

fn tindev(config: &Path) -> Command {
    let mut cmd = Command::from(cargo_bin_cmd!("tindev"));
    cmd.env_remove("TINDEV_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn mock_queue(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/devs").header("user", "u1");
        then.status(200).json_body(json!([
            { "_id": "A", "name": "Ann", "bio": "systems" },
            { "_id": "B", "name": "Ben", "bio": "frontend" }
        ]));
    });
}

#[test]
fn login_whoami_logout_cycle() {
    let server = MockServer::start();
    let register = server.mock(|when, then| {
        when.method(POST)
            .path("/devs")
            .json_body(json!({ "username": "alice" }));
        then.status(200).json_body(json!({ "_id": "u1", "name": "Alice" }));
    });
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);

    tindev(&config)
        .args(["login", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as u1"));
    register.assert();

    tindev(&config)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("u1"));

    tindev(&config)
        .arg("logout")
        .assert()
        .success();
    assert!(!dir.path().join("storage.json").exists());

    tindev(&config)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn queue_lists_candidates_top_first() {
    let server = MockServer::start();
    mock_queue(&server);
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    tindev(&config)
        .arg("queue")
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)A\tAnn\tsystems.*B\tBen\tfrontend").unwrap());
}

#[test]
fn queue_json_reports_view() {
    let server = MockServer::start();
    mock_queue(&server);
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    let output = tindev(&config).args(["queue", "--json"]).output().unwrap();
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["show_actions"], json!(true));
    assert_eq!(view["cards"][0]["id"], json!("A"));
    assert_eq!(view["cards"][0]["z_index"], json!(2));
}

#[test]
fn empty_queue_prints_empty_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/devs");
        then.status(200).json_body(json!([]));
    });
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    tindev(&config)
        .arg("queue")
        .assert()
        .success()
        .stdout(predicate::str::contains("That's it for now"));
}

#[test]
fn like_without_id_likes_top_card() {
    let server = MockServer::start();
    mock_queue(&server);
    let like = server.mock(|when, then| {
        when.method(POST).path("/devs/A/likes").header("user", "u1");
        then.status(200);
    });
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    tindev(&config)
        .arg("like")
        .assert()
        .success()
        .stdout(predicate::str::contains("Liked Ann"));
    like.assert();
}

#[test]
fn dislike_by_id_reports_server_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/devs/B/dislikes");
        then.status(500).body("db down");
    });
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    tindev(&config)
        .args(["dislike", "B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dislike of B failed"));
}

#[test]
fn swipe_reads_commands_from_stdin() {
    let server = MockServer::start();
    mock_queue(&server);
    let dislike_a = server.mock(|when, then| {
        when.method(POST).path("/devs/A/dislikes").header("user", "u1");
        then.status(200);
    });
    let like_b = server.mock(|when, then| {
        when.method(POST).path("/devs/B/likes").header("user", "u1");
        then.status(200);
    });
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &server.base_url(), None);
    seed_session(&dir, "u1");

    tindev(&config)
        .arg("swipe")
        .write_stdin("d\nl\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[2 left] Ann"))
        .stdout(predicate::str::contains("[1 left] Ben"))
        .stdout(predicate::str::contains("That's it for now"));
    dislike_a.assert();
    like_b.assert();
}

/// Minimal Socket.IO server: handshake, then one match event.
fn spawn_match_server(port: u16) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            use futures_util::{SinkExt, StreamExt};
            use tokio_tungstenite::tungstenite::Message;

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
                .await
                .unwrap();
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(
                r#"0{"sid":"eio1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#.into(),
            ))
            .await
            .unwrap();
            let _ = ws.next().await;
            ws.send(Message::Text(r#"40{"sid":"sock1"}"#.into()))
                .await
                .unwrap();
            ws.send(Message::Text(
                r#"42["match",{"name":"Diego","bio":"Rustacean","avatar":"https://a/d.png"}]"#.into(),
            ))
            .await
            .unwrap();

            // Record the first text frame the client sends back.
            let mut first = String::new();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(t) = msg {
                    first = t;
                    break;
                }
            }
            first
        })
    })
}

#[test]
fn listen_prints_match_and_disconnects() {
    let port = free_port();
    let server = spawn_match_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let http = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &http.base_url(), Some(port));
    seed_session(&dir, "u1");

    tindev(&config)
        .args(["listen", "--count", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("It's a match! Diego"))
        .stdout(predicate::str::contains("Rustacean"));
    assert_eq!(server.join().unwrap(), "41");
}

#[test]
fn listen_with_server_down_shows_error() {
    let http = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &http.base_url(), Some(free_port()));
    seed_session(&dir, "u1");

    tindev(&config)
        .arg("listen")
        .assert()
        .failure()
        .stderr(predicate::str::is_match("(?i)(connect|error|refused)").unwrap());
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    tindev(&dir.path().join("nope.yaml"))
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}
