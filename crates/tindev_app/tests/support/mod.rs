//! Shared fixtures: an in-process Socket.IO-over-WebSocket server and
//! candidate JSON builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tindev_client::RealtimeSettings;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

pub const OPEN: &str =
    r#"0{"sid":"eio1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

pub fn dev(id: &str, name: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "name": name,
        "user": name.to_lowercase(),
        "bio": format!("{} writes code", name),
        "avatar": format!("https://avatars.example.com/{}", id)
    })
}

pub fn match_frame(name: &str) -> String {
    format!(
        r#"42["match",{{"_id":"m-{0}","name":"{0}","bio":"likes you too","avatar":"https://avatars.example.com/{0}"}}]"#,
        name
    )
}

/// Accepts a single client, completes the handshake, then forwards pushed
/// frames and records what the client sends.
pub struct RealtimeServer {
    pub port: u16,
    frames: mpsc::UnboundedSender<String>,
    uri: Option<oneshot::Receiver<String>>,
    received: Arc<Mutex<Vec<String>>>,
}

impl RealtimeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
        let (uri_tx, uri_rx) = oneshot::channel();
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorded = received.clone();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut uri = String::new();
            let mut ws =
                tokio_tungstenite::accept_hdr_async(tcp, |req: &Request, resp: Response| {
                    uri = req.uri().to_string();
                    Ok::<Response, ErrorResponse>(resp)
                })
                .await
                .unwrap();
            let _ = uri_tx.send(uri);
            ws.send(Message::Text(OPEN.into())).await.unwrap();
            let _ = ws.next().await;
            ws.send(Message::Text(r#"40{"sid":"sock1"}"#.into()))
                .await
                .unwrap();

            loop {
                tokio::select! {
                    frame = frames_rx.recv() => match frame {
                        Some(frame) => {
                            if ws.send(Message::Text(frame)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    incoming = ws.next() => match incoming {
                        Some(Ok(Message::Text(text))) => recorded.lock().unwrap().push(text),
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                }
            }
        });

        Self {
            port,
            frames: frames_tx,
            uri: Some(uri_rx),
            received,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    pub fn settings(&self) -> RealtimeSettings {
        RealtimeSettings {
            url: self.url(),
            path: "/socket.io/".into(),
            reconnect_attempts: 0,
            reconnect_delay: Duration::from_millis(10),
        }
    }

    pub fn push(&self, frame: impl Into<String>) {
        self.frames.send(frame.into()).unwrap();
    }

    /// Request URI of the accepted connection.
    pub async fn connected_uri(&mut self) -> String {
        self.uri.take().expect("uri already taken").await.unwrap()
    }

    /// Waits up to two seconds for the client to send `frame`.
    pub async fn saw_frame(&self, frame: &str) -> bool {
        for _ in 0..100 {
            if self.received.lock().unwrap().iter().any(|f| f == frame) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}
