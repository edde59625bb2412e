//! Wire types for the devs API and the Socket.IO realtime channel.

use serde::{Deserialize, Serialize};

/// Client → server: `POST /devs` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
}

/// A developer profile as returned by `GET /devs` and `POST /devs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// GitHub handle the profile was registered with.
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
}

/// Payload of an inbound `match` event. Only the displayed fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

/// Engine.IO open packet (`0{...}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPacket {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: Option<u64>,
    #[serde(default)]
    pub ping_timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConnectErrorPacket {
    #[serde(default)]
    message: String,
}

/// Client → server: Socket.IO connect to the default namespace.
pub const CONNECT_PACKET: &str = "40";
/// Client → server: Socket.IO disconnect from the default namespace.
pub const DISCONNECT_PACKET: &str = "41";
/// Client → server: Engine.IO pong.
pub const PONG_PACKET: &str = "3";

/// One server frame; discriminator is the leading Engine.IO / Socket.IO type digits.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    Open(OpenPacket),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    Event {
        name: String,
        args: Vec<serde_json::Value>,
    },
    ConnectError(String),
}

impl ServerMessage {
    pub fn from_text(text: &str) -> Result<Self, String> {
        let mut chars = text.chars();
        let engine = chars.next().ok_or("empty frame")?;
        let rest = chars.as_str();
        match engine {
            '0' => {
                let open: OpenPacket = serde_json::from_str(rest).map_err(|e| e.to_string())?;
                Ok(ServerMessage::Open(open))
            }
            '1' => Ok(ServerMessage::Close),
            '2' => Ok(ServerMessage::Ping),
            '3' => Ok(ServerMessage::Pong),
            '6' => Ok(ServerMessage::Noop),
            '4' => Self::from_socket_packet(rest),
            _ => Err(format!("unknown engine packet: {}", engine)),
        }
    }

    fn from_socket_packet(text: &str) -> Result<Self, String> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or("missing socket packet type")?;
        let body = strip_ack_id(strip_namespace(chars.as_str()));
        match kind {
            '0' => Ok(ServerMessage::Connect),
            '1' => Ok(ServerMessage::Disconnect),
            '2' => {
                let mut items: Vec<serde_json::Value> =
                    serde_json::from_str(body).map_err(|e| e.to_string())?;
                if items.is_empty() {
                    return Err("event without name".into());
                }
                let name = match items.remove(0) {
                    serde_json::Value::String(name) => name,
                    other => return Err(format!("event name is not a string: {}", other)),
                };
                Ok(ServerMessage::Event { name, args: items })
            }
            '4' => {
                let message = serde_json::from_str::<ConnectErrorPacket>(body)
                    .map(|p| p.message)
                    .unwrap_or_else(|_| body.to_string());
                Ok(ServerMessage::ConnectError(message))
            }
            // acks and binary packets are never sent by the devs server
            _ => Ok(ServerMessage::Noop),
        }
    }
}

fn strip_namespace(text: &str) -> &str {
    if !text.starts_with('/') {
        return text;
    }
    match text.find(',') {
        Some(pos) => &text[pos + 1..],
        None => "",
    }
}

fn strip_ack_id(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_digit())
}
