//! Client error taxonomy shared by the HTTP client and the realtime listener.

use reqwest::StatusCode;

/// Errors produced by remote calls (devs API and realtime channel).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure talking to the devs API (connect, timeout, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The devs API answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A response or event payload could not be decoded.
    #[error("invalid payload: {0}")]
    Decode(String),

    /// WebSocket transport failure on the realtime channel.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The realtime server broke the Socket.IO handshake or refused us.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A configured address could not be turned into a request URL.
    #[error("invalid url: {0}")]
    Url(String),

    /// Rejected locally before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
