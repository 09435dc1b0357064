//! Share types and transport abstractions
//!
//! These types keep the registry, session and broadcast code independent of
//! the concrete WebSocket implementation; axum frames are converted at the edge.

use axum::extract::ws;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of a read-only live view of one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ShareToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for ShareToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl Borrow<str> for ShareToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for viewer connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-level readiness of a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connection is open and deliverable
    Connected,
    /// Connection is closing
    Closing,
    /// Connection is closed
    Closed,
    /// Connection failed
    Failed(String),
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}

/// WebSocket frames - transport-neutral view over axum messages
#[derive(Debug, Clone, PartialEq)]
pub enum WebSocketMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close(Option<CloseFrame>),
}

/// Close frame information
#[derive(Debug, Clone, PartialEq)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

impl WebSocketMessage {
    pub fn text<T: Into<String>>(content: T) -> Self {
        Self::Text(content.into())
    }

    pub fn ping<T: Into<Vec<u8>>>(data: T) -> Self {
        Self::Ping(data.into())
    }

    pub fn close() -> Self {
        Self::Close(None)
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Self::Ping(_) | Self::Pong(_) | Self::Close(_))
    }

    /// Payload size used for connection statistics
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
            _ => 0,
        }
    }
}

impl From<ws::Message> for WebSocketMessage {
    fn from(msg: ws::Message) -> Self {
        match msg {
            ws::Message::Text(text) => Self::Text(text),
            ws::Message::Binary(data) => Self::Binary(data),
            ws::Message::Ping(data) => Self::Ping(data),
            ws::Message::Pong(data) => Self::Pong(data),
            ws::Message::Close(frame) => Self::Close(frame.map(|f| CloseFrame {
                code: f.code,
                reason: f.reason.into_owned(),
            })),
        }
    }
}

impl From<WebSocketMessage> for ws::Message {
    fn from(msg: WebSocketMessage) -> Self {
        match msg {
            WebSocketMessage::Text(text) => ws::Message::Text(text),
            WebSocketMessage::Binary(data) => ws::Message::Binary(data),
            WebSocketMessage::Ping(data) => ws::Message::Ping(data),
            WebSocketMessage::Pong(data) => ws::Message::Pong(data),
            WebSocketMessage::Close(frame) => ws::Message::Close(frame.map(|f| ws::CloseFrame {
                code: f.code,
                reason: f.reason.into(),
            })),
        }
    }
}

/// Errors raised on an individual viewer connection
#[derive(Debug, Error)]
pub enum WebSocketError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send queue closed")]
    SendQueueClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for connection operations
pub type WebSocketResult<T> = Result<T, WebSocketError>;
