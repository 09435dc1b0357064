//! # board-share
//!
//! Live share-link updates for the shared-whiteboard service.
//!
//! - [`ShareRegistry`] maps each share token to the viewer connections watching it
//! - [`ViewerSession`] binds a connection on its handshake and unbinds it on close
//! - [`Broadcaster`] pushes the latest document state to every open viewer
//!
//! ```rust
//! use board_share::{BroadcastMessage, Broadcaster, ShareRegistry, ShareToken, ViewerConnection, ViewerSession};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(ShareRegistry::new());
//! let broadcaster = Broadcaster::new(registry.clone());
//!
//! let (connection, mut outbound) = ViewerConnection::channel();
//! let mut session = ViewerSession::new(connection, registry.clone());
//! session.handle_text(r#"{"type":"bind","shareId":"t1"}"#).await;
//!
//! let token = ShareToken::new("t1");
//! broadcaster
//!     .publish(&token, &BroadcastMessage::update("Sketch", serde_json::json!({})))
//!     .await;
//! assert!(outbound.try_recv().is_ok());
//!
//! session.close().await;
//! assert!(!registry.has_viewers(&token).await);
//! # });
//! ```

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod registry;
pub mod session;
pub mod types;

pub use broadcast::{BroadcastMessage, BroadcastResult, Broadcaster};
pub use config::{WebSocketConfig, WebSocketDefaults};
pub use connection::{ConnectionStats, ViewerConnection};
pub use registry::{RegistryStats, ShareRegistry};
pub use session::{ClientMessage, HandshakeOutcome, SessionState, ViewerSession};
pub use types::{
    CloseFrame, ConnectionId, ConnectionState, ShareToken, WebSocketError, WebSocketMessage,
    WebSocketResult,
};
