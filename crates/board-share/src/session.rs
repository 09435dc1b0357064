//! Viewer session lifecycle: handshake binding and guaranteed cleanup

use crate::config::WebSocketConfig;
use crate::connection::ViewerConnection;
use crate::registry::ShareRegistry;
use crate::types::{ConnectionId, ConnectionState, ShareToken, WebSocketMessage};
use axum::extract::ws::WebSocket;
use futures_util::{Sink, Stream, StreamExt};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Viewer-to-server handshake message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Bind {
        #[serde(rename = "shareId", default)]
        share_id: Option<String>,
    },
}

impl ClientMessage {
    /// Parse a handshake, yielding the token it names
    pub fn parse_bind(text: &str) -> Option<ShareToken> {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Bind {
                share_id: Some(share_id),
            }) if !share_id.is_empty() => Some(ShareToken::new(share_id)),
            Ok(ClientMessage::Bind { .. }) => {
                warn!("Ignoring bind message without shareId");
                None
            }
            Err(e) => {
                warn!("Ignoring unrecognized viewer message: {}", e);
                None
            }
        }
    }
}

/// Per-connection binding state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unbound,
    Bound(ShareToken),
    Closed,
}

/// What a handshake did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeOutcome {
    /// Connection is now bound to the token
    Bound(ShareToken),
    /// Connection was already bound; the handshake was ignored
    AlreadyBound(ShareToken),
    /// Payload was not a well-formed bind message
    Malformed,
    /// Session already closed
    SessionClosed,
}

/// Owns one viewer connection for its lifetime.
///
/// `Unbound -> Bound(token)` on the first well-formed handshake; further
/// handshakes are ignored, even ones naming a different token. `close` moves
/// to `Closed` and unbinds from the registry exactly once.
pub struct ViewerSession {
    connection: ViewerConnection,
    registry: Arc<ShareRegistry>,
    state: SessionState,
}

impl ViewerSession {
    pub fn new(connection: ViewerConnection, registry: Arc<ShareRegistry>) -> Self {
        Self {
            connection,
            registry,
            state: SessionState::Unbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn connection(&self) -> &ViewerConnection {
        &self.connection
    }

    /// Interpret one text frame from the viewer
    pub async fn handle_text(&mut self, text: &str) -> HandshakeOutcome {
        if self.state == SessionState::Closed {
            return HandshakeOutcome::SessionClosed;
        }

        let Some(token) = ClientMessage::parse_bind(text) else {
            return HandshakeOutcome::Malformed;
        };

        if let SessionState::Bound(current) = &self.state {
            if *current != token {
                warn!(
                    "Connection {} already watches share {}; ignoring bind to {}",
                    self.connection.id, current, token
                );
            }
            return HandshakeOutcome::AlreadyBound(current.clone());
        }

        self.registry
            .bind(token.clone(), self.connection.clone())
            .await;
        self.state = SessionState::Bound(token.clone());

        info!(
            "Connection {} is watching share {} ({} viewers)",
            self.connection.id,
            token,
            self.registry.viewer_count(&token).await
        );

        HandshakeOutcome::Bound(token)
    }

    /// Enter `Closed`, unbinding from the registry if bound
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Bound(token) => {
                self.registry.unbind(&token, self.connection.id).await;
                info!(
                    "Connection {} left share {} ({} viewers remaining)",
                    self.connection.id,
                    token,
                    self.registry.viewer_count(&token).await
                );
            }
            SessionState::Unbound => {
                debug!("Unbound connection {} closed", self.connection.id);
            }
            SessionState::Closed => {}
        }
    }

    /// Serve an upgraded WebSocket until it closes or fails
    pub async fn serve(socket: WebSocket, registry: Arc<ShareRegistry>, config: WebSocketConfig) {
        let (sink, stream) = socket.split();
        Self::drive(stream, sink, registry, config).await;
    }

    /// Run a viewer over any frame stream and sink.
    ///
    /// Ends when the viewer closes, the stream fails or ends, or the writer
    /// stops. Every exit path unbinds the connection.
    pub async fn drive<St, Si, M, E>(
        mut stream: St,
        sink: Si,
        registry: Arc<ShareRegistry>,
        config: WebSocketConfig,
    ) where
        St: Stream<Item = Result<M, E>> + Unpin,
        E: fmt::Display,
        Si: Sink<M> + Unpin + Send + 'static,
        Si::Error: fmt::Display + Send,
        M: From<WebSocketMessage> + Into<WebSocketMessage> + Send + 'static,
    {
        let (connection, receiver) = ViewerConnection::channel();
        info!("Viewer connection established: {}", connection.id);

        let mut writer = tokio::spawn(connection.clone().run_writer(sink, receiver, config));
        let mut session = ViewerSession::new(connection.clone(), registry);

        tokio::select! {
            _ = session.read_frames(&mut stream) => {}
            _ = &mut writer => {
                warn!("Writer stopped for connection {}; closing session", connection.id);
            }
        }

        if connection.state().await.is_active() {
            connection.set_state(ConnectionState::Closing).await;
        }
        session.close().await;
        connection.mark_closed().await;
        writer.abort();

        info!("Viewer connection finished: {}", connection.id);
    }

    async fn read_frames<St, M, E>(&mut self, stream: &mut St)
    where
        St: Stream<Item = Result<M, E>> + Unpin,
        E: fmt::Display,
        M: Into<WebSocketMessage>,
    {
        let id = self.connection.id;

        while let Some(frame) = stream.next().await {
            let message: WebSocketMessage = match frame {
                Ok(frame) => frame.into(),
                Err(e) => {
                    error!("WebSocket error for {}: {}", id, e);
                    self.connection
                        .set_state(ConnectionState::Failed(e.to_string()))
                        .await;
                    return;
                }
            };
            self.connection.record_received(&message).await;

            match message {
                WebSocketMessage::Text(text) => {
                    self.handle_text(&text).await;
                }
                WebSocketMessage::Binary(_) => {
                    warn!("Binary frames are not supported; ignoring ({})", id);
                }
                WebSocketMessage::Close(_) => {
                    info!("Received close frame for connection: {}", id);
                    return;
                }
                // axum answers pings itself
                WebSocketMessage::Ping(_) | WebSocketMessage::Pong(_) => {}
            }
        }
    }
}
