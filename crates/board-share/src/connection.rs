//! Viewer connection handle - outbound queue plus readiness state

use crate::config::WebSocketConfig;
use crate::types::{ConnectionId, ConnectionState, WebSocketError, WebSocketMessage, WebSocketResult};
use futures_util::{Sink, SinkExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio::time;
use tracing::{debug, error};

/// Cloneable handle to one viewer connection.
///
/// Sending only enqueues onto an unbounded channel; a separate writer task
/// drains it into the transport, so a stalled viewer never delays the caller.
#[derive(Clone)]
pub struct ViewerConnection {
    /// Unique connection identifier
    pub id: ConnectionId,
    state: Arc<RwLock<ConnectionState>>,
    stats: Arc<RwLock<ConnectionStats>>,
    sender: mpsc::UnboundedSender<WebSocketMessage>,
}

/// Connection statistics
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub connected_at: Instant,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub last_activity: Option<Instant>,
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self {
            connected_at: Instant::now(),
            messages_sent: 0,
            messages_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
            last_activity: None,
        }
    }
}

impl ViewerConnection {
    /// Create an open connection and the receiving end of its outbound queue
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WebSocketMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id: ConnectionId::new(),
            state: Arc::new(RwLock::new(ConnectionState::Connected)),
            stats: Arc::new(RwLock::new(ConnectionStats::default())),
            sender,
        };

        (connection, receiver)
    }

    /// Queue a message for delivery
    pub async fn send(&self, message: WebSocketMessage) -> WebSocketResult<()> {
        if !self.is_active().await {
            return Err(WebSocketError::ConnectionClosed);
        }

        self.sender
            .send(message)
            .map_err(|_| WebSocketError::SendQueueClosed)
    }

    /// Queue a text message
    pub async fn send_text<T: Into<String>>(&self, text: T) -> WebSocketResult<()> {
        self.send(WebSocketMessage::text(text)).await
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    pub async fn is_active(&self) -> bool {
        self.state().await.is_active()
    }

    pub async fn is_closed(&self) -> bool {
        self.state().await.is_closed()
    }

    /// Mark the transport closed, keeping a recorded failure
    pub async fn mark_closed(&self) {
        let mut state = self.state.write().await;
        if !matches!(*state, ConnectionState::Failed(_)) {
            *state = ConnectionState::Closed;
        }
    }

    pub async fn stats(&self) -> ConnectionStats {
        self.stats.read().await.clone()
    }

    /// Record an inbound frame
    pub async fn record_received(&self, message: &WebSocketMessage) {
        let mut stats = self.stats.write().await;
        stats.messages_received += 1;
        stats.bytes_received += message.payload_len() as u64;
        stats.last_activity = Some(Instant::now());
    }

    async fn record_sent(&self, message: &WebSocketMessage) {
        let mut stats = self.stats.write().await;
        stats.messages_sent += 1;
        stats.bytes_sent += message.payload_len() as u64;
        stats.last_activity = Some(Instant::now());
    }

    /// Drain the outbound queue into `sink` until the queue closes or the sink fails.
    ///
    /// Sends a ping every `config.ping_interval` seconds when configured.
    pub async fn run_writer<S, M>(
        self,
        mut sink: S,
        mut receiver: mpsc::UnboundedReceiver<WebSocketMessage>,
        config: WebSocketConfig,
    ) where
        S: Sink<M> + Unpin,
        S::Error: fmt::Display,
        M: From<WebSocketMessage>,
    {
        debug!("Starting writer for connection: {}", self.id);

        let mut ping_interval = config.ping_interval().map(|period| {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                outbound = receiver.recv() => {
                    let Some(message) = outbound else {
                        debug!("Outbound queue closed for: {}", self.id);
                        break;
                    };

                    let closing = matches!(message, WebSocketMessage::Close(_));
                    self.record_sent(&message).await;

                    if let Err(e) = sink.send(M::from(message)).await {
                        error!("Failed to send message for {}: {}", self.id, e);
                        self.set_state(ConnectionState::Failed(e.to_string())).await;
                        break;
                    }

                    if closing {
                        self.set_state(ConnectionState::Closing).await;
                        break;
                    }
                }

                _ = async {
                    match ping_interval.as_mut() {
                        Some(interval) => {
                            interval.tick().await;
                        }
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    if let Err(e) = sink.send(M::from(WebSocketMessage::ping(Vec::new()))).await {
                        error!("Failed to send ping for {}: {}", self.id, e);
                        self.set_state(ConnectionState::Failed(e.to_string())).await;
                        break;
                    }
                    debug!("Sent ping to connection: {}", self.id);
                }
            }
        }

        debug!("Writer finished for connection: {}", self.id);
    }
}

impl fmt::Debug for ViewerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerConnection").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct BrokenSink;

    impl Sink<WebSocketMessage> for BrokenSink {
        type Error = String;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, _item: WebSocketMessage) -> Result<(), String> {
            Err("broken pipe".to_string())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_send_enqueues_while_open() {
        let (connection, mut receiver) = ViewerConnection::channel();

        connection.send_text("hello").await.unwrap();
        assert_eq!(receiver.try_recv().unwrap(), WebSocketMessage::text("hello"));
    }

    #[tokio::test]
    async fn test_send_rejected_when_not_open() {
        let (connection, mut receiver) = ViewerConnection::channel();
        connection.set_state(ConnectionState::Closing).await;

        let result = connection.send_text("late").await;
        assert!(matches!(result, Err(WebSocketError::ConnectionClosed)));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_fails_once_writer_is_gone() {
        let (connection, receiver) = ViewerConnection::channel();
        drop(receiver);

        let result = connection.send_text("nobody listening").await;
        assert!(matches!(result, Err(WebSocketError::SendQueueClosed)));
    }

    #[tokio::test]
    async fn test_mark_closed_keeps_failure() {
        let (connection, _receiver) = ViewerConnection::channel();
        connection
            .set_state(ConnectionState::Failed("reset by peer".to_string()))
            .await;
        connection.mark_closed().await;
        assert_eq!(
            connection.state().await,
            ConnectionState::Failed("reset by peer".to_string())
        );

        let (connection, _receiver) = ViewerConnection::channel();
        connection.mark_closed().await;
        assert!(connection.is_closed().await);
    }

    #[tokio::test]
    async fn test_writer_drains_queue_into_sink() {
        let (connection, receiver) = ViewerConnection::channel();
        let mut delivered: Vec<WebSocketMessage> = Vec::new();

        connection.send_text("one").await.unwrap();
        connection.send_text("two").await.unwrap();
        connection.send(WebSocketMessage::close()).await.unwrap();

        connection
            .clone()
            .run_writer(&mut delivered, receiver, WebSocketConfig::default().without_ping())
            .await;

        assert_eq!(
            delivered,
            vec![
                WebSocketMessage::text("one"),
                WebSocketMessage::text("two"),
                WebSocketMessage::close(),
            ]
        );
        assert_eq!(connection.state().await, ConnectionState::Closing);
        assert_eq!(connection.stats().await.messages_sent, 3);
    }

    #[tokio::test]
    async fn test_writer_marks_failure_on_sink_error() {
        let (connection, receiver) = ViewerConnection::channel();

        connection.send_text("doomed").await.unwrap();
        connection
            .clone()
            .run_writer(BrokenSink, receiver, WebSocketConfig::default().without_ping())
            .await;

        assert_eq!(
            connection.state().await,
            ConnectionState::Failed("broken pipe".to_string())
        );
    }
}
