//! Broadcast dispatcher: fan a document update out to the viewers of a share

use crate::registry::ShareRegistry;
use crate::types::{ConnectionId, ShareToken, WebSocketError, WebSocketMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Server-to-viewer push message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BroadcastMessage {
    /// Full replacement of the shared document
    Update {
        content: serde_json::Value,
        title: String,
    },
}

impl BroadcastMessage {
    pub fn update<T: Into<String>>(title: T, content: serde_json::Value) -> Self {
        Self::Update {
            content,
            title: title.into(),
        }
    }

    /// Serialize to JSON text for WebSocket transmission
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Delivers broadcast messages to every open viewer of a share token.
///
/// Delivery is fire-and-forget. Viewers that are not open are skipped and
/// left in the registry; their own session removes them when it closes.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ShareRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ShareRegistry>) -> Self {
        Self { registry }
    }

    /// Publish `message` to the viewers currently bound to `token`
    pub async fn publish(&self, token: &ShareToken, message: &BroadcastMessage) -> BroadcastResult {
        let mut result = BroadcastResult::default();

        let viewers = self.registry.snapshot(token).await;
        if viewers.is_empty() {
            return result;
        }

        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize broadcast for share {}: {}", token, e);
                return result;
            }
        };

        for viewer in viewers {
            if !viewer.is_active().await {
                result.inactive_connections.push(viewer.id);
                continue;
            }

            match viewer.send(WebSocketMessage::text(payload.clone())).await {
                Ok(()) => result.success_count += 1,
                Err(e) => result.failed_connections.push((viewer.id, e)),
            }
        }

        debug!(
            "Broadcast to share {}: {} delivered, {} skipped, {} failed",
            token,
            result.success_count,
            result.inactive_connections.len(),
            result.failed_connections.len()
        );

        result
    }
}

/// Outcome of one publish, for logging and tests; never surfaced to the writer
#[derive(Debug, Default)]
pub struct BroadcastResult {
    pub success_count: usize,
    pub failed_connections: Vec<(ConnectionId, WebSocketError)>,
    pub inactive_connections: Vec<ConnectionId>,
}

impl BroadcastResult {
    pub fn total_attempted(&self) -> usize {
        self.success_count + self.failed_connections.len() + self.inactive_connections.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_connections.is_empty()
    }
}
