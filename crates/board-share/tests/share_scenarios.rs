//! Viewer scenarios driven through the public session and broadcast API

use board_share::{
    BroadcastMessage, Broadcaster, ShareRegistry, ShareToken, ViewerConnection, ViewerSession,
    WebSocketMessage,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

struct Viewer {
    session: ViewerSession,
    outbound: UnboundedReceiver<WebSocketMessage>,
}

impl Viewer {
    fn connect(registry: &Arc<ShareRegistry>) -> Self {
        let (connection, outbound) = ViewerConnection::channel();
        Self {
            session: ViewerSession::new(connection, registry.clone()),
            outbound,
        }
    }

    async fn send(&mut self, text: &str) {
        self.session.handle_text(text).await;
    }

    fn inbox(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            if let WebSocketMessage::Text(text) = message {
                messages.push(serde_json::from_str(&text).expect("viewer payload is JSON"));
            }
        }
        messages
    }
}

fn setup() -> (Arc<ShareRegistry>, Broadcaster) {
    let registry = Arc::new(ShareRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone());
    (registry, broadcaster)
}

#[tokio::test]
async fn viewers_of_same_share_both_receive_update() {
    let (registry, broadcaster) = setup();

    let mut a = Viewer::connect(&registry);
    a.send(r#"{"type":"bind","shareId":"t1"}"#).await;
    let mut b = Viewer::connect(&registry);
    b.send(r#"{"type":"bind","shareId":"t1"}"#).await;
    let mut c = Viewer::connect(&registry);
    c.send(r#"{"type":"bind","shareId":"t2"}"#).await;

    broadcaster
        .publish(&ShareToken::new("t1"), &BroadcastMessage::update("X", json!({})))
        .await;

    let expected = json!({"type": "update", "title": "X", "content": {}});
    assert_eq!(a.inbox(), vec![expected.clone()]);
    assert_eq!(b.inbox(), vec![expected]);
    assert!(c.inbox().is_empty());
}

#[tokio::test]
async fn closed_viewer_is_not_attempted() {
    let (registry, broadcaster) = setup();

    let mut a = Viewer::connect(&registry);
    a.send(r#"{"type":"bind","shareId":"t1"}"#).await;
    a.session.connection().mark_closed().await;
    a.session.close().await;

    let result = broadcaster
        .publish(&ShareToken::new("t1"), &BroadcastMessage::update("X", json!({})))
        .await;

    assert_eq!(result.total_attempted(), 0);
    assert!(a.inbox().is_empty());
    assert!(!registry.has_viewers(&ShareToken::new("t1")).await);
}

#[tokio::test]
async fn malformed_handshake_never_receives_updates() {
    let (registry, broadcaster) = setup();

    let mut a = Viewer::connect(&registry);
    a.send(r#"{"type":"bind"}"#).await;

    for token in ["t1", "t2", ""] {
        broadcaster
            .publish(&ShareToken::new(token), &BroadcastMessage::update("X", json!({})))
            .await;
    }

    assert!(a.inbox().is_empty());
    assert_eq!(registry.connection_count().await, 0);
}

#[tokio::test]
async fn churned_tokens_leave_no_entries() {
    let (registry, _broadcaster) = setup();

    for n in 0..50 {
        let mut viewer = Viewer::connect(&registry);
        viewer
            .send(&format!(r#"{{"type":"bind","shareId":"token-{}"}}"#, n))
            .await;
        viewer.session.close().await;
    }

    assert_eq!(registry.token_count().await, 0);
    assert_eq!(registry.connection_count().await, 0);
}
