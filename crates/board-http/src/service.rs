//! Whiteboard operations shared by the REST handlers

use board_share::{BroadcastMessage, Broadcaster, ShareToken};
use board_store::{Document, DocumentStore, DocumentSummary, StoreResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Document store plus the live-update hook run after every save
#[derive(Clone)]
pub struct WhiteboardService {
    store: Arc<dyn DocumentStore>,
    broadcaster: Broadcaster,
    /// Held from persist through publish so viewers see saves in store order
    save_lock: Arc<Mutex<()>>,
}

impl WhiteboardService {
    pub fn new(store: Arc<dyn DocumentStore>, broadcaster: Broadcaster) -> Self {
        Self {
            store,
            broadcaster,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        self.store.list().await
    }

    pub async fn create(&self) -> StoreResult<Document> {
        self.store.create().await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        self.store.get(id).await
    }

    /// Persist new title and content, then push them to the document's viewers.
    ///
    /// Nothing is published when the store rejects the update. Concurrent saves
    /// are published in the order they were persisted.
    pub async fn save(&self, id: &str, title: String, content: Value) -> StoreResult<Document> {
        let _ordered = self.save_lock.lock().await;
        let document = self.store.update(id, title, content).await?;

        if let Some(share_id) = &document.share_id {
            let token = ShareToken::new(share_id.as_str());
            let message = BroadcastMessage::update(document.title.clone(), document.content.clone());
            let result = self.broadcaster.publish(&token, &message).await;

            if result.total_attempted() > 0 {
                info!(
                    "Pushed whiteboard {} to {} viewers of share {}",
                    document.board_id, result.success_count, token
                );
            } else {
                debug!("Share {} has no viewers to update", token);
            }
        }

        Ok(document)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(id).await
    }

    /// Issue a fresh share token for the document
    pub async fn generate_share(&self, id: &str) -> StoreResult<String> {
        self.store.assign_share_token(id).await
    }

    pub async fn get_by_share(&self, token: &str) -> StoreResult<Option<Document>> {
        self.store.get_by_share_token(token).await
    }
}
