//! # board-store
//!
//! Keyed collection of whiteboard documents behind the [`DocumentStore`] trait,
//! with a flat-file JSON backend.
//!
//! ```rust
//! use board_store::{DocumentStore, JsonFileStore};
//!
//! # tokio_test::block_on(async {
//! let store = JsonFileStore::in_memory();
//! let board = store.create().await.unwrap();
//!
//! store
//!     .update(&board.board_id, "Roadmap".to_string(), serde_json::json!({"shapes": []}))
//!     .await
//!     .unwrap();
//!
//! let token = store.assign_share_token(&board.board_id).await.unwrap();
//! let shared = store.get_by_share_token(&token).await.unwrap().unwrap();
//! assert_eq!(shared.title, "Roadmap");
//! # });
//! ```

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod backends;
pub mod config;
pub mod document;

pub use backends::*;
pub use config::{StoreConfig, StoreDefaults};
pub use document::{generate_id, Document, DocumentSummary, UNTITLED_TITLE};

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed collection of whiteboard documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Summaries of every document, in creation order
    async fn list(&self) -> StoreResult<Vec<DocumentSummary>>;

    /// Create an untitled, empty document
    async fn create(&self) -> StoreResult<Document>;

    async fn get(&self, id: &str) -> StoreResult<Option<Document>>;

    /// Replace title and content; `NotFound` for unknown ids
    async fn update(&self, id: &str, title: String, content: Value) -> StoreResult<Document>;

    /// Remove a document; returns whether it existed
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Issue a fresh share token for the document, replacing any previous one
    async fn assign_share_token(&self, id: &str) -> StoreResult<String>;

    async fn get_by_share_token(&self, token: &str) -> StoreResult<Option<Document>>;

    async fn find_share_token_for_document(&self, id: &str) -> StoreResult<Option<String>>;
}
