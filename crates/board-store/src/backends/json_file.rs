//! Flat-file JSON backend

use crate::config::StoreConfig;
use crate::document::{generate_id, Document, DocumentSummary};
use crate::{DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Keeps the whole collection in memory and rewrites the data file after
/// every mutation.
///
/// Mutations are applied to a copy, persisted, and only then published, so a
/// failed write leaves the in-memory collection unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: Option<PathBuf>,
    documents: RwLock<Vec<Document>>,
}

impl JsonFileStore {
    /// Open the store configured by `config`
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Self::open(&config.data_file).await
    }

    /// Open (or create) the data file at `path`.
    ///
    /// A missing file is created holding `[]`. An unreadable or corrupt file is
    /// logged and the store starts empty.
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let documents = if fs::try_exists(&path).await? {
            match Self::load(&path).await {
                Ok(documents) => documents,
                Err(e) => {
                    error!("Failed to load documents from {}: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, "[]").await?;
            info!("Created document store at {}", path.display());
            Vec::new()
        };

        info!("Loaded {} documents from {}", documents.len(), path.display());

        Ok(Self {
            path: Some(path),
            documents: RwLock::new(documents),
        })
    }

    /// Store without a backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn load(path: &Path) -> StoreResult<Vec<Document>> {
        let raw = fs::read_to_string(path).await?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        // a literal `null` file loads as empty
        let documents: Option<Vec<Document>> = serde_json::from_str(&raw)?;
        Ok(documents.unwrap_or_default())
    }

    async fn persist(&self, documents: &[Document]) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(documents)?;
        fs::write(path, json).await.map_err(|e| {
            error!("Failed to save documents to {}: {}", path.display(), e);
            StoreError::Io(e)
        })?;

        debug!("Saved {} documents to {}", documents.len(), path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the collection and commit it once persisted
    async fn mutate<T, F>(&self, change: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Vec<Document>) -> StoreResult<T> + Send,
        T: Send,
    {
        let mut documents = self.documents.write().await;
        let mut next = documents.clone();
        let output = change(&mut next)?;

        self.persist(&next).await?;
        *documents = next;
        Ok(output)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        let documents = self.documents.read().await;
        Ok(documents.iter().map(Document::summary).collect())
    }

    async fn create(&self) -> StoreResult<Document> {
        let document = Document::new();
        let created = document.clone();

        self.mutate(move |documents| {
            documents.push(document);
            Ok(())
        })
        .await?;

        info!("Created whiteboard {}", created.board_id);
        Ok(created)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.board_id == id).cloned())
    }

    async fn update(&self, id: &str, title: String, content: Value) -> StoreResult<Document> {
        self.mutate(|documents| {
            let document = documents
                .iter_mut()
                .find(|d| d.board_id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            document.title = title;
            document.content = content;
            Ok(document.clone())
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        if self.get(id).await?.is_none() {
            return Ok(false);
        }

        let removed = self
            .mutate(|documents| {
                let before = documents.len();
                documents.retain(|d| d.board_id != id);
                Ok(documents.len() != before)
            })
            .await?;

        if removed {
            info!("Deleted whiteboard {}", id);
        }
        Ok(removed)
    }

    async fn assign_share_token(&self, id: &str) -> StoreResult<String> {
        let token = generate_id();

        self.mutate(|documents| {
            let document = documents
                .iter_mut()
                .find(|d| d.board_id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            document.share_id = Some(token.clone());
            Ok(())
        })
        .await?;

        info!("Issued share token for whiteboard {}", id);
        Ok(token)
    }

    async fn get_by_share_token(&self, token: &str) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|d| d.share_id.as_deref() == Some(token))
            .cloned())
    }

    async fn find_share_token_for_document(&self, id: &str) -> StoreResult<Option<String>> {
        Ok(self.get(id).await?.and_then(|d| d.share_id))
    }
}
