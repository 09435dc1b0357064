//! Whiteboard document model

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Title given to newly created documents
pub const UNTITLED_TITLE: &str = "Untitled whiteboard";

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored whiteboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub board_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
}

impl Document {
    /// New untitled document with empty content
    pub fn new() -> Self {
        Self {
            board_id: generate_id(),
            title: UNTITLED_TITLE.to_string(),
            content: Value::Object(Default::default()),
            created_at: Local::now().format(CREATED_AT_FORMAT).to_string(),
            share_id: None,
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            board_id: self.board_id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing entry for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub board_id: String,
    pub title: String,
    pub created_at: String,
}

/// Random identifier: a v4 UUID without hyphens
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_document_defaults() {
        let document = Document::new();
        assert_eq!(document.title, UNTITLED_TITLE);
        assert_eq!(document.content, json!({}));
        assert_eq!(document.board_id.len(), 32);
        assert!(!document.board_id.contains('-'));
        assert!(document.share_id.is_none());
    }

    #[test]
    fn test_document_wire_names() {
        let mut document = Document::new();
        let value = serde_json::to_value(&document).unwrap();
        assert!(value.get("boardId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("shareId").is_none());

        document.share_id = Some("abc".to_string());
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["shareId"], "abc");
    }

    #[test]
    fn test_loads_records_without_optional_fields() {
        let document: Document =
            serde_json::from_value(json!({"boardId": "b1", "title": "Old"})).unwrap();
        assert_eq!(document.content, Value::Null);
        assert_eq!(document.share_id, None);
    }
}
