//! Shared handler state

use crate::config::HttpDefaults;
use crate::service::WhiteboardService;
use board_share::{Broadcaster, ShareRegistry, WebSocketConfig};
use board_store::DocumentStore;
use std::sync::Arc;

/// Everything the handlers need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub service: WhiteboardService,
    pub registry: Arc<ShareRegistry>,
    pub ws_config: WebSocketConfig,
    /// Request body limit, reported in 413 responses
    pub max_request_size: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, ws_config: WebSocketConfig) -> Self {
        let registry = Arc::new(ShareRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());

        Self {
            service: WhiteboardService::new(store, broadcaster),
            registry,
            ws_config,
            max_request_size: HttpDefaults::MAX_REQUEST_SIZE,
        }
    }
}
