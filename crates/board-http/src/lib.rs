//! # board-http
//!
//! HTTP surface of the shared-whiteboard service: the REST API for documents
//! and share links, the `/ws` upgrade route for share-link viewers, and the
//! server lifecycle around them.
//!
//! Saving a document through `POST /api/whiteboard/save` persists it and then
//! pushes an `update` message to every viewer bound to the document's share
//! token.

pub mod config;
pub mod errors;
pub mod logging;
pub mod routes;
pub mod server;
pub mod service;
pub mod state;

pub use config::{HttpConfig, HttpDefaults};
pub use errors::{HttpError, HttpResult};
pub use logging::{init_logging, log_shutdown_info, log_startup_info, LoggingConfig};
pub use server::{build_router, serve, shutdown_signal, start_server};
pub use service::WhiteboardService;
pub use state::AppState;
