//! Router assembly and server lifecycle

use crate::config::HttpConfig;
use crate::errors::{HttpError, HttpResult};
use crate::routes::{api_routes, health_check, viewer_socket};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const ROOT_PATH: &str = "/";

/// Build the application router with its middleware stack
pub fn build_router(mut state: AppState, config: &HttpConfig) -> HttpResult<Router> {
    state.max_request_size = config.max_request_size;

    let mut router = api_routes()
        .route(&config.health_check_path, get(health_check))
        .route(&config.ws_path, get(viewer_socket));

    // viewers may also connect on the bare host, e.g. ws://localhost:3000
    if config.ws_path != ROOT_PATH {
        router = router.route(ROOT_PATH, get(viewer_socket));
    }

    let router = router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_request_size))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(config: &HttpConfig) -> HttpResult<CorsLayer> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| HttpError::config(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<HttpResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Bind `config`'s address and serve until Ctrl+C or SIGTERM
pub async fn start_server(config: &HttpConfig, router: Router) -> HttpResult<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HttpError::startup(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Viewer WebSocket endpoint: ws://{}{}", addr, config.ws_path);

    serve(listener, router, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> HttpResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| HttpError::internal(format!("Server error: {}", e)))
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use board_share::WebSocketConfig;
    use board_store::JsonFileStore;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, AppState) {
        let state = AppState::new(Arc::new(JsonFileStore::in_memory()), WebSocketConfig::default());
        let router = build_router(state.clone(), &HttpConfig::default()).unwrap();
        (router, state)
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn create(router: &Router) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/api/whiteboard/new")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        body["boardId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (router, _) = app();
        let board_id = create(&router).await;

        let (status, body) = call(&router, get("/api/whiteboards")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["boardId"], board_id);
        assert_eq!(body[0]["title"], "Untitled whiteboard");
        assert!(body[0].get("content").is_none());
    }

    #[tokio::test]
    async fn test_get_whiteboard() {
        let (router, _) = app();
        let board_id = create(&router).await;

        let (status, body) = call(&router, get(&format!("/api/whiteboard?id={}", board_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], json!({}));

        let (status, body) = call(&router, get("/api/whiteboard")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing boardId"}));

        let (status, body) = call(&router, get("/api/whiteboard?id=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Whiteboard not found"}));
    }

    #[tokio::test]
    async fn test_save_whiteboard() {
        let (router, _) = app();
        let board_id = create(&router).await;

        let (status, body) = call(
            &router,
            post_json(
                "/api/whiteboard/save",
                json!({"boardId": board_id, "title": "Plan", "content": {"shapes": []}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, body) = call(&router, get(&format!("/api/whiteboard?id={}", board_id))).await;
        assert_eq!(body["title"], "Plan");
        assert_eq!(body["content"], json!({"shapes": []}));
    }

    #[tokio::test]
    async fn test_save_rejects_incomplete_requests() {
        let (router, _) = app();
        let board_id = create(&router).await;

        for body in [
            json!({"title": "Plan", "content": {}}),
            json!({"boardId": board_id, "title": "", "content": {}}),
            json!({"boardId": board_id, "title": "Plan"}),
            json!({"boardId": board_id, "title": "Plan", "content": null}),
            json!({"boardId": board_id, "title": "Plan", "content": ""}),
            json!({"boardId": board_id, "title": "Plan", "content": 0}),
            json!({"boardId": board_id, "title": "Plan", "content": 0.0}),
            json!({"boardId": board_id, "title": "Plan", "content": false}),
        ] {
            let (status, _) = call(&router, post_json("/api/whiteboard/save", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        // empty containers still count as content
        for content in [json!([]), json!({}), json!(1), json!(true)] {
            let (status, _) = call(
                &router,
                post_json(
                    "/api/whiteboard/save",
                    json!({"boardId": board_id, "title": "Plan", "content": content}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/whiteboard/save")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = call(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &router,
            post_json(
                "/api/whiteboard/save",
                json!({"boardId": "nope", "title": "Plan", "content": {}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_whiteboard() {
        let (router, _) = app();
        let board_id = create(&router).await;

        for id in [board_id.as_str(), "unknown"] {
            let request = Request::builder()
                .method("DELETE")
                .uri(format!("/api/whiteboard/{}", id))
                .body(Body::empty())
                .unwrap();
            let (status, body) = call(&router, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"success": true}));
        }

        let (_, body) = call(&router, get("/api/whiteboards")).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_share_links() {
        let (router, _) = app();
        let board_id = create(&router).await;

        let (status, body) = call(
            &router,
            get(&format!("/api/whiteboard/generate-share?boardId={}", board_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let share_id = body["shareId"].as_str().unwrap().to_string();

        let (status, body) = call(
            &router,
            get(&format!("/api/whiteboard/get-by-share?shareId={}", share_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"title": "Untitled whiteboard", "content": {}}));

        let (status, _) = call(&router, get("/api/whiteboard/get-by-share?shareId=bogus")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, get("/api/whiteboard/generate-share")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&router, get("/api/whiteboard/generate-share?boardId=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_share_counts() {
        let (router, _) = app();
        let (status, body) = call(&router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["shares"]["active_shares"], 0);
        assert_eq!(body["shares"]["bound_connections"], 0);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let state = AppState::new(Arc::new(JsonFileStore::in_memory()), WebSocketConfig::default());
        let config = HttpConfig {
            max_request_size: 64,
            ..HttpConfig::default()
        };
        let router = build_router(state, &config).unwrap();

        let payload =
            json!({"boardId": "b", "title": "t", "content": {"padding": "x".repeat(256)}});

        // rejected up front from the declared length
        let mut request = post_json("/api/whiteboard/save", payload.clone());
        request.headers_mut().insert(
            header::CONTENT_LENGTH,
            HeaderValue::from(payload.to_string().len()),
        );
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        // and while reading a body without one
        let (status, body) = call(&router, post_json("/api/whiteboard/save", payload)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "Request body exceeds the 64 byte limit"}));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (router, _) = app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/whiteboards")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[test]
    fn test_invalid_cors_origin() {
        let state = AppState::new(Arc::new(JsonFileStore::in_memory()), WebSocketConfig::default());
        let config = HttpConfig {
            cors_origins: vec!["bad\norigin".to_string()],
            ..HttpConfig::default()
        };
        assert!(matches!(
            build_router(state, &config),
            Err(HttpError::ConfigError { .. })
        ));
    }
}
