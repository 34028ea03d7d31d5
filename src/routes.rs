use crate::page::AssetMode;
use crate::relay::RelayHandler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(handler: Arc<RelayHandler>, body_limit: usize) -> Router {
    let router = Router::new()
        .route("/", get(RelayHandler::index))
        .route("/api/chat", post(RelayHandler::chat))
        // Health check endpoint
        .route("/health", get(RelayHandler::health_check));

    let router = match handler.assets() {
        AssetMode::Embedded => router
            .route("/assets/client.js", get(RelayHandler::client_script))
            .route("/assets/client.css", get(RelayHandler::client_style)),
        AssetMode::Directory(dir) => router.nest_service("/client", ServeDir::new(dir.join("client"))),
    };

    router
        .with_state(handler)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{Generator, KeyRing, RelayEngine, RemoteError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Silent;

    #[async_trait]
    impl Generator for Silent {
        async fn generate(&self, _model: &str, _message: &str) -> Result<Option<String>, RemoteError> {
            Ok(None)
        }
    }

    fn create_test_app(assets: AssetMode) -> Router {
        let engine = Arc::new(RelayEngine::new(KeyRing::new(Arc::new(Silent), None)));
        let handler = Arc::new(RelayHandler::new(engine, assets));
        create_router(handler, 1024)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(AssetMode::Embedded);

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let app = create_test_app(AssetMode::Embedded);

        let request = Request::builder()
            .method("GET")
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_embedded_assets_served() {
        let app = create_test_app(AssetMode::Embedded);

        let request = Request::builder()
            .uri("/assets/client.js")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/javascript; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_static_dir_served_in_production() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("client")).unwrap();
        std::fs::write(dir.path().join("client").join("client.js"), "console.log(1);").unwrap();

        let app = create_test_app(AssetMode::Directory(dir.path().to_path_buf()));

        let request = Request::builder()
            .uri("/client/client.js")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "console.log(1);");

        let request = Request::builder()
            .uri("/assets/client.js")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let app = create_test_app(AssetMode::Embedded);

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .header("content-length", "4096")
            .body(Body::from("x".repeat(4096)))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
