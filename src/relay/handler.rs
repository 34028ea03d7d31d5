use crate::page::{AssetMode, IndexPage, CLIENT_SCRIPT, CLIENT_STYLE};
use crate::relay::{engine::RelayEngine, error::RelayResult};
use crate::types::{ChatRequest, ChatResponse};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RelayHandler {
    engine: Arc<RelayEngine>,
    assets: AssetMode,
    page: IndexPage,
}

impl RelayHandler {
    pub fn new(engine: Arc<RelayEngine>, assets: AssetMode) -> Self {
        let page = IndexPage::new(engine.keys().has_paid(), &assets);
        Self {
            engine,
            assets,
            page,
        }
    }

    pub fn assets(&self) -> &AssetMode {
        &self.assets
    }

    /// `POST /api/chat`
    ///
    /// The body is read raw so that malformed JSON is treated as an empty
    /// request and reported through validation.
    pub async fn chat(
        State(handler): State<Arc<RelayHandler>>,
        body: Bytes,
    ) -> RelayResult<Json<ChatResponse>> {
        debug!("Received chat request ({} bytes)", body.len());

        let request = ChatRequest::from_body_lenient(&body);
        let response = handler.engine.relay(request).await?;

        Ok(Json(response))
    }

    /// `GET /`
    pub async fn index(State(handler): State<Arc<RelayHandler>>) -> Html<String> {
        Html(handler.page.html().to_string())
    }

    /// Health check endpoint
    pub async fn health_check() -> Result<&'static str, StatusCode> {
        Ok("OK")
    }

    pub async fn client_script() -> impl IntoResponse {
        (
            [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
            CLIENT_SCRIPT,
        )
    }

    pub async fn client_style() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], CLIENT_STYLE)
    }
}
