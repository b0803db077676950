//! HTTP server for document ingestion and chat over the assembled context

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::DocContextConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Ingestion HTTP server
pub struct DocContextServer {
    config: DocContextConfig,
    state: AppState,
}

impl DocContextServer {
    /// Create a server with HTTP clients built from the configuration
    pub fn new(config: DocContextConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server over prepared state
    pub fn with_state(config: DocContextConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            // API routes with body limit for multipart uploads
            .nest("/api", routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Middleware layers (applied bottom to top)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server and run until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting doc-context server on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ContextChat;
    use crate::ingestion::{Extractors, IngestionPipeline};
    use crate::providers::{ChatProvider, VisionOcr};
    use crate::types::ChatTurn;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedOcr;

    #[async_trait]
    impl VisionOcr for FixedOcr {
        async fn extract_via_vision_model(&self, _image: &[u8], media_type: &str) -> Result<String> {
            Ok(format!("{{\"seen\":\"{}\"}}", media_type))
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    /// Replies with the number of messages and the last one
    struct CountingChat;

    #[async_trait]
    impl ChatProvider for CountingChat {
        async fn complete(&self, messages: &[ChatTurn]) -> Result<String> {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            Ok(format!("{} messages, last: {}", messages.len(), last))
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn router() -> Router {
        let config = DocContextConfig::default();
        let pipeline = IngestionPipeline::new(
            config.processing.clone(),
            Extractors::default(),
            Arc::new(FixedOcr),
        );
        let chat = ContextChat::new(Arc::new(CountingChat));
        let state = AppState::from_parts(config.clone(), pipeline, chat);
        DocContextServer::with_state(config, state).build_router()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_info() {
        let response = router()
            .oneshot(Request::get("/api/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "doc-context");
    }

    #[tokio::test]
    async fn test_ingest_multipart() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "hello\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"chart\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "PNG\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"comment\"\r\n\r\n",
            "not a file\r\n",
            "--XBOUNDARY--\r\n"
        );

        let request = Request::post("/api/ingest")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["documents"].as_array().unwrap().len(), 2);
        assert_eq!(json["documents"][0]["strategy"], "plain_text");
        assert_eq!(json["documents"][1]["strategy"], "image");
        assert_eq!(json["partial"], false);
        assert_eq!(
            json["context"],
            "File: notes.txt\nContent: hello\n\nFile: chart\nContent: {\"seen\":\"image/png\"}\n\n"
        );
    }

    #[tokio::test]
    async fn test_summarize() {
        let response = router()
            .oneshot(json_request(
                "/api/summarize",
                serde_json::json!({ "context": "File: a.txt\nContent: hi\n\n" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["summary"],
            "2 messages, last: File: a.txt\nContent: hi\n\n"
        );
    }

    #[tokio::test]
    async fn test_ask_with_history() {
        let response = router()
            .oneshot(json_request(
                "/api/ask",
                serde_json::json!({
                    "context": "File: a.txt\nContent: hi\n\n",
                    "question": "What does it say?",
                    "history": [
                        { "role": "assistant", "content": "A greeting." }
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["answer"],
            "2 messages, last: What does it say?"
        );
    }

    #[tokio::test]
    async fn test_empty_question_is_bad_request() {
        let response = router()
            .oneshot(json_request(
                "/api/ask",
                serde_json::json!({ "context": "ctx", "question": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["type"], "invalid_request");
    }
}
