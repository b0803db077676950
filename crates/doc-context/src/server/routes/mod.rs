//! API routes

pub mod chat;
pub mod ingest;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Chat over an assembled context
        .route("/summarize", post(chat::summarize))
        .route("/ask", post(chat::ask))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "doc-context",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document ingestion into a single LLM-ready context",
        "endpoints": {
            "POST /api/ingest": "Upload files (multipart) and get per-file text plus the assembled context",
            "POST /api/summarize": "Summarize an assembled context",
            "POST /api/ask": "Answer a question against a context and prior conversation"
        },
        "formats": {
            "pdf": "Per-page text extraction",
            "spreadsheet": "xlsx, xls and csv as tab-separated rows",
            "docx": "Paragraph text",
            "image": "Vision model OCR (jpg, jpeg, png, webp, gif)",
            "text": "Anything else, as UTF-8"
        }
    }))
}
