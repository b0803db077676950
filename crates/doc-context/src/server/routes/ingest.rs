//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::ContextAssembler;
use crate::server::state::AppState;
use crate::types::{IngestResponse, SourceFile};

/// POST /api/ingest - Upload files and extract their text
///
/// Each multipart part with a filename is one source file; its
/// `Content-Type` is taken as the declared media type.
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();
    let mut batch = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::invalid_request(format!("Failed to read multipart field: {}", e))
    })? {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!(
                "Ignoring non-file field '{}'",
                field.name().unwrap_or_default()
            );
            continue;
        };
        let media_type = field.content_type().unwrap_or_default().to_string();

        let data = field.bytes().await.map_err(|e| {
            Error::invalid_request(format!("Failed to read file '{}': {}", filename, e))
        })?;

        tracing::info!("Received file: {} ({} bytes, {})", filename, data.len(), media_type);
        batch.push(SourceFile::new(filename, media_type, data));
    }

    let result = state.pipeline().ingest(batch).await;
    let context = ContextAssembler::assemble(&result);

    tracing::info!(
        "Ingest complete: {} document(s), {} failed, {} chars of context in {}ms",
        result.len(),
        result.failures().count(),
        context.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(IngestResponse {
        batch_id: result.batch_id,
        documents: result.documents,
        context,
        partial: result.partial,
        not_processed: result.not_processed,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
