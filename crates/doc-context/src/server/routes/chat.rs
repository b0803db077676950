//! Summary and question endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse, SummarizeRequest, SummaryResponse};

/// POST /api/summarize - Summarize an assembled context
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>> {
    let summary = state.chat().summarize(&request.context).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// POST /api/ask - Answer a question with caller-held history
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    tracing::info!("Question: \"{}\"", request.question);

    let answer = state
        .chat()
        .ask(&request.context, &request.history, &request.question)
        .await?;
    Ok(Json(AskResponse { answer }))
}
