//! Core types for the ingestion pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{ExtractionStrategy, SourceFile};
pub use query::{AskRequest, ChatRole, ChatTurn, SummarizeRequest};
pub use response::{
    AskResponse, ExtractedDocument, ExtractionFailure, IngestResponse, IngestionBatchResult,
    SummaryResponse,
};
