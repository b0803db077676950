//! doc-context: turn uploaded documents into one normalized LLM context
//!
//! Files are classified by name and media type, extracted per format (PDF
//! pages, workbook rows, Word paragraphs, vision-model OCR for images, UTF-8
//! for everything else) and rendered into a single delimited context string.
//! A failure in one file is recorded on that file's document and never stops
//! the rest of the batch.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use config::DocContextConfig;
pub use error::{Error, ErrorKind, Result};
pub use generation::{ContextAssembler, ContextChat};
pub use ingestion::IngestionPipeline;
pub use types::{
    ExtractedDocument, ExtractionFailure, ExtractionStrategy, IngestionBatchResult, SourceFile,
};
