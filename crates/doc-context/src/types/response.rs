//! Extraction outcomes and API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::ExtractionStrategy;
use crate::error::{Error, ErrorKind};

/// Why a file produced no text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl From<&Error> for ExtractionFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Text extracted from one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Source filename
    pub name: String,
    /// Strategy the file was dispatched to
    pub strategy: ExtractionStrategy,
    /// Extracted text (empty on failure)
    pub text: String,
    /// Set when extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractionFailure>,
}

impl ExtractedDocument {
    /// Successful extraction
    pub fn success(name: impl Into<String>, strategy: ExtractionStrategy, text: String) -> Self {
        Self {
            name: name.into(),
            strategy,
            text,
            error: None,
        }
    }

    /// Failed extraction
    pub fn failure(name: impl Into<String>, strategy: ExtractionStrategy, err: &Error) -> Self {
        Self {
            name: name.into(),
            strategy,
            text: String::new(),
            error: Some(ExtractionFailure::from(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered outcome of one ingestion batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionBatchResult {
    /// Batch identifier
    pub batch_id: Uuid,
    /// Documents in submission order
    pub documents: Vec<ExtractedDocument>,
    /// True when the batch was cut short and some files were never processed
    pub partial: bool,
    /// Names of files that were never processed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_processed: Vec<String>,
    /// When the batch finished
    pub completed_at: DateTime<Utc>,
}

impl IngestionBatchResult {
    /// Complete result
    pub fn new(documents: Vec<ExtractedDocument>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            documents,
            partial: false,
            not_processed: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    /// Result of a cancelled batch
    pub fn partial(documents: Vec<ExtractedDocument>, not_processed: Vec<String>) -> Self {
        Self {
            partial: true,
            not_processed,
            ..Self::new(documents)
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents that failed extraction
    pub fn failures(&self) -> impl Iterator<Item = &ExtractedDocument> {
        self.documents.iter().filter(|d| !d.is_success())
    }
}

/// Response body of `POST /api/ingest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Batch identifier
    pub batch_id: Uuid,
    /// Per-file outcomes
    pub documents: Vec<ExtractedDocument>,
    /// Assembled context
    pub context: String,
    /// True when the batch timed out before every file was processed
    pub partial: bool,
    /// Files that were never processed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_processed: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response body of `POST /api/summarize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Response body of `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_kind() {
        let err = Error::transport("HTTP 503 Service Unavailable - overloaded");
        let doc = ExtractedDocument::failure("scan.png", ExtractionStrategy::Image, &err);

        assert!(!doc.is_success());
        assert_eq!(doc.text, "");
        let failure = doc.error.as_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::TransportFailure);
        assert!(failure.message.contains("503"));
    }

    #[test]
    fn test_document_json_shape() {
        let ok = ExtractedDocument::success("a.txt", ExtractionStrategy::PlainText, "hi".to_string());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["strategy"], "plain_text");
        assert!(json.get("error").is_none());

        let failed = ExtractedDocument::failure(
            "b.pdf",
            ExtractionStrategy::Pdf,
            &Error::file_parse("b.pdf", "bad xref"),
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"]["kind"], "unsupported_or_corrupt");
    }

    #[test]
    fn test_partial_result() {
        let done = ExtractedDocument::success("a.txt", ExtractionStrategy::PlainText, String::new());
        let result = IngestionBatchResult::partial(vec![done], vec!["b.png".to_string()]);

        assert!(result.partial);
        assert_eq!(result.len(), 1);
        assert_eq!(result.not_processed, ["b.png"]);
        assert_eq!(result.failures().count(), 0);

        let complete = IngestionBatchResult::new(Vec::new());
        assert!(!complete.partial);
        assert!(complete.is_empty());
        assert!(serde_json::to_value(&complete).unwrap().get("not_processed").is_none());
    }
}
