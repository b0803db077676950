//! Rendering of a batch result into one context blob

use crate::types::{ExtractedDocument, IngestionBatchResult};

/// Renders extracted documents into the context handed to the chat model
pub struct ContextAssembler;

impl ContextAssembler {
    /// One block per document, in batch order. Empty batch gives `""`.
    pub fn assemble(result: &IngestionBatchResult) -> String {
        Self::assemble_documents(&result.documents)
    }

    pub fn assemble_documents(documents: &[ExtractedDocument]) -> String {
        let mut context = String::new();
        for doc in documents {
            Self::push_document(&mut context, doc);
        }
        context
    }

    fn push_document(context: &mut String, doc: &ExtractedDocument) {
        match &doc.error {
            None => {
                context.push_str(&format!("File: {}\nContent: {}\n\n", doc.name, doc.text));
            }
            Some(failure) => {
                context.push_str(&format!(
                    "File: {}\nError: [{}] {}\n\n",
                    doc.name, failure.kind, failure.message
                ));
            }
        }
    }
}
