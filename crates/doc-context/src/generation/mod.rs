//! Context assembly and chat over an assembled context

pub mod context;
pub mod prompt;

pub use context::ContextAssembler;
pub use prompt::PromptBuilder;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::ChatProvider;
use crate::types::ChatTurn;

/// Summaries and follow-up answers over a context string.
///
/// History is owned by the caller and passed in on every question.
#[derive(Clone)]
pub struct ContextChat {
    provider: Arc<dyn ChatProvider>,
}

impl ContextChat {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Summarize everything in `context`
    pub async fn summarize(&self, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            return Err(Error::invalid_request("context is empty"));
        }

        tracing::info!("Summarizing {} chars of context", context.len());
        self.provider.complete(&PromptBuilder::summary(context)).await
    }

    /// Answer `question` against `context` and the prior turns
    pub async fn ask(&self, context: &str, history: &[ChatTurn], question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_request("question is empty"));
        }

        tracing::info!(
            "Answering question with {} prior turn(s) and {} chars of context",
            history.len(),
            context.len()
        );
        self.provider
            .complete(&PromptBuilder::ask(context, history, question))
            .await
    }
}
