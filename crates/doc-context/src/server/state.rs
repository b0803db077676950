//! Shared state for the HTTP server

use std::sync::Arc;

use crate::config::DocContextConfig;
use crate::error::Result;
use crate::generation::ContextChat;
use crate::ingestion::IngestionPipeline;
use crate::providers::ChatClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: DocContextConfig,
    /// Extraction pipeline (parsers + vision OCR)
    pipeline: IngestionPipeline,
    /// Chat endpoint for summaries and questions
    chat: ContextChat,
}

impl AppState {
    /// Create state with HTTP clients built from the configuration
    pub fn new(config: DocContextConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let pipeline = IngestionPipeline::from_config(&config)?;
        tracing::info!(
            "Vision OCR via {} ({})",
            config.vision.model,
            config.vision.base_url
        );

        let chat = ContextChat::new(Arc::new(ChatClient::new(&config.chat)?));
        tracing::info!("Chat via {} ({})", config.chat.model, config.chat.base_url);

        Ok(Self::from_parts(config, pipeline, chat))
    }

    /// Assemble state from already-built components
    pub fn from_parts(config: DocContextConfig, pipeline: IngestionPipeline, chat: ContextChat) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                chat,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &DocContextConfig {
        &self.inner.config
    }

    /// Get the ingestion pipeline
    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.inner.pipeline
    }

    /// Get the chat service
    pub fn chat(&self) -> &ContextChat {
        &self.inner.chat
    }
}
