//! Request types for the summary and question endpoints

use serde::{Deserialize, Serialize};

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of caller-held conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/summarize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    /// Assembled context to summarize
    pub context: String,
}

/// Body of `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Assembled context the answer must refer to
    pub context: String,
    /// The user's question
    pub question: String,
    /// Conversation so far, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}
