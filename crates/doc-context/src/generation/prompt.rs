//! Message templates for summaries and follow-up questions

use crate::types::{ChatRole, ChatTurn};

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Analyze the provided files and give a summary. Be concise but informative.";

/// Prompt builder for the chat endpoint
pub struct PromptBuilder;

impl PromptBuilder {
    /// Summary request: the whole context as a single user message
    pub fn summary(context: &str) -> Vec<ChatTurn> {
        vec![
            ChatTurn::new(ChatRole::System, SUMMARY_SYSTEM_PROMPT),
            ChatTurn::new(ChatRole::User, context),
        ]
    }

    /// Question request: context and prior turns are folded into the system message
    pub fn ask(context: &str, history: &[ChatTurn], question: &str) -> Vec<ChatTurn> {
        let system = format!(
            r#"You are a helpful assistant. You will converse with the user. Act like a human.
The user will ask you questions based on the context provided.
Refer the provided context and conversation to answer user question.
This is the CONTEXT of all the files: {context} and
this is the CONVERSATION so far: {conversation}"#,
            context = context,
            conversation = Self::render_history(history)
        );

        vec![
            ChatTurn::new(ChatRole::System, system),
            ChatTurn::new(ChatRole::User, question),
        ]
    }

    /// `role: content` per turn, separated by blank lines
    pub fn render_history(history: &[ChatTurn]) -> String {
        history
            .iter()
            .map(|turn| format!("{}: {}", Self::role_label(turn.role), turn.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn role_label(role: ChatRole) -> &'static str {
        match role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_messages() {
        let messages = PromptBuilder::summary("File: a.txt\nContent: hi\n\n");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("give a summary"));
        assert_eq!(messages[1].content, "File: a.txt\nContent: hi\n\n");
    }

    #[test]
    fn test_ask_folds_history() {
        let history = vec![
            ChatTurn::new(ChatRole::Assistant, "Two invoices."),
            ChatTurn::new(ChatRole::User, "Which is larger?"),
            ChatTurn::new(ChatRole::Assistant, "The March one."),
        ];
        let messages = PromptBuilder::ask("File: a.pdf\nContent: ...", &history, "By how much?");

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("CONTEXT of all the files: File: a.pdf"));
        assert!(messages[0].content.contains(
            "assistant: Two invoices.\n\nuser: Which is larger?\n\nassistant: The March one."
        ));
        assert_eq!(messages[1], ChatTurn::new(ChatRole::User, "By how much?"));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(PromptBuilder::render_history(&[]), "");
    }
}
