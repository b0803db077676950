//! Buffered chat-completion client for OpenAI-compatible endpoints

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::types::ChatTurn;

/// Trait for single-shot chat completion
///
/// Implementations:
/// - `ChatClient`: `POST {base_url}/chat/completions` with a bearer token
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the messages and return the first choice's content
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// OpenAI-compatible chat client
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
    api_key: Option<String>,
}

impl ChatClient {
    /// Create a new chat client; the bearer token is read from `config.api_key_env`
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key().is_none() {
            tracing::warn!(
                "{} is not set, chat requests will be sent without credentials",
                config.api_key_env
            );
        }

        Ok(Self {
            client,
            api_key: config.api_key(),
            config: config.clone(),
        })
    }
}

/// Interpret a buffered completion body.
///
/// An `error` object wins over the status code; a success without
/// `choices[0].message.content` is a decode failure.
fn parse_completion(status: StatusCode, body: &str) -> Result<String> {
    let parsed = serde_json::from_str::<CompletionResponse>(body);

    if let Ok(CompletionResponse {
        error: Some(err), ..
    }) = &parsed
    {
        return Err(Error::transport(err.message.clone()));
    }

    if !status.is_success() {
        return Err(Error::transport(format!("HTTP {} - {}", status, body)));
    }

    let response =
        parsed.map_err(|e| Error::decode(format!("Failed to parse chat response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| Error::decode("No content in chat completion response"))
}

#[async_trait]
impl ChatProvider for ChatClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        tracing::debug!(
            "Chat completion with {} message(s) on {}",
            messages.len(),
            self.config.model
        );

        let mut builder = self.client.post(self.config.completions_url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read chat response: {}", e)))?;

        parse_completion(status, &body).map_err(|e| {
            tracing::error!("Chat completion failed: {}", e);
            e
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ChatRole;

    #[test]
    fn test_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Two invoices, one overdue."}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(
            parse_completion(StatusCode::OK, body).unwrap(),
            "Two invoices, one overdue."
        );
    }

    #[test]
    fn test_error_body_is_transport_failure() {
        let body = r#"{"error":{"message":"API key not valid","code":400}}"#;

        let err = parse_completion(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(err.to_string().contains("API key not valid"));

        // Some gateways report errors with a 200
        let err = parse_completion(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn test_non_success_without_error_object() {
        let err = parse_completion(StatusCode::BAD_GATEWAY, "<html>upstream</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_missing_content_is_decode_failure() {
        for body in [r#"{"choices":[]}"#, r#"{"choices":[{"message":{}}]}"#, "not json"] {
            let err = parse_completion(StatusCode::OK, body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DecodeFailure, "{}", body);
        }
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![
            ChatTurn::new(ChatRole::System, "be brief"),
            ChatTurn::new(ChatRole::User, "hello"),
        ];
        let body = serde_json::to_value(CompletionRequest {
            model: "gemini-1.5-flash-8b",
            messages: &messages,
        })
        .unwrap();

        assert_eq!(body["model"], "gemini-1.5-flash-8b");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }
}
