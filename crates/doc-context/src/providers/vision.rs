//! Image text extraction through a streaming Gemini vision endpoint

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::VisionConfig;
use crate::error::Result;

use super::sse::OcrStreamState;
use super::transport::{HttpTransport, StreamTransport};

/// Trait for turning an image into text
///
/// Implementations:
/// - `StreamingOcrClient`: Gemini `streamGenerateContent` over SSE
#[async_trait]
pub trait VisionOcr: Send + Sync {
    /// Extract text or insights from an image
    async fn extract_via_vision_model(&self, image: &[u8], media_type: &str) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Inline { inline_data: InlineData },
    Text { text: String },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Streaming vision OCR client
pub struct StreamingOcrClient {
    transport: Arc<dyn StreamTransport>,
    config: VisionConfig,
}

impl StreamingOcrClient {
    /// Create a client over an explicit transport
    pub fn new(transport: Arc<dyn StreamTransport>, config: VisionConfig) -> Self {
        Self { transport, config }
    }

    /// Create a client over HTTP using the configured API key variable
    pub fn from_config(config: &VisionConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeout_secs),
            config.api_key(),
        )?;
        Ok(Self::new(Arc::new(transport), config.clone()))
    }

    fn build_request(&self, image: &[u8], media_type: &str) -> GenerateRequest {
        GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: self.config.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: media_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                    Part::Text {
                        text: self.config.prompt.clone(),
                    },
                ],
            }],
            // Deterministic output
            generation_config: GenerationConfig { temperature: 0.0 },
        }
    }
}

#[async_trait]
impl VisionOcr for StreamingOcrClient {
    async fn extract_via_vision_model(&self, image: &[u8], media_type: &str) -> Result<String> {
        let body = serde_json::to_value(self.build_request(image, media_type))?;
        let url = self.config.stream_url();

        tracing::info!(
            "Sending {} byte {} image to {}",
            image.len(),
            media_type,
            self.config.model
        );

        let mut stream = self.transport.post_stream(&url, &body).await.map_err(|e| {
            tracing::error!("Vision request failed: {}", e);
            e
        })?;

        let mut state = OcrStreamState::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::error!("Vision stream interrupted: {}", e);
                e
            })?;
            state.push_chunk(&chunk)?;
        }

        let text = state.finish()?;
        tracing::info!("Vision model returned {} chars", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::providers::transport::ByteStream;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Replays scripted chunks and records the request
    struct ScriptedTransport {
        chunks: Vec<std::result::Result<&'static str, &'static str>>,
        refuse: bool,
        captured: Mutex<Option<(String, serde_json::Value)>>,
    }

    impl ScriptedTransport {
        fn new(chunks: Vec<std::result::Result<&'static str, &'static str>>) -> Self {
            Self {
                chunks,
                refuse: false,
                captured: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl StreamTransport for ScriptedTransport {
        async fn post_stream(&self, url: &str, body: &serde_json::Value) -> Result<ByteStream> {
            *self.captured.lock().unwrap() = Some((url.to_string(), body.clone()));
            if self.refuse {
                return Err(Error::transport("HTTP 503 Service Unavailable - overloaded"));
            }

            let items: Vec<Result<Bytes>> = self
                .chunks
                .iter()
                .map(|c| match c {
                    Ok(s) => Ok(Bytes::from_static(s.as_bytes())),
                    Err(e) => Err(Error::transport(*e)),
                })
                .collect();
            Ok(Box::pin(futures_util::stream::iter(items)))
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> StreamingOcrClient {
        StreamingOcrClient::new(transport, VisionConfig::default())
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let ocr = client(Arc::clone(&transport));

        ocr.extract_via_vision_model(b"\x89PNG", "image/png").await.unwrap();

        let (url, body) = transport.captured.lock().unwrap().clone().unwrap();
        assert!(url.ends_with(":streamGenerateContent?alt=sse"));
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(body["contents"][0]["parts"][0]["inline_data"]["data"], "iVBORw==");
        assert_eq!(
            body["contents"][0]["parts"][1]["text"],
            VisionConfig::default().prompt.as_str()
        );
        assert!(body["system_instruction"]["parts"][0]["text"].is_string());
    }

    #[tokio::test]
    async fn test_chunked_stream_reassembled() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok("data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Revenue: 4.2M, the resul"),
            Ok("t of Q3\"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" growth\"}]}}]}\r\n\r\n"),
        ]));

        let text = client(transport)
            .extract_via_vision_model(b"img", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(text, "Revenue: 4.2M, the result of Q3 growth");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let mut scripted = ScriptedTransport::new(vec![]);
        scripted.refuse = true;

        let err = client(Arc::new(scripted))
            .extract_via_vision_model(b"img", "image/png")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn test_interrupted_stream_discards_partial_text() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok("data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}]}}]}\n"),
            Err("connection reset"),
        ]));

        let err = client(transport)
            .extract_via_vision_model(b"img", "image/png")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }
}
