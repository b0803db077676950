//! Outbound model endpoints
//!
//! The vision endpoint streams its answer as server-sent events; the chat
//! endpoint returns a buffered completion. Both sit behind traits so the
//! pipeline and server can run against fakes.

pub mod chat;
pub mod sse;
pub mod transport;
pub mod vision;

pub use chat::{ChatClient, ChatProvider};
pub use sse::OcrStreamState;
pub use transport::{ByteStream, HttpTransport, StreamTransport};
pub use vision::{StreamingOcrClient, VisionOcr};
