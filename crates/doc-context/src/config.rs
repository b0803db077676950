//! Configuration for the ingestion service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "DOC_CONTEXT_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocContextConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Streaming vision endpoint used for image OCR
    pub vision: VisionConfig,
    /// Buffered chat-completion endpoint used for summaries and questions
    pub chat: ChatConfig,
    /// Batch processing configuration
    pub processing: ProcessingConfig,
}

impl DocContextConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::read(path.display().to_string(), e))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$DOC_CONTEXT_CONFIG` or the user config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `<config_dir>/doc-context/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("doc-context").join("config.toml"))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.vision.base_url.trim().is_empty() {
            return Err(Error::Config("vision.base_url must not be empty".to_string()));
        }
        if self.chat.base_url.trim().is_empty() {
            return Err(Error::Config("chat.base_url must not be empty".to_string()));
        }
        if self.processing.parallel_files == Some(0) {
            return Err(Error::Config("processing.parallel_files must be at least 1".to_string()));
        }
        if self.processing.file_timeout_secs == 0 || self.processing.batch_timeout_secs == 0 {
            return Err(Error::Config("processing timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Vision (image OCR) endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Base URL of a Gemini-compatible API
    pub base_url: String,
    /// Model used for image extraction
    pub model: String,
    /// Environment variable holding the API key (sent as `x-goog-api-key`)
    pub api_key_env: String,
    /// System instruction sent with every image
    pub system_instruction: String,
    /// Instruction prompt sent alongside the image
    pub prompt: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash-8b".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            system_instruction:
                "You are a helpful assistant. Make sure to return data in JSON format only."
                    .to_string(),
            prompt: "extract necessary details from this. If its a graph draw some insights from it"
                .to_string(),
            timeout_secs: 120,
        }
    }
}

impl VisionConfig {
    /// Streaming endpoint for the configured model
    pub fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// API key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Chat-completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-1.5-flash-8b".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ChatConfig {
    /// Completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// API key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files extracted concurrently (default: CPU count, max 8)
    pub parallel_files: Option<usize>,
    /// Timeout for a single file in seconds
    pub file_timeout_secs: u64,
    /// Timeout for a whole batch in seconds; completed files are returned as a partial result
    pub batch_timeout_secs: u64,
    /// Files above this size are rejected without parsing
    pub max_file_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_files: None,
            file_timeout_secs: 300,
            batch_timeout_secs: 900,
            max_file_size: 100 * 1024 * 1024,
        }
    }
}

impl ProcessingConfig {
    /// Effective concurrency limit
    pub fn parallel_files(&self) -> usize {
        self.parallel_files
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DocContextConfig = toml::from_str(
            r#"
            [vision]
            model = "gemini-2.0-flash"

            [processing]
            parallel_files = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.vision.model, "gemini-2.0-flash");
        assert_eq!(config.vision.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.processing.parallel_files(), 2);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_stream_url() {
        let vision = VisionConfig {
            base_url: "http://localhost:9000/".to_string(),
            model: "m".to_string(),
            ..Default::default()
        };
        assert_eq!(
            vision.stream_url(),
            "http://localhost:9000/v1beta/models/m:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let mut config = DocContextConfig::default();
        config.processing.parallel_files = Some(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9999").unwrap();

        let config = DocContextConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9999);

        let missing = DocContextConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(Error::Read { .. })));
    }
}
