//! Typed view over the merged YAML configuration.
//!
//! Every section falls back to its `Default` so a missing `config.yml` still
//! yields a runnable (if ungrounded) service.

use serde::Deserialize;

pub const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub app: AppSettings,
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub ocr: OcrSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Upper bound on chat message length, in characters.
    pub max_input_length: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_input_length: 4_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub faq_path: String,
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            faq_path: "public/faq.txt".to_string(),
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_EMBED_MODEL.to_string(),
            base_url: "https://api.cohere.ai".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: "https://api.together.xyz".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub requests_per_minute: u32,
    /// Key clients on the first `x-forwarded-for` hop. Only safe behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 2,
            trust_forwarded_for: false,
        }
    }
}

/// Treats blank strings from YAML or the environment as unset.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
