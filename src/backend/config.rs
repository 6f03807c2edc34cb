//! Transcription provider configuration as reported by the backend

use serde::{Deserialize, Serialize};
use std::fmt;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "whisper-1";

/// Either the local engine or a cloud provider record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TranscriptionConfig {
    Local,
    Cloud(CloudProviderConfig),
}

impl TranscriptionConfig {
    pub fn is_cloud(&self) -> bool {
        matches!(self, TranscriptionConfig::Cloud(_))
    }
}

/// Connection details for an OpenAI-compatible transcription API
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudProviderConfig {
    /// Provider identifier (e.g., "openai", "groq")
    pub provider: String,
    pub api_key: String,
    /// Base URL of the API (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    /// Model name (e.g., "whisper-1")
    pub model: String,
}

impl CloudProviderConfig {
    pub fn new(provider: &str, api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn openai(api_key: &str) -> Self {
        Self::new("openai", api_key, OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL)
    }

    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Endpoint used for audio transcription requests
    pub fn transcriptions_url(&self) -> String {
        format!("{}/audio/transcriptions", self.normalized_base_url())
    }

    /// Human-readable provider name for status display
    pub fn display_name(&self) -> String {
        match self.provider.trim().to_ascii_lowercase().as_str() {
            "openai" => "OpenAI".to_string(),
            "groq" => "Groq".to_string(),
            "soniox" => "Soniox".to_string(),
            _ => self.provider.trim().to_string(),
        }
    }
}

impl fmt::Debug for CloudProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
