//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;

/// Default Gemini REST endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for chat turns (overridable in settings)
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";

/// Default model for world-book illustrations
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Generative API configuration
    pub gemini: GeminiConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
}

/// Generative API configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// Secret API credential
    pub api_key: String,
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Model used for image generation
    pub image_model: String,
    /// Connect timeout for HTTP requests (in seconds)
    pub connect_timeout_secs: u64,
}

// The key never goes to the logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key_set", &!self.api_key.is_empty())
            .field("api_base_url", &self.api_base_url)
            .field("image_model", &self.image_model)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Directory holding one JSON file per store key
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY")
                    .or_else(|_| env::var("API_KEY"))
                    .unwrap_or_default(),
                api_base_url: env::var("GEMINI_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
                image_model: env::var("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
                connect_timeout_secs: env::var("GEMINI_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
            persistence: PersistenceConfig {
                data_dir: env::var_os("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_data_dir),
            },
        }
    }
}

/// `~/.gemini-phone`, or a relative directory when HOME is unset
fn default_data_dir() -> PathBuf {
    if let Some(home) = env::var_os("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".gemini-phone");
        path
    } else {
        PathBuf::from(".gemini-phone")
    }
}
