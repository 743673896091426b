use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChatError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub chat: ConversationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Per-request timeout. Zero disables it.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Replies longer than this are reflowed before they are shown.
    #[serde(default = "default_wrap_threshold")]
    pub wrap_threshold: usize,

    /// Column width used when reflowing a reply.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    #[serde(default = "default_input_char_limit")]
    pub input_char_limit: usize,

    /// Rows of the input box, excluding its border.
    #[serde(default = "default_input_height")]
    pub input_height: u16,

    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Seeded as the first System message of every session.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_credentials_file() -> PathBuf {
    PathBuf::from("config.json")
}
fn default_timeout() -> u64 {
    120
}
fn default_wrap_threshold() -> usize {
    150
}
fn default_wrap_width() -> usize {
    120
}
fn default_input_char_limit() -> usize {
    280
}
fn default_input_height() -> u16 {
    3
}
fn default_tick_rate_ms() -> u64 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            wrap_threshold: default_wrap_threshold(),
            wrap_width: default_wrap_width(),
            input_char_limit: default_input_char_limit(),
            input_height: default_input_height(),
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_seconds > 0).then(|| std::time::Duration::from_secs(self.timeout_seconds))
    }
}

impl ChatConfig {
    /// Load config from ~/.config/chatterm/config.toml, creating defaults if missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit path, writing defaults there if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path).map_err(|e| {
                ChatError::Config(format!(
                    "Failed to read {}: {e}",
                    config_path.display()
                ))
            })?;
            let config: ChatConfig = toml::from_str(&contents).map_err(|e| {
                ChatError::Config(format!(
                    "Failed to parse {}: {e}",
                    config_path.display()
                ))
            })?;
            Ok(config)
        } else {
            let config = ChatConfig::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Save config to the given path.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ChatError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChatError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join("chatterm").join("config.toml"))
    }
}

/// The API key, read once at startup from a JSON file of the form
/// `{"API_KEY": "..."}`.
#[derive(Clone, Deserialize)]
pub struct Credential {
    #[serde(rename = "API_KEY")]
    api_key: String,
}

impl Credential {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Credential(format!("Failed to read {}: {e}", path.display()))
        })?;
        let credential: Credential = serde_json::from_str(&contents).map_err(|e| {
            ChatError::Credential(format!("Failed to parse {}: {e}", path.display()))
        })?;
        if credential.api_key.trim().is_empty() {
            return Err(ChatError::Credential(format!(
                "{} has an empty API_KEY",
                path.display()
            )));
        }
        Ok(credential)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.trim()
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
