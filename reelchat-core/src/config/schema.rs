//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// System prompt sent ahead of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and knowledgeable movie recommendation assistant.
Your responses should be:
- Conversational and engaging
- Focused on movie suggestions
- Limited to 2-3 sentences
- Ask clarifying questions when needed
- Never recommend inappropriate content";

/// Reply returned to the caller when the inference call fails
pub const DEFAULT_FALLBACK_REPLY: &str =
    "I'm having trouble connecting to my movie database. Please try again later.";

/// Root configuration for reelchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Inference provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Conversation behaviour
    #[serde(default)]
    pub chat: ChatConfig,
    /// Session history limits
    #[serde(default)]
    pub session: SessionConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Remote chat-completion provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API credential, usually supplied through `HF_TOKEN`
    #[serde(default)]
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Timeout for one completion request; 0 waits forever
    #[serde(default)]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://router.huggingface.co/nebius/v1".to_string()
}

fn default_model() -> String {
    "google/gemma-2-2b-it".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    200
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: 0,
        }
    }
}

impl ProviderConfig {
    /// The API key, if one is set
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// API key suitable for display (`hf_a…xyz`)
    pub fn masked_api_key(&self) -> String {
        match self.api_key() {
            None => "<unset>".to_string(),
            Some(key) if key.chars().count() <= 8 => "****".to_string(),
            Some(key) => {
                let head: String = key.chars().take(4).collect();
                let tail: String = key
                    .chars()
                    .rev()
                    .take(3)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("{}…{}", head, tail)
            }
        }
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_fallback_reply() -> String {
    DEFAULT_FALLBACK_REPLY.to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// Session history limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of live sessions before least-recently-used eviction
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Idle time after which a session is dropped; 0 disables expiry
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_session_ttl_secs() -> u64 {
    24 * 3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
