use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AgentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cricapi_key: Option<String>,
    pub espn_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_model: String,
    pub max_concurrent_requests: usize,
    pub source_timeout_secs: u64,
    pub synthesis_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            cricapi_key: std::env::var("CRICAPI_KEY").ok(),
            espn_api_key: std::env::var("ESPN_CRICKET_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-pro"),
            max_concurrent_requests: env_parse("MAX_CONCURRENT_REQUESTS", 20),
            source_timeout_secs: env_parse("SOURCE_TIMEOUT_SECS", 10),
            synthesis_timeout_secs: env_parse("SYNTHESIS_TIMEOUT_SECS", 60),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 300),
        }
    }

    /// Resolve the AI backend selection. OpenAI takes precedence when both
    /// keys are present.
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        if let Some(key) = &self.openai_api_key {
            return Some(LlmSettings {
                backend: LlmBackend::OpenAi,
                api_key: key.clone(),
                model: self.openai_model.clone(),
            });
        }
        if let Some(key) = &self.gemini_api_key {
            return Some(LlmSettings {
                backend: LlmBackend::Gemini,
                api_key: key.clone(),
                model: self.gemini_model.clone(),
            });
        }
        None
    }

    pub fn agent(&self) -> AgentConfig {
        AgentConfig {
            max_concurrent_requests: self.max_concurrent_requests,
            source_timeout: Duration::from_secs(self.source_timeout_secs),
            synthesis_timeout: Duration::from_secs(self.synthesis_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmBackend {
    OpenAi,
    Gemini,
}

impl LlmBackend {
    pub fn as_str(&self) -> &str {
        match self {
            LlmBackend::OpenAi => "openai",
            LlmBackend::Gemini => "gemini",
        }
    }
}

/// AI backend selection with an explicit, required model identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub api_key: String,
    pub model: String,
}

impl LlmSettings {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.model.trim().is_empty() {
            return Err(AgentError::initialization(format!(
                "no model identifier configured for the {} backend",
                self.backend.as_str()
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(AgentError::initialization(format!(
                "blank API key configured for the {} backend",
                self.backend.as_str()
            )));
        }
        Ok(())
    }
}

/// Runtime limits for one agent instance.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub max_concurrent_requests: usize,
    pub source_timeout: Duration,
    pub synthesis_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 20,
            source_timeout: Duration::from_secs(10),
            synthesis_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(300),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
