use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{LlmBackend, LlmSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;

    fn model(&self) -> &str;
}

/// Build the concrete provider for validated settings.
pub fn from_settings(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    match settings.backend {
        LlmBackend::OpenAi => Arc::new(OpenAiProvider::new(
            settings.api_key.clone(),
            settings.model.clone(),
        )),
        LlmBackend::Gemini => Arc::new(GeminiProvider::new(
            settings.api_key.clone(),
            settings.model.clone(),
        )),
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let api_messages: Vec<OpenAiMessage> = messages
            .into_iter()
            .map(|m| OpenAiMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: Some(4000),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("OpenAI API error {}: {}", status, body);
        }

        let result: OpenAiResponse = response.json().await?;
        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiPart>,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| GeminiContent {
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            });

        let contents: Vec<GeminiContent> = messages
            .into_iter()
            .filter(|m| m.role != "system")
            .map(|m| GeminiContent {
                parts: vec![GeminiPart { text: m.content }],
            })
            .collect();

        let request = GeminiRequest {
            contents,
            system_instruction,
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let result: GeminiResponse = response.json().await?;
        result
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No candidates in response"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Mock provider for testing
pub struct MockLlmProvider {
    response: String,
    fail: bool,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            response: "Mock tactical analysis".to_string(),
            fail: false,
        }
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail: true,
        }
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _messages: Vec<Message>) -> Result<String> {
        if self.fail {
            anyhow::bail!("mock synthesis failure");
        }
        Ok(self.response.clone())
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmBackend, LlmSettings};

    #[test]
    fn test_message_constructors() {
        let sys = Message::system("test");
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, "test");

        let user = Message::user("hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "hello");
    }

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::new("test-key".to_string(), "gpt-4o".to_string());
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_gemini_provider_creation() {
        let provider = GeminiProvider::new("test-key".to_string(), "gemini-1.5-pro".to_string());
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_from_settings_picks_backend() {
        let provider = from_settings(&LlmSettings {
            backend: LlmBackend::Gemini,
            api_key: "test-key".to_string(),
            model: "gemini-1.5-pro".to_string(),
        });
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockLlmProvider::with_response("field at deep square leg");
        let result = provider
            .complete(vec![Message::user("test")])
            .await
            .unwrap();
        assert!(result.contains("deep square leg"));
    }

    #[tokio::test]
    async fn test_mock_provider_failure() {
        let provider = MockLlmProvider::failing();
        let result = provider.complete(vec![Message::user("test")]).await;
        assert!(result.is_err());
    }
}
