pub mod llm;

pub use llm::{from_settings, GeminiProvider, LlmProvider, Message, MockLlmProvider, OpenAiProvider};
