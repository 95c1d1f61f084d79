pub mod fallback;

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::acquisition::AcquiredData;
use crate::providers::{LlmProvider, Message};
use crate::types::{AnalysisMetadata, AnalysisResult, GeneratedBy, RequestId};

/// Source marker appended when the response text came from the AI backend.
const AI_SOURCE_MARKER: &str = "AI";

const SYSTEM_PROMPT: &str = "You are the Tactics Master, an expert cricket analyst \
who helps coaches make data-driven tactical decisions. Structure your analysis with \
key findings, identified weaknesses or opportunities, and specific bowling and \
fielding recommendations. Be concise and actionable.";

/// Outcome of composing a response. `synthesis_error` is set when the AI path
/// was attempted and failed, in which case `result` holds the fallback.
pub struct Composed {
    pub result: AnalysisResult,
    pub synthesis_error: Option<String>,
}

/// Chooses between AI synthesis and the deterministic fallback.
///
/// Decision order: no backend means fallback, always. A backend with at
/// least one successful source attempts AI synthesis and falls back silently
/// on failure. A backend with zero sources goes straight to fallback rather
/// than calling the model with no grounding data.
#[derive(Clone)]
pub struct ResponseComposer {
    llm: Option<Arc<dyn LlmProvider>>,
    synthesis_timeout: Duration,
}

impl ResponseComposer {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, synthesis_timeout: Duration) -> Self {
        Self {
            llm,
            synthesis_timeout,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn compose(
        &self,
        request_id: RequestId,
        query: &str,
        context: &Value,
        acquired: &AcquiredData,
    ) -> Composed {
        let llm = match &self.llm {
            Some(llm) => llm,
            None => {
                return Composed {
                    result: self.fallback(request_id, query, acquired),
                    synthesis_error: None,
                };
            }
        };

        if acquired.is_empty() {
            return Composed {
                result: self.fallback(request_id, query, acquired),
                synthesis_error: None,
            };
        }

        let messages = build_messages(query, context, acquired);
        match tokio::time::timeout(self.synthesis_timeout, llm.complete(messages)).await {
            Ok(Ok(text)) => Composed {
                result: self.ai_result(request_id, text, acquired),
                synthesis_error: None,
            },
            Ok(Err(err)) => {
                log::warn!("AI synthesis failed, using fallback: {}", err);
                Composed {
                    result: self.fallback(request_id, query, acquired),
                    synthesis_error: Some(format!("AI synthesis failed: {}", err)),
                }
            }
            Err(_) => {
                log::warn!(
                    "AI synthesis timed out after {:?}, using fallback",
                    self.synthesis_timeout
                );
                Composed {
                    result: self.fallback(request_id, query, acquired),
                    synthesis_error: Some(format!(
                        "AI synthesis timed out after {:?}",
                        self.synthesis_timeout
                    )),
                }
            }
        }
    }

    /// Deterministic classifier-plus-template path.
    pub fn fallback(
        &self,
        request_id: RequestId,
        query: &str,
        acquired: &AcquiredData,
    ) -> AnalysisResult {
        let category = fallback::classify(query);
        let digest = data_digest(acquired);
        let response = fallback::render(category, query, digest.as_deref());

        AnalysisResult {
            response,
            metadata: AnalysisMetadata {
                generated_by: GeneratedBy::Fallback,
                source_count: acquired.source_count(),
                data_driven: !acquired.is_empty(),
                request_id,
                analyzed_at: Utc::now(),
            },
            sources: acquired.sources.clone(),
        }
    }

    fn ai_result(
        &self,
        request_id: RequestId,
        response: String,
        acquired: &AcquiredData,
    ) -> AnalysisResult {
        let mut sources = acquired.sources.clone();
        sources.push(AI_SOURCE_MARKER.to_string());

        AnalysisResult {
            response,
            metadata: AnalysisMetadata {
                generated_by: GeneratedBy::Ai,
                source_count: acquired.source_count(),
                data_driven: !acquired.is_empty(),
                request_id,
                analyzed_at: Utc::now(),
            },
            sources,
        }
    }
}

fn build_messages(query: &str, context: &Value, acquired: &AcquiredData) -> Vec<Message> {
    let digest = data_digest(acquired).unwrap_or_else(|| "- no live data".to_string());

    let mut prompt = format!(
        "Analyze the following cricket tactics query using the available data.\n\
         \n\
         Query: {}\n\
         \n\
         Data sources: {}\n\
         {}\n",
        query,
        acquired.sources.join(", "),
        digest
    );

    if let Some(map) = context.as_object() {
        if !map.is_empty() {
            prompt.push_str(&format!("\nAdditional context: {}\n", context));
        }
    }

    prompt.push_str(
        "\nProvide tactical recommendations covering field placements, bowling \
         strategies, batting approaches, and the match situation.",
    );

    vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)]
}

/// Compact per-source summary of the acquired payloads, used both in the AI
/// prompt and in fallback templates.
fn data_digest(acquired: &AcquiredData) -> Option<String> {
    if acquired.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    for source in &acquired.sources {
        let payload = match acquired.data.get(source) {
            Some(payload) => payload,
            None => continue,
        };

        if let Some(matches) = payload.get("matches").and_then(|m| m.as_array()) {
            lines.push(format!("- {}: {} current matches", source, matches.len()));
            for entry in matches.iter().take(3) {
                let name = entry.get("name").and_then(|n| n.as_str()).unwrap_or("match");
                let status = entry
                    .get("status")
                    .and_then(|s| s.as_str())
                    .unwrap_or("status unknown");
                lines.push(format!("  - {}: {}", name, status));
            }
        } else if let Some(headlines) = payload.get("headlines").and_then(|h| h.as_array()) {
            lines.push(format!("- {}: {} recent headlines", source, headlines.len()));
            for entry in headlines.iter().take(3) {
                if let Some(headline) = entry.get("headline").and_then(|h| h.as_str()) {
                    lines.push(format!("  - {}", headline));
                }
            }
        } else {
            lines.push(format!("- {}: data available", source));
        }
    }

    Some(lines.join("\n"))
}
