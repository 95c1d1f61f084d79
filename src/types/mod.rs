use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RequestId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Initializing, // Construction done, providers not yet set up
    Ready,        // Accepting requests
    Busy,         // At least one request in flight
    Error,        // Initialization failed, terminal
    Shutdown,     // Draining or drained, no new admissions
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Initializing => "initializing",
            AgentStatus::Ready => "ready",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
            AgentStatus::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratedBy {
    Ai,
    Fallback,
}

impl GeneratedBy {
    pub fn as_str(&self) -> &str {
        match self {
            GeneratedBy::Ai => "AI",
            GeneratedBy::Fallback => "Fallback",
        }
    }
}

/// Provenance attached to every analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub generated_by: GeneratedBy,
    pub source_count: usize,
    pub data_driven: bool,
    pub request_id: RequestId,
    pub analyzed_at: DateTime<Utc>,
}

/// Final output of one analysis request. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub response: String,
    pub metadata: AnalysisMetadata,
    pub sources: Vec<String>,
}

/// Point-in-time copy of the agent's lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusInfo {
    pub name: String,
    pub version: String,
    pub status: AgentStatus,
    pub active_requests: usize,
    pub max_concurrent_requests: usize,
    pub error_count: u64,
    pub uptime_seconds: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
