use thiserror::Error;

/// Failure kinds surfaced by the agent.
///
/// Callers branch on the variant, not the message text. `retryable` separates
/// transient rejections from terminal ones.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("agent initialization failed: {reason}")]
    Initialization { reason: String },

    #[error("invalid query: {reason}")]
    Validation { reason: String },

    #[error("agent at capacity: {active} of {max} request slots in use")]
    CapacityExceeded { active: usize, max: usize },

    #[error("agent is not ready to accept requests (status: {status})")]
    NotReady { status: String },

    #[error("agent is shutting down")]
    ShuttingDown,

    #[error("shutdown timed out with {remaining} requests still active")]
    ShutdownTimeout { remaining: usize },
}

impl AgentError {
    /// Whether the same request may be retried against this agent instance.
    pub fn retryable(&self) -> bool {
        matches!(self, AgentError::CapacityExceeded { .. })
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        AgentError::Validation {
            reason: reason.into(),
        }
    }

    pub fn initialization(reason: impl Into<String>) -> Self {
        AgentError::Initialization {
            reason: reason.into(),
        }
    }
}
