use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::error::AgentError;
use crate::types::AgentStatus;

/// Lifecycle state for one agent instance. Every field is written by
/// concurrent requests and read by status snapshots and the drain loop, so
/// all access goes through the single mutex in [`AgentStateMachine`].
#[derive(Debug, Clone)]
pub struct AgentState {
    pub status: AgentStatus,
    pub active_requests: usize,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub initialized_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl AgentState {
    fn new() -> Self {
        Self {
            status: AgentStatus::Initializing,
            active_requests: 0,
            error_count: 0,
            last_error: None,
            initialized_at: None,
            last_activity: None,
        }
    }
}

/// Owns the agent lifecycle state and performs every transition under one
/// lock. The admission check and the counter increment happen in the same
/// critical section, so a request can never be admitted past capacity.
pub struct AgentStateMachine {
    inner: Mutex<AgentState>,
}

impl AgentStateMachine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AgentState::new()),
        }
    }

    pub fn mark_ready(&self) {
        let mut state = self.inner.lock().unwrap();
        state.status = AgentStatus::Ready;
        state.initialized_at = Some(Utc::now());
    }

    /// Initialization failure is the one fatal transition.
    pub fn mark_init_failed(&self, reason: &str) {
        let mut state = self.inner.lock().unwrap();
        state.status = AgentStatus::Error;
        state.error_count += 1;
        state.last_error = Some(reason.to_string());
    }

    /// Admit one request, or explain why not. Check-and-increment is atomic.
    pub fn try_admit(&self, max_concurrent: usize) -> Result<(), AgentError> {
        let mut state = self.inner.lock().unwrap();
        match state.status {
            AgentStatus::Shutdown => Err(AgentError::ShuttingDown),
            AgentStatus::Initializing | AgentStatus::Error => Err(AgentError::NotReady {
                status: state.status.as_str().to_string(),
            }),
            AgentStatus::Ready | AgentStatus::Busy => {
                if state.active_requests >= max_concurrent {
                    return Err(AgentError::CapacityExceeded {
                        active: state.active_requests,
                        max: max_concurrent,
                    });
                }
                state.active_requests += 1;
                state.status = AgentStatus::Busy;
                state.last_activity = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Release an admitted request's slot. When the count reaches zero the
    /// status reverts to Ready, unless shutdown has started.
    pub fn release(&self) {
        let mut state = self.inner.lock().unwrap();
        state.active_requests = state.active_requests.saturating_sub(1);
        if state.active_requests == 0 && state.status == AgentStatus::Busy {
            state.status = AgentStatus::Ready;
        }
    }

    /// Per-request failures count errors but never change the status.
    pub fn record_failure(&self, reason: &str) {
        let mut state = self.inner.lock().unwrap();
        state.error_count += 1;
        state.last_error = Some(reason.to_string());
    }

    /// Flip to Shutdown. Returns false when shutdown had already started.
    pub fn begin_shutdown(&self) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.status == AgentStatus::Shutdown {
            return false;
        }
        state.status = AgentStatus::Shutdown;
        true
    }

    pub fn active_requests(&self) -> usize {
        self.inner.lock().unwrap().active_requests
    }

    pub fn status(&self) -> AgentStatus {
        self.inner.lock().unwrap().status
    }

    pub fn snapshot(&self) -> AgentState {
        self.inner.lock().unwrap().clone()
    }
}

impl Default for AgentStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
