use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::agent::state::AgentStateMachine;
use crate::error::AgentError;

pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stop admitting new work and wait for in-flight requests to finish,
/// bounded by `timeout`.
///
/// The status flips to Shutdown before the first poll, so admission is
/// refused for the whole drain window. When the timeout elapses with work
/// still active, control returns to the caller with a `ShutdownTimeout`
/// warning and the stragglers finish in the background.
pub async fn drain(state: &AgentStateMachine, timeout: Duration) -> Result<(), AgentError> {
    if !state.begin_shutdown() {
        // Already shut down; repeat calls are a no-op.
        return Ok(());
    }

    log::info!(
        "shutdown started with {} active requests, draining for up to {:?}",
        state.active_requests(),
        timeout
    );

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = state.active_requests();
        if remaining == 0 {
            log::info!("drain complete");
            return Ok(());
        }
        if Instant::now() >= deadline {
            log::warn!("drain timed out with {} requests still active", remaining);
            return Err(AgentError::ShutdownTimeout { remaining });
        }
        sleep(DRAIN_POLL_INTERVAL).await;
    }
}
