pub mod drain;
pub mod state;

pub use state::{AgentState, AgentStateMachine};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::acquisition::{AcquiredData, CricApiSource, DataSource, EspnCricketSource, SourceFanout};
use crate::config::{AgentConfig, Config, LlmSettings};
use crate::error::AgentError;
use crate::providers::{self, LlmProvider};
use crate::synthesis::ResponseComposer;
use crate::types::{AgentStatusInfo, AnalysisResult, RequestId};

const AGENT_NAME: &str = "tactics-master";
const MAX_QUERY_LENGTH: usize = 2000;

/// Hybrid tactics analysis agent.
///
/// Owns the lifecycle state machine, admits requests under the concurrency
/// cap, fans out to the configured data sources, and routes the response
/// through AI synthesis or the deterministic fallback.
pub struct TacticsAgent {
    config: AgentConfig,
    llm_settings: Option<LlmSettings>,
    fanout: SourceFanout,
    composer: ResponseComposer,
    state: AgentStateMachine,
}

impl TacticsAgent {
    /// Composition-root constructor: real source clients and the AI backend
    /// selected by the environment configuration.
    pub fn from_config(config: &Config) -> Self {
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(CricApiSource::new(config.cricapi_key.clone())),
            Arc::new(EspnCricketSource::new(config.espn_api_key.clone())),
        ];
        Self::new(config.agent(), sources, config.llm_settings())
    }

    pub fn new(
        config: AgentConfig,
        sources: Vec<Arc<dyn DataSource>>,
        llm_settings: Option<LlmSettings>,
    ) -> Self {
        let fanout = SourceFanout::new(sources, config.source_timeout);
        let composer = ResponseComposer::new(None, config.synthesis_timeout);
        Self {
            config,
            llm_settings,
            fanout,
            composer,
            state: AgentStateMachine::new(),
        }
    }

    /// Injection seam for tests and callers that build their own provider.
    pub fn with_provider(
        config: AgentConfig,
        sources: Vec<Arc<dyn DataSource>>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let fanout = SourceFanout::new(sources, config.source_timeout);
        let composer = ResponseComposer::new(llm, config.synthesis_timeout);
        Self {
            config,
            llm_settings: None,
            fanout,
            composer,
            state: AgentStateMachine::new(),
        }
    }

    /// Set up providers and transition to Ready.
    ///
    /// Only invalid configuration is fatal. A missing AI backend or an empty
    /// source list degrades to fallback-only operation.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        if !self.composer.ai_enabled() {
            match &self.llm_settings {
                Some(settings) => {
                    if let Err(err) = settings.validate() {
                        self.state.mark_init_failed(&err.to_string());
                        return Err(err);
                    }
                    let provider = providers::from_settings(settings);
                    log::info!(
                        "AI backend ready: {} ({})",
                        settings.backend.as_str(),
                        settings.model
                    );
                    self.composer =
                        ResponseComposer::new(Some(provider), self.config.synthesis_timeout);
                }
                None => {
                    log::warn!("no AI backend configured, running in fallback-only mode");
                }
            }
        }

        let configured = self.fanout.configured_names();
        if configured.is_empty() {
            log::warn!("no data sources configured, responses will use historical trends only");
        } else {
            log::info!("data sources available: {}", configured.join(", "));
        }

        self.state.mark_ready();
        log::info!("{} agent initialized", AGENT_NAME);
        Ok(())
    }

    /// Analyze one query. Validation happens before admission, admission is
    /// atomic against the concurrency cap, and every admitted request
    /// releases its slot on the way out.
    pub async fn analyze(
        &self,
        query: &str,
        context: Option<Value>,
    ) -> Result<AnalysisResult, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::validation("query must not be empty"));
        }
        if query.len() > MAX_QUERY_LENGTH {
            return Err(AgentError::validation(format!(
                "query exceeds {} characters",
                MAX_QUERY_LENGTH
            )));
        }

        self.state.try_admit(self.config.max_concurrent_requests)?;

        let context = context.unwrap_or_else(|| Value::Object(Default::default()));
        let result = self.run_admitted(query, &context).await;
        self.state.release();

        Ok(result)
    }

    /// Body of an admitted request. Bounded by the request deadline; any
    /// internal failure degrades to a best-effort fallback result rather
    /// than surfacing an error.
    async fn run_admitted(&self, query: &str, context: &Value) -> AnalysisResult {
        let request_id = Uuid::new_v4();

        match tokio::time::timeout(
            self.config.request_timeout,
            self.acquire_and_compose(request_id, query, context),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let reason = format!(
                    "request exceeded the {:?} deadline",
                    self.config.request_timeout
                );
                log::warn!("request {}: {}", request_id, reason);
                self.state.record_failure(&reason);
                self.composer
                    .fallback(request_id, query, &AcquiredData::default())
            }
        }
    }

    async fn acquire_and_compose(
        &self,
        request_id: RequestId,
        query: &str,
        context: &Value,
    ) -> AnalysisResult {
        let acquired = self.fanout.acquire(query, context).await;
        log::info!(
            "request {}: acquired data from {} of {} configured sources",
            request_id,
            acquired.source_count(),
            self.fanout.configured_names().len()
        );

        let composed = self.composer.compose(request_id, query, context, &acquired).await;
        if let Some(reason) = composed.synthesis_error {
            self.state.record_failure(&reason);
        }
        composed.result
    }

    /// Immutable copy of the lifecycle state. Never blocks beyond the state
    /// lock and never mutates.
    pub fn status_snapshot(&self) -> AgentStatusInfo {
        let state = self.state.snapshot();
        let uptime_seconds = state
            .initialized_at
            .map(|t| (chrono::Utc::now() - t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        AgentStatusInfo {
            name: AGENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: state.status,
            active_requests: state.active_requests,
            max_concurrent_requests: self.config.max_concurrent_requests,
            error_count: state.error_count,
            uptime_seconds,
            last_activity: state.last_activity,
            last_error: state.last_error,
        }
    }

    /// Graceful drain: refuse new admissions, wait up to `timeout` for
    /// in-flight requests. Idempotent.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), AgentError> {
        drain::drain(&self.state, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::MockDataSource;
    use crate::config::LlmBackend;
    use crate::providers::MockLlmProvider;
    use crate::types::{AgentStatus, GeneratedBy};

    fn test_config() -> AgentConfig {
        AgentConfig {
            max_concurrent_requests: 4,
            source_timeout: Duration::from_millis(200),
            synthesis_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_secs(5),
        }
    }

    async fn ready_agent(sources: Vec<Arc<dyn DataSource>>) -> TacticsAgent {
        let mut agent = TacticsAgent::with_provider(test_config(), sources, None);
        agent.initialize().await.unwrap();
        agent
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_admission() {
        let agent = ready_agent(vec![]).await;

        let result = agent.analyze("", None).await;
        assert!(matches!(result, Err(AgentError::Validation { .. })));

        let result = agent.analyze("   ", None).await;
        assert!(matches!(result, Err(AgentError::Validation { .. })));

        assert_eq!(agent.status_snapshot().active_requests, 0);
        assert_eq!(agent.status_snapshot().status, AgentStatus::Ready);
    }

    #[tokio::test]
    async fn test_oversized_query_rejected() {
        let agent = ready_agent(vec![]).await;
        let long_query = "a".repeat(MAX_QUERY_LENGTH + 1);

        let result = agent.analyze(&long_query, None).await;
        assert!(matches!(result, Err(AgentError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_analyze_before_initialize_rejected() {
        let agent = TacticsAgent::with_provider(test_config(), vec![], None);

        let result = agent.analyze("bowling plan", None).await;
        assert!(matches!(result, Err(AgentError::NotReady { .. })));
    }

    #[tokio::test]
    async fn test_fallback_only_agent_answers() {
        let agent = ready_agent(vec![]).await;

        let result = agent.analyze("bowling plan for the death overs", None).await.unwrap();

        assert_eq!(result.metadata.generated_by, GeneratedBy::Fallback);
        assert!(!result.metadata.data_driven);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_is_isolated() {
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(MockDataSource::new("a").failing()),
            Arc::new(MockDataSource::new("b")),
        ];
        let agent = ready_agent(sources).await;

        let result = agent.analyze("batting order", None).await.unwrap();

        assert_eq!(result.sources, vec!["b".to_string()]);
        assert!(result.metadata.data_driven);
    }

    #[tokio::test]
    async fn test_ai_path_marks_sources() {
        let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(MockDataSource::new("cricapi"))];
        let mut agent = TacticsAgent::with_provider(
            test_config(),
            sources,
            Some(Arc::new(MockLlmProvider::with_response("Use the short ball."))),
        );
        agent.initialize().await.unwrap();

        let result = agent.analyze("bowling to their opener", None).await.unwrap();

        assert_eq!(result.metadata.generated_by, GeneratedBy::Ai);
        assert_eq!(
            result.sources,
            vec!["cricapi".to_string(), "AI".to_string()]
        );
    }

    #[tokio::test]
    async fn test_ai_failure_degrades_and_counts() {
        let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(MockDataSource::new("cricapi"))];
        let mut agent = TacticsAgent::with_provider(
            test_config(),
            sources,
            Some(Arc::new(MockLlmProvider::failing())),
        );
        agent.initialize().await.unwrap();

        let result = agent.analyze("bowling to their opener", None).await.unwrap();

        assert_eq!(result.metadata.generated_by, GeneratedBy::Fallback);
        let info = agent.status_snapshot();
        assert_eq!(info.error_count, 1);
        assert_eq!(info.status, AgentStatus::Ready);
    }

    #[tokio::test]
    async fn test_invalid_model_id_is_fatal() {
        let mut agent = TacticsAgent::new(
            test_config(),
            vec![],
            Some(LlmSettings {
                backend: LlmBackend::OpenAi,
                api_key: "test-key".to_string(),
                model: "".to_string(),
            }),
        );

        let result = agent.initialize().await;

        assert!(matches!(result, Err(AgentError::Initialization { .. })));
        assert_eq!(agent.status_snapshot().status, AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_snapshot_reports_uptime_after_init() {
        let agent = ready_agent(vec![]).await;
        let info = agent.status_snapshot();

        assert_eq!(info.name, AGENT_NAME);
        assert!(info.uptime_seconds >= 0.0);
        assert_eq!(info.max_concurrent_requests, 4);
    }
}
