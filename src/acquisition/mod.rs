pub mod cricapi;
pub mod espn;

pub use cricapi::CricApiSource;
pub use espn::EspnCricketSource;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One external cricket-data provider. Implementations must be safe to call
/// from many in-flight requests at once.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the source has the credentials it needs. Unconfigured sources
    /// are skipped by the fan-out, not treated as failures.
    fn is_configured(&self) -> bool;

    async fn fetch(&self, query: &str, context: &Value) -> Result<Value>;
}

/// Outcome of one fan-out call, success or isolated failure.
#[derive(Debug, Clone)]
pub struct AcquisitionResult {
    pub source: String,
    pub payload: Option<Value>,
    pub error: Option<String>,
}

impl AcquisitionResult {
    fn success(source: String, payload: Value) -> Self {
        Self {
            source,
            payload: Some(payload),
            error: None,
        }
    }

    fn failure(source: String, error: String) -> Self {
        Self {
            source,
            payload: None,
            error: Some(error),
        }
    }
}

/// Aggregate of the successful fan-out calls. Empty is a valid outcome.
#[derive(Debug, Clone, Default)]
pub struct AcquiredData {
    pub sources: Vec<String>,
    pub data: HashMap<String, Value>,
}

impl AcquiredData {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// Dispatches one fetch per configured source concurrently and aggregates
/// whichever succeed. A timeout or error on one source never aborts the
/// sibling calls.
pub struct SourceFanout {
    sources: Vec<Arc<dyn DataSource>>,
    per_call_timeout: Duration,
}

impl SourceFanout {
    pub fn new(sources: Vec<Arc<dyn DataSource>>, per_call_timeout: Duration) -> Self {
        Self {
            sources,
            per_call_timeout,
        }
    }

    pub fn configured_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.is_configured())
            .map(|s| s.name().to_string())
            .collect()
    }

    pub async fn acquire(&self, query: &str, context: &Value) -> AcquiredData {
        let calls = self
            .sources
            .iter()
            .filter(|s| s.is_configured())
            .map(|source| self.fetch_one(source.clone(), query, context));

        let results = join_all(calls).await;

        let mut acquired = AcquiredData::default();
        for result in results {
            match result.payload {
                Some(payload) => {
                    acquired.sources.push(result.source.clone());
                    acquired.data.insert(result.source, payload);
                }
                None => {
                    log::warn!(
                        "data source {} failed: {}",
                        result.source,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        acquired
    }

    async fn fetch_one(
        &self,
        source: Arc<dyn DataSource>,
        query: &str,
        context: &Value,
    ) -> AcquisitionResult {
        let name = source.name().to_string();
        match tokio::time::timeout(self.per_call_timeout, source.fetch(query, context)).await {
            Ok(Ok(payload)) => AcquisitionResult::success(name, payload),
            Ok(Err(err)) => AcquisitionResult::failure(name, err.to_string()),
            Err(_) => AcquisitionResult::failure(
                name,
                format!("timed out after {:?}", self.per_call_timeout),
            ),
        }
    }
}

// Mock source for testing
pub struct MockDataSource {
    name: String,
    payload: Value,
    fail: bool,
    configured: bool,
    delay: Option<Duration>,
}

impl MockDataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: serde_json::json!({"matches": []}),
            fail: false,
            configured: true,
            delay: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch(&self, _query: &str, _context: &Value) -> Result<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("mock source failure");
        }
        Ok(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fanout(sources: Vec<Arc<dyn DataSource>>) -> SourceFanout {
        SourceFanout::new(sources, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_failing_source_does_not_block_siblings() {
        let fanout = fanout(vec![
            Arc::new(MockDataSource::new("a").failing()),
            Arc::new(MockDataSource::new("b").with_payload(json!({"matches": [1]}))),
        ]);

        let acquired = fanout.acquire("test query", &json!({})).await;

        assert_eq!(acquired.sources, vec!["b".to_string()]);
        assert!(acquired.data.contains_key("b"));
        assert!(!acquired.data.contains_key("a"));
    }

    #[tokio::test]
    async fn test_unconfigured_source_is_skipped() {
        let fanout = fanout(vec![
            Arc::new(MockDataSource::new("a").unconfigured()),
            Arc::new(MockDataSource::new("b")),
        ]);

        assert_eq!(fanout.configured_names(), vec!["b".to_string()]);

        let acquired = fanout.acquire("test query", &json!({})).await;
        assert_eq!(acquired.sources, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_in_isolation() {
        let fanout = fanout(vec![
            Arc::new(MockDataSource::new("slow").with_delay(Duration::from_secs(5))),
            Arc::new(MockDataSource::new("fast")),
        ]);

        let acquired = fanout.acquire("test query", &json!({})).await;

        assert_eq!(acquired.sources, vec!["fast".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_result_is_valid() {
        let fanout = fanout(vec![]);
        let acquired = fanout.acquire("test query", &json!({})).await;

        assert!(acquired.is_empty());
        assert_eq!(acquired.source_count(), 0);
    }

    #[tokio::test]
    async fn test_order_follows_configuration() {
        let fanout = fanout(vec![
            Arc::new(MockDataSource::new("first").with_delay(Duration::from_millis(50))),
            Arc::new(MockDataSource::new("second")),
        ]);

        let acquired = fanout.acquire("test query", &json!({})).await;

        assert_eq!(
            acquired.sources,
            vec!["first".to_string(), "second".to_string()]
        );
    }
}
