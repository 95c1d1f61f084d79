use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::DataSource;

const BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/cricket";

/// ESPN cricket client. Pulls the news feed for recent match coverage.
#[derive(Debug, Clone)]
pub struct EspnCricketSource {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EspnCricketSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DataSource for EspnCricketSource {
    fn name(&self) -> &str {
        "espn"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, _query: &str, _context: &Value) -> Result<Value> {
        if self.api_key.is_none() {
            anyhow::bail!("ESPN cricket API key not configured");
        }

        let response = self
            .client
            .get(format!("{}/news", BASE_URL))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("ESPN API error {}: {}", status, body);
        }

        let body: Value = response.json().await?;
        let headlines = body.get("articles").cloned().unwrap_or_else(|| json!([]));

        Ok(json!({
            "headlines": headlines,
            "source": "espn",
            "fetched_at": Utc::now().to_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_without_key() {
        let source = EspnCricketSource::new(None);
        assert!(!source.is_configured());
        assert_eq!(source.name(), "espn");
    }

    #[test]
    fn test_configured_with_key() {
        let source = EspnCricketSource::new(Some("test-key".to_string()));
        assert!(source.is_configured());
    }
}
