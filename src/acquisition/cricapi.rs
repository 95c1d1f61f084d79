use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::DataSource;

const BASE_URL: &str = "https://api.cricapi.com/v1";

/// CricAPI client. Pulls the current-matches feed used to ground analysis in
/// live match state.
#[derive(Debug, Clone)]
pub struct CricApiSource {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CricApiSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DataSource for CricApiSource {
    fn name(&self) -> &str {
        "cricapi"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, _query: &str, _context: &Value) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("CricAPI key not configured"))?;

        let response = self
            .client
            .get(format!("{}/matches", BASE_URL))
            .query(&[("apikey", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("CricAPI error {}: {}", status, body);
        }

        let body: Value = response.json().await?;
        let matches = body.get("data").cloned().unwrap_or_else(|| json!([]));

        Ok(json!({
            "matches": matches,
            "source": "cricapi",
            "fetched_at": Utc::now().to_rfc3339(),
        }))
    }
}
