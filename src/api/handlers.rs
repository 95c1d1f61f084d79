use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::agent::TacticsAgent;
use crate::api::error::ApiError;
use crate::types::{AgentStatusInfo, AnalysisResult};

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub response: String,
    pub generated_by: String,
    pub sources: Vec<String>,
    pub source_count: usize,
    pub data_driven: bool,
    pub request_id: String,
    pub analyzed_at: DateTime<Utc>,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            response: result.response,
            generated_by: result.metadata.generated_by.as_str().to_string(),
            sources: result.sources,
            source_count: result.metadata.source_count,
            data_driven: result.metadata.data_driven,
            request_id: result.metadata.request_id.to_string(),
            analyzed_at: result.metadata.analyzed_at,
        }
    }
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_status(State(agent): State<Arc<TacticsAgent>>) -> Json<AgentStatusInfo> {
    Json(agent.status_snapshot())
}

pub async fn analyze(
    State(agent): State<Arc<TacticsAgent>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let result = agent.analyze(&request.query, request.context).await?;
    Ok(Json(AnalyzeResponse::from(result)))
}
