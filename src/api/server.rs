use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::agent::TacticsAgent;
use crate::api::handlers;

const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<TacticsAgent>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        .route("/analyze", post(handlers::analyze))
        .layer(CorsLayer::permissive())
        .with_state(state.agent)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let agent = state.agent.clone();
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    println!("Tactics agent API listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = agent.shutdown(SERVER_DRAIN_TIMEOUT).await {
        log::warn!("drain finished with warning: {}", err);
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("shutdown signal received, draining");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::acquisition::{DataSource, MockDataSource};
    use crate::config::AgentConfig;

    async fn create_test_app() -> (Router, Arc<TacticsAgent>) {
        let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(MockDataSource::new("cricapi"))];
        let mut agent = TacticsAgent::with_provider(AgentConfig::default(), sources, None);
        agent.initialize().await.unwrap();
        let agent = Arc::new(agent);
        let state = AppState {
            agent: agent.clone(),
        };
        (create_router(state), agent)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_get_status() {
        let (app, _) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "Ready");
        assert_eq!(json["active_requests"], 0);
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let (app, _) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "bowling plan for the powerplay"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["generated_by"], "Fallback");
        assert_eq!(json["sources"][0], "cricapi");
        assert_eq!(json["data_driven"], true);
    }

    #[tokio::test]
    async fn test_analyze_empty_query_is_bad_request() {
        let (app, _) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["retryable"], false);
    }

    #[tokio::test]
    async fn test_analyze_after_shutdown_is_unavailable() {
        let (app, agent) = create_test_app().await;
        agent.shutdown(Duration::from_secs(1)).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "bowling plan"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
