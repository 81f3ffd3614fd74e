// src/server.rs

//! Minimal HTTP status surface.
//!
//! - `GET /`     human-readable summary
//! - `GET /ping` liveness probe
//! - `GET /tick` run one cycle now and return the resulting status

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Local, Utc};
use serde_json::{Value, json};

use crate::error::Result;
use crate::models::CycleStatus;
use crate::pipeline::CycleRunner;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CycleRunner>,
}

/// Build the status router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/tick", get(tick))
        .with_state(state)
}

/// Serve the status surface until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Status surface listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

pub async fn index(State(state): State<AppState>) -> String {
    render_summary(&state.runner.status().snapshot().await)
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn tick(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    log::info!("On-demand cycle requested");
    match state.runner.run_isolated().await {
        Ok(report) => {
            let snapshot = state.runner.status().snapshot().await;
            (
                StatusCode::OK,
                Json(json!({ "status": "success", "snapshot": snapshot, "report": report })),
            )
        }
        Err(e) => {
            log::error!("On-demand cycle failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}

/// Render the multi-line summary served on `/`.
pub fn render_summary(status: &CycleStatus) -> String {
    let mut lines = Vec::new();
    match status.last_cycle_at {
        None => lines.push("🟢 pagewatch online. Initializing...".to_string()),
        Some(at) => {
            lines.push(format!("🟢 pagewatch online. Last check: {}", local_time(at)));
            for (target, info) in &status.targets {
                lines.push(format!(
                    "- {} → PDFs: {} | last change: {}",
                    target,
                    info.document_count,
                    info.last_change_at.map_or_else(|| "-".to_string(), local_time)
                ));
            }
        }
    }

    if let Some(error) = &status.last_error {
        lines.push(String::new());
        lines.push("Last error:".to_string());
        lines.push(error.clone());
    }
    lines.join("\n")
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Config, TargetStatus};
    use crate::services::{LogNotifier, PageFetcher};
    use crate::status::StatusReporter;
    use crate::storage::{LocalStorage, StateStore};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            if url.contains("down") {
                return Err(AppError::fetch(url, "connection refused"));
            }
            Ok(r#"<html><body><a href="/a.pdf">a</a><a href="/b.pdf">b</a></body></html>"#.into())
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl PageFetcher for PanickingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            panic!("fetcher bug");
        }
    }

    async fn state(fetcher: Arc<dyn PageFetcher>, tmp: &TempDir) -> AppState {
        let mut config = Config::default();
        config.monitor.targets = vec![
            "https://up.test/page".to_string(),
            "https://down.test/page".to_string(),
        ];
        let storage = Arc::new(LocalStorage::new(tmp.path().join("state.json")));
        let runner = CycleRunner::new(
            &config,
            fetcher,
            Arc::new(LogNotifier),
            Arc::new(StateStore::open(storage).await),
            Arc::new(StatusReporter::new()),
        );
        AppState {
            runner: Arc::new(runner),
        }
    }

    #[test]
    fn test_summary_while_initializing() {
        let status = CycleStatus::default();
        assert_eq!(render_summary(&status), "🟢 pagewatch online. Initializing...");
    }

    #[test]
    fn test_summary_lists_targets_and_error() {
        let now = Utc::now();
        let mut status = CycleStatus {
            last_cycle_at: Some(now),
            last_error: Some("Fetch failed for https://b.test: timeout".to_string()),
            ..CycleStatus::default()
        };
        status.targets.insert(
            "https://a.test".to_string(),
            TargetStatus {
                document_count: 4,
                last_observed_at: now,
                last_change_at: None,
            },
        );

        let summary = render_summary(&status);
        let lines: Vec<&str> = summary.lines().collect();

        assert!(lines[0].starts_with("🟢 pagewatch online. Last check: "));
        assert_eq!(lines[1], "- https://a.test → PDFs: 4 | last change: -");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Last error:");
        assert_eq!(lines[4], "Fetch failed for https://b.test: timeout");
    }

    #[tokio::test]
    async fn test_ping() {
        assert_eq!(ping().await, "pong");
    }

    #[tokio::test]
    async fn test_tick_runs_cycle_and_returns_snapshot() {
        let tmp = TempDir::new().unwrap();
        let state = state(Arc::new(StaticFetcher), &tmp).await;

        let (code, Json(body)) = tick(State(state.clone())).await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["snapshot"]["targets"]["https://up.test/page"]["document_count"],
            2
        );
        assert!(
            body["snapshot"]["last_error"]
                .as_str()
                .unwrap()
                .contains("down.test")
        );
        assert_eq!(body["report"]["targets"][1]["outcome"], "failed");

        let summary = index(State(state)).await;
        assert!(summary.contains("- https://up.test/page → PDFs: 2 | last change: "));
    }

    #[tokio::test]
    async fn test_tick_failure_is_server_error() {
        let tmp = TempDir::new().unwrap();
        let state = state(Arc::new(PanickingFetcher), &tmp).await;

        let (code, Json(body)) = tick(State(state)).await;

        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().starts_with("Cycle aborted"));
    }

    #[tokio::test]
    async fn test_router_builds() {
        let tmp = TempDir::new().unwrap();
        let _router = router(state(Arc::new(StaticFetcher), &tmp).await);
    }
}
