//! HTTP client for the external screening pipeline API
//!
//! The pipeline owns run execution and run-file persistence; this service
//! only triggers runs and reads results back. Uses a long-lived
//! reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, ScreenerError};
use crate::models::{PageQuery, RunId, RunPage, RunStarted, RunSummary, Transaction};

/// The upstream caps page sizes at 1000 rows; clamp before asking.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Fallback when a failure body is absent or unparsable.
const GENERIC_FAILURE: &str = "Pipeline API request failed";

/// Read/write surface of the pipeline service.
///
/// Seam between the presenter and the transport so tests can substitute a
/// scripted implementation.
#[async_trait]
pub trait ScreeningApi: Send + Sync {
    /// POST /api/run-pipeline — trigger a new screening run
    async fn trigger_run(&self) -> Result<RunStarted>;

    /// GET /api/runs — run-file identifiers, newest first
    async fn list_runs(&self) -> Result<Vec<RunId>>;

    /// GET /api/run/{id}/summary
    async fn run_summary(&self, run: &RunId) -> Result<RunSummary>;

    /// GET /api/run/{id}?limit&offset&flagged_only
    async fn run_page(&self, run: &RunId, query: PageQuery) -> Result<RunPage>;

    /// GET /api/run/{id}/transaction/{txn}
    async fn transaction(&self, run: &RunId, txn_id: i64) -> Result<Transaction>;
}

/// Reusable pipeline client (connection-pooled)
pub struct PipelineClient {
    client: Client,
    base_url: String,
}

impl PipelineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        decode_response(response).await
    }
}

#[async_trait]
impl ScreeningApi for PipelineClient {
    async fn trigger_run(&self) -> Result<RunStarted> {
        info!("Triggering screening pipeline run");

        let url = format!("{}/api/run-pipeline", self.base_url);
        let response = self.client.post(&url).send().await?;
        decode_response(response).await
    }

    async fn list_runs(&self) -> Result<Vec<RunId>> {
        let files: Vec<String> = self.get_json("/api/runs").await?;
        Ok(files.iter().map(|name| RunId::from_file_name(name)).collect())
    }

    async fn run_summary(&self, run: &RunId) -> Result<RunSummary> {
        self.get_json(&format!("/api/run/{}/summary", run)).await
    }

    async fn run_page(&self, run: &RunId, query: PageQuery) -> Result<RunPage> {
        let limit = query.limit.min(MAX_PAGE_LIMIT);
        self.get_json(&format!(
            "/api/run/{}?limit={}&offset={}&flagged_only={}",
            run, limit, query.offset, query.flagged_only
        ))
        .await
    }

    async fn transaction(&self, run: &RunId, txn_id: i64) -> Result<Transaction> {
        self.get_json(&format!("/api/run/{}/transaction/{}", run, txn_id))
            .await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    parse_payload(status, &body)
}

/// Decode an upstream payload into `T`.
///
/// Non-2xx statuses are typed failures carrying the server-supplied
/// `{"error": ...}` message when the body parses, else a generic
/// description. The upstream also reports some failures as 2xx bodies
/// shaped `{"error": ...}`; those map to the same failure.
fn parse_payload<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    let value: Option<serde_json::Value> = serde_json::from_slice(body).ok();

    if let Some(message) = value
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|v| v.as_str())
    {
        return Err(ScreenerError::Pipeline {
            status: status.as_u16(),
            message: message.to_string(),
        });
    }

    if !status.is_success() {
        return Err(ScreenerError::Pipeline {
            status: status.as_u16(),
            message: GENERIC_FAILURE.to_string(),
        });
    }

    match value {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(ScreenerError::Pipeline {
            status: status.as_u16(),
            message: GENERIC_FAILURE.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_success() {
        let body = br#"{"total_transactions": 12, "flagged_transactions": 3}"#;
        let summary: RunSummary = parse_payload(StatusCode::OK, body).unwrap();
        assert_eq!(summary.total_transactions, 12);
        assert_eq!(summary.flagged_transactions, 3);
    }

    #[test]
    fn test_parse_payload_non_2xx_with_server_message() {
        let body = br#"{"error": "Run not found"}"#;
        let result: Result<RunSummary> = parse_payload(StatusCode::NOT_FOUND, body);

        match result {
            Err(ScreenerError::Pipeline { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Run not found");
            }
            other => panic!("expected pipeline error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_payload_embedded_error_in_2xx_body() {
        // The upstream reports missing runs as 200 + {"error": ...}
        let body = br#"{"error": "File too large. Use pagination with small limits."}"#;
        let result: Result<RunSummary> = parse_payload(StatusCode::OK, body);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_payload_unparsable_body_falls_back_to_generic() {
        let result: Result<RunSummary> =
            parse_payload(StatusCode::BAD_GATEWAY, b"<html>upstream down</html>");

        match result {
            Err(ScreenerError::Pipeline { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, GENERIC_FAILURE);
            }
            other => panic!("expected pipeline error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_payload_array_body() {
        let body = br#"["a.json", "b.json"]"#;
        let files: Vec<String> = parse_payload(StatusCode::OK, body).unwrap();
        assert_eq!(files, vec!["a.json".to_string(), "b.json".to_string()]);
    }
}
