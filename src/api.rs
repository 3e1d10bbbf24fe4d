//! REST API server for the screening results console
//!
//! Serves the normalized screening views the frontend renders:
//! dashboard totals, per-run transaction pages and single-transaction
//! detail. All raw data comes from the pipeline service; this layer only
//! labels, aggregates and cleans it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::classifier::{VerificationClassifier, VerificationStatus};
use crate::error::ScreenerError;
use crate::models::{dedup_rules, PageQuery, RunId, Transaction, Verdict};
use crate::pipeline::ScreeningApi;
use crate::reasoning;
use crate::summary;

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Whether the caller may usefully retry the same request.
    #[serde(default)]
    pub retryable: bool,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            retryable: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String, retryable: bool) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            retryable,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// View Models
/// =============================

/// One normalized row in a transaction list: the raw record labeled with
/// its display status and confidence, rules deduplicated stable-order.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: i64,
    pub amount: f64,
    pub rules: Vec<String>,
    pub verification: Verdict,
    pub status: VerificationStatus,
    pub confidence: u8,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl TransactionRow {
    pub fn from_transaction(txn: Transaction) -> Self {
        let rules = dedup_rules(&txn.rules);
        let status = VerificationClassifier::classify(&rules, txn.verification);
        let confidence = VerificationClassifier::confidence(&rules, txn.verification);

        Self {
            transaction_id: txn.transaction_id,
            amount: txn.amount,
            rules,
            verification: txn.verification,
            status,
            confidence,
            attributes: txn.attributes,
        }
    }
}

/// A paged, labeled transaction list for one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListView {
    pub total: u64,
    pub returned: u64,
    pub offset: u64,
    pub limit: u64,
    pub transactions: Vec<TransactionRow>,
}

/// The detail view adds the extracted narrative to the labeled row.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionDetailView {
    #[serde(flatten)]
    pub row: TransactionRow,
    pub narrative: String,
}

impl TransactionDetailView {
    pub fn from_transaction(txn: Transaction) -> Self {
        let narrative = reasoning::extract_narrative(&txn.llm_output);
        Self {
            row: TransactionRow::from_transaction(txn),
            narrative,
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub api: Arc<dyn ScreeningApi>,
}

/// =============================
/// Failure Mapping
/// =============================

/// Map a core failure onto the transport. Everything surfaced here came
/// from a single-target fetch; transport-level failures are retryable,
/// upstream "not found" answers are not.
fn failure_response(error: ScreenerError) -> (StatusCode, Json<ApiResponse>) {
    warn!("Request failed: {}", error);

    let status = match &error {
        ScreenerError::Pipeline { message, .. }
            if message.to_lowercase().contains("not found") =>
        {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::BAD_GATEWAY,
    };
    let retryable = status != StatusCode::NOT_FOUND;

    (status, Json(ApiResponse::error(error.to_string(), retryable)))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Handlers
/// =============================

async fn trigger_screening(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    info!("Received screening trigger request");

    match state.api.trigger_run().await {
        Ok(started) => (StatusCode::OK, Json(ApiResponse::success(started))),
        Err(error) => failure_response(error),
    }
}

async fn dashboard(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    match summary::load_dashboard(Arc::clone(&state.api)).await {
        Ok(view) => (StatusCode::OK, Json(ApiResponse::success(view))),
        Err(error) => failure_response(error),
    }
}

async fn run_transactions(
    State(state): State<ApiState>,
    Path(run_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> (StatusCode, Json<ApiResponse>) {
    let run_id = RunId::new(run_id);

    match state.api.run_page(&run_id, query).await {
        Ok(page) => {
            let view = TransactionListView {
                total: page.total,
                returned: page.returned,
                offset: page.offset,
                limit: page.limit,
                transactions: page
                    .transactions
                    .into_iter()
                    .map(TransactionRow::from_transaction)
                    .collect(),
            };
            (StatusCode::OK, Json(ApiResponse::success(view)))
        }
        Err(error) => failure_response(error),
    }
}

async fn transaction_detail(
    State(state): State<ApiState>,
    Path((run_id, txn_id)): Path<(String, i64)>,
) -> (StatusCode, Json<ApiResponse>) {
    let run_id = RunId::new(run_id);

    match state.api.transaction(&run_id, txn_id).await {
        Ok(txn) => (
            StatusCode::OK,
            Json(ApiResponse::success(TransactionDetailView::from_transaction(txn))),
        ),
        Err(error) => failure_response(error),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(api: Arc<dyn ScreeningApi>) -> Router {
    let state = ApiState { api };

    Router::new()
        .route("/health", get(health))
        .route("/api/screen", post(trigger_screening))
        .route("/api/dashboard", get(dashboard))
        .route("/api/runs/:run_id/transactions", get(run_transactions))
        .route(
            "/api/runs/:run_id/transactions/:txn_id",
            get(transaction_detail),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    api: Arc<dyn ScreeningApi>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(api);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
