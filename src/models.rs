//! Core data models for screening runs and transactions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

//
// ================= Verdict =================
//

/// Raw verdict assigned by the pipeline's secondary reasoning step.
///
/// Unflagged transactions arrive as `SKIPPED`. Anything the pipeline emits
/// that we do not recognize lands in `Unknown` instead of failing
/// deserialization, so classification stays total over upstream changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    Fail,
    WeakReasoning,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl Default for Verdict {
    fn default() -> Self {
        Verdict::Unknown
    }
}

//
// ================= Reasoning =================
//

/// Raw model completion attached to a flagged transaction.
///
/// Recent run files flatten this to a plain string; older ones carry the
/// reasoner's structured payload with the completion under `raw_output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReasoning {
    Text(String),
    Structured(serde_json::Map<String, Value>),
}

impl RawReasoning {
    /// Unwrap the narrative text the extractor operates on.
    pub fn narrative_source(&self) -> String {
        match self {
            RawReasoning::Text(text) => text.clone(),
            RawReasoning::Structured(fields) => match fields.get("raw_output") {
                Some(Value::String(raw)) => raw.clone(),
                Some(other) => other.to_string(),
                None => serde_json::to_string_pretty(fields).unwrap_or_default(),
            },
        }
    }
}

impl Default for RawReasoning {
    fn default() -> Self {
        RawReasoning::Text(String::new())
    }
}

//
// ================= Transaction =================
//

/// One screened event, as stored in a run file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub verification: Verdict,
    #[serde(default)]
    pub llm_output: RawReasoning,
    /// Descriptive attributes (merchant, account, risk flags). Passed
    /// through verbatim; no derived logic on this side.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, Value>,
}

/// Deduplicate rule codes preserving first-seen order.
pub fn dedup_rules(rules: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    rules
        .iter()
        .filter(|rule| seen.insert(rule.as_str()))
        .cloned()
        .collect()
}

//
// ================= Runs =================
//

/// Identifier of one pipeline run.
///
/// The upstream listing endpoint returns run-file names (`<uuid>.json`);
/// `from_file_name` normalizes those to the bare identifier every other
/// endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_file_name(name: &str) -> Self {
        Self(name.strip_suffix(".json").unwrap_or(name).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary statistics for one run, fetched without loading the run file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub total_transactions: u64,
    #[serde(default)]
    pub flagged_transactions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
}

impl RunSummary {
    /// Transactions with no triggered rules. Saturating: a flagged count
    /// above the total is clamped instead of underflowing.
    pub fn verified_transactions(&self) -> u64 {
        self.total_transactions.saturating_sub(self.flagged_transactions)
    }
}

/// Response to triggering a new pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStarted {
    pub run_id: Uuid,
    pub total_transactions: u64,
    pub flagged_transactions: u64,
}

//
// ================= Pagination =================
//

/// Query parameters for a run's transaction page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub flagged_only: bool,
}

fn default_page_limit() -> u32 {
    100
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: default_page_limit(),
            offset: 0,
            flagged_only: false,
        }
    }
}

/// One page of a run's transactions, as the upstream returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub returned: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

//
// ================= Dashboard =================
//

/// Cross-run totals. Derived on every dashboard request; never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardTotals {
    pub total_transactions: u64,
    pub total_flagged: u64,
    pub total_verified: u64,
}

//
// ================= Tests =================
//
