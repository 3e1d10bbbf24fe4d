//! Run summary aggregation for the dashboard
//!
//! Summaries are fetched independently per run (fan-out/fan-in); a failed
//! fetch is logged and excluded from the fold so one bad run file never
//! blanks the whole dashboard.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::Result;
use crate::models::{DashboardTotals, RunId, RunSummary};
use crate::pipeline::ScreeningApi;

/// The dashboard only summarizes the newest runs; older ones stay
/// reachable through the transaction endpoints.
pub const DASHBOARD_RUN_LIMIT: usize = 10;

/// Fold per-run summaries into dashboard-wide totals.
///
/// Commutative and associative; the order of the input carries no meaning.
/// An empty input yields all-zero totals.
pub fn aggregate<I>(summaries: I) -> DashboardTotals
where
    I: IntoIterator<Item = RunSummary>,
{
    summaries
        .into_iter()
        .fold(DashboardTotals::default(), |mut totals, summary| {
            totals.total_transactions += summary.total_transactions;
            totals.total_flagged += summary.flagged_transactions;
            totals.total_verified += summary.verified_transactions();
            totals
        })
}

/// One run entry on the dashboard. `summary` is None when that run's
/// summary fetch failed; the identifier still renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCard {
    pub run_id: RunId,
    pub summary: Option<RunSummary>,
}

/// Everything one dashboard render needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub totals: DashboardTotals,
    pub runs: Vec<RunCard>,
}

/// Assemble the dashboard.
///
/// The run listing is the primary fetch — its failure surfaces to the
/// caller. Each summary fetch then fans out independently; failed branches
/// are logged and excluded, and the totals fold over whatever survived.
pub async fn load_dashboard(api: Arc<dyn ScreeningApi>) -> Result<DashboardView> {
    let run_ids = api.list_runs().await?;

    let mut fetches = JoinSet::new();
    for (position, run_id) in run_ids.iter().take(DASHBOARD_RUN_LIMIT).cloned().enumerate() {
        let api = Arc::clone(&api);
        fetches.spawn(async move {
            let outcome = api.run_summary(&run_id).await;
            (position, run_id, outcome)
        });
    }

    let mut cards: Vec<RunCard> = run_ids
        .into_iter()
        .take(DASHBOARD_RUN_LIMIT)
        .map(|run_id| RunCard {
            run_id,
            summary: None,
        })
        .collect();

    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok((position, _, Ok(summary))) => cards[position].summary = Some(summary),
            Ok((_, run_id, Err(error))) => {
                warn!("Summary fetch failed for run {}: {}", run_id, error);
            }
            Err(join_error) => warn!("Summary fetch task failed: {}", join_error),
        }
    }

    let totals = aggregate(cards.iter().filter_map(|card| card.summary.clone()));

    Ok(DashboardView {
        totals,
        runs: cards,
    })
}
