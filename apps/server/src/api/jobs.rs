//! Batch entry points, meant to be triggered by an external scheduler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use papertrade_core::{
    batch::BatchReport, orders::OrderExecutionReport, utils::time_utils::valuation_date_today,
};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Debug, Default, Deserialize)]
struct NightlyUpdateParams {
    /// Trading date to update to. Defaults to today on the exchange clock.
    date: Option<NaiveDate>,
}

async fn nightly_update(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NightlyUpdateParams>,
) -> ApiResult<Json<BatchReport>> {
    let today = params.date.unwrap_or_else(valuation_date_today);
    let run_id = Uuid::now_v7();
    let span = tracing::info_span!("job", name = "nightly-update", %run_id, %today);

    let report = state
        .portfolio_service
        .run_nightly_update(today)
        .instrument(span.clone())
        .await?;
    span.in_scope(|| {
        tracing::info!(
            succeeded = report.succeeded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Nightly update finished"
        )
    });
    Ok(Json(report))
}

async fn execute_orders(State(state): State<Arc<AppState>>) -> ApiResult<Json<OrderExecutionReport>> {
    let run_id = Uuid::now_v7();
    let span = tracing::info_span!("job", name = "execute-orders", %run_id);

    let report = state
        .order_service
        .execute_outstanding_orders()
        .instrument(span.clone())
        .await?;
    span.in_scope(|| {
        tracing::info!(
            market_open = report.market_open,
            filled = report.filled_orders,
            failed_users = report.users.failed.len(),
            "Order execution finished"
        )
    });
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/nightly-update", post(nightly_update))
        .route("/jobs/execute-orders", post(execute_orders))
}
