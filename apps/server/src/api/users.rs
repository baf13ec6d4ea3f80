use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use papertrade_core::{
    accounts::UserAccount,
    portfolio::{growth::PortfolioGrowthPoint, state::PortfolioDetails},
    utils::time_utils::valuation_date_today,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUserRequest {
    user_id: String,
    starting_cash: Option<Decimal>,
}

fn validate_user_id(user_id: &str) -> ApiResult<()> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId must not be empty".to_string()));
    }
    Ok(())
}

/// Registers a user and opens their account with its starting cash.
async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<PortfolioDetails>)> {
    validate_user_id(&request.user_id)?;
    if matches!(request.starting_cash, Some(cash) if cash <= Decimal::ZERO) {
        return Err(ApiError::BadRequest(
            "startingCash must be positive".to_string(),
        ));
    }
    if state
        .account_repository
        .get_account(&request.user_id)?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "user {} is already registered",
            request.user_id
        )));
    }

    let mut account = UserAccount::new(request.user_id.clone(), Utc::now());
    account.starting_cash = request.starting_cash;
    state.account_repository.upsert_account(account).await?;
    let details = state.portfolio_service.reset_user(&request.user_id).await?;
    tracing::info!("Registered user {}", request.user_id);
    Ok((StatusCode::CREATED, Json(details)))
}

async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PortfolioDetails>> {
    state
        .portfolio_service
        .get_portfolio_details(&user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no portfolio for user {}", user_id)))
}

async fn get_growth(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<PortfolioGrowthPoint>>> {
    Ok(Json(state.portfolio_service.get_growth(&user_id)?))
}

async fn recalculate_portfolio(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PortfolioDetails>> {
    validate_user_id(&user_id)?;
    let details = state
        .portfolio_service
        .recalculate_user(&user_id, valuation_date_today())
        .await?;
    Ok(Json(details))
}

async fn reset_portfolio(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PortfolioDetails>> {
    validate_user_id(&user_id)?;
    Ok(Json(state.portfolio_service.reset_user(&user_id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{user_id}/portfolio", get(get_portfolio))
        .route("/users/{user_id}/portfolio/growth", get(get_growth))
        .route(
            "/users/{user_id}/portfolio/recalculate",
            post(recalculate_portfolio),
        )
        .route("/users/{user_id}/reset", post(reset_portfolio))
}
