//! Swap routes

use amm::Swapped;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use cosmo_core::Direction;

use super::{caller_rejection, error_response, resolve_side, ApiResult};
use crate::dto::{ApiError, SwapRequest, TriggeredSwapRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/swap", post(swap))
        .route("/swap/triggered", post(triggered_swap))
}

async fn swap_direction(
    state: &AppState,
    token_in: &str,
    token_out: &str,
) -> Result<Direction, (StatusCode, Json<ApiError>)> {
    let token_in = resolve_side(state, token_in).await?;
    let token_out = resolve_side(state, token_out).await?;
    Direction::from_sides(token_in, token_out).map_err(|e| error_response(e.into()))
}

/// POST /swap - Exact-input swap for the caller
async fn swap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SwapRequest>,
) -> ApiResult<Swapped> {
    let caller = state.caller(&headers).map_err(caller_rejection)?;
    let direction = swap_direction(&state, &request.token_in, &request.token_out).await?;
    let swapped = state
        .service()
        .swap(caller, request.amount_in, request.min_amount_out, direction)
        .await
        .map_err(error_response)?;
    Ok(Json(swapped))
}

/// POST /swap/triggered - Operator swap on behalf of a trader
async fn triggered_swap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TriggeredSwapRequest>,
) -> ApiResult<Swapped> {
    let operator = state.caller(&headers).map_err(caller_rejection)?;
    let direction = swap_direction(&state, &request.token_in, &request.token_out).await?;
    let swapped = state
        .service()
        .triggered_swap(
            operator,
            request.trader,
            request.recipient.unwrap_or(request.trader),
            request.amount_in,
            request.min_amount_out,
            direction,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(swapped))
}
