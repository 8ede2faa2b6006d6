//! Liquidity deposit and withdrawal

use amm::{LiquidityAdded, LiquidityRemoved};
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};

use super::{caller_rejection, error_response, ApiResult};
use crate::dto::{AddLiquidityRequest, RemoveLiquidityRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/liquidity/add", post(add_liquidity))
        .route("/liquidity/remove", post(remove_liquidity))
}

/// POST /liquidity/add - Deposit both tokens and mint shares
async fn add_liquidity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddLiquidityRequest>,
) -> ApiResult<LiquidityAdded> {
    let caller = state.caller(&headers).map_err(caller_rejection)?;
    let added = state
        .service()
        .add_liquidity(
            caller,
            request.amount_a,
            request.amount_b,
            request.min_liquidity,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(added))
}

/// POST /liquidity/remove - Burn shares for a proportional payout
async fn remove_liquidity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RemoveLiquidityRequest>,
) -> ApiResult<LiquidityRemoved> {
    let caller = state.caller(&headers).map_err(caller_rejection)?;
    let removed = state
        .service()
        .remove_liquidity(
            caller,
            request.liquidity,
            request.min_amount_a,
            request.min_amount_b,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(removed))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::*;

    #[tokio::test]
    async fn test_add_then_remove() {
        let state = app_state();
        let request = json!({
            "amount_a": (1000 * E18).to_string(),
            "amount_b": (1000 * E6).to_string(),
            "min_liquidity": "1000000000000000",
        });
        let (status, body) =
            send(&state, "POST", "/liquidity/add", Some(PROVIDER), Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minted"], "1000000000000000");
        assert_eq!(body["provider"], PROVIDER);

        let request = json!({ "liquidity": "500000000000000" });
        let (status, body) =
            send(&state, "POST", "/liquidity/remove", Some(PROVIDER), Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount_a"], (500 * E18).to_string());
        assert_eq!(body["amount_b"], (500 * E6).to_string());
    }

    #[tokio::test]
    async fn test_requires_caller() {
        let state = app_state();
        let request = json!({ "amount_a": "1", "amount_b": "1" });
        let (status, body) = send(&state, "POST", "/liquidity/add", None, Some(request)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_engine_errors_map_to_status() {
        let state = app_state();
        let request = json!({ "amount_a": "0", "amount_b": "1000" });
        let (status, body) =
            send(&state, "POST", "/liquidity/add", Some(PROVIDER), Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");

        seed(&state).await;
        let request = json!({ "liquidity": "1" });
        let (status, body) =
            send(&state, "POST", "/liquidity/remove", Some(TRADER), Some(request)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "insufficient_balance");
    }
}
