//! Pool state, positions and quotes

use amm::{calculator, LiquidityPosition};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use cosmo_core::{Direction, PoolError, Side};

use super::{error_response, parse_address, resolve_side, ApiResult};
use crate::dto::{PoolResponse, QuoteKind, QuoteRequest, QuoteResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pool", get(get_pool))
        .route("/pool/positions/:holder", get(get_position))
        .route("/pool/quote", post(get_quote))
}

/// GET /pool - Reserves, supply, rates and one-token quotes
async fn get_pool(State(state): State<AppState>) -> Json<PoolResponse> {
    let response = state
        .service()
        .read(|pool| {
            let snapshot = pool.snapshot();
            let token_a = pool.token(Side::A).clone();
            let token_b = pool.token(Side::B).clone();
            let one_a_to_b = pool
                .quote_out(token_a.unit(), Direction::AToB)
                .ok()
                .map(|amount| amount.to_string());
            let one_b_to_a = pool
                .quote_out(token_b.unit(), Direction::BToA)
                .ok()
                .map(|amount| amount.to_string());

            PoolResponse {
                price_a_in_b: calculator::spot_price(
                    snapshot.reserve_a,
                    snapshot.reserve_b,
                    token_a.decimals,
                    token_b.decimals,
                ),
                price_b_in_a: calculator::spot_price(
                    snapshot.reserve_b,
                    snapshot.reserve_a,
                    token_b.decimals,
                    token_a.decimals,
                ),
                token_a: token_a.into(),
                token_b: token_b.into(),
                reserve_a: snapshot.reserve_a,
                reserve_b: snapshot.reserve_b,
                total_liquidity: snapshot.total_liquidity,
                trade_count: snapshot.trade_count,
                one_a_to_b,
                one_b_to_a,
            }
        })
        .await;
    Json(response)
}

/// GET /pool/positions/:holder - Shares and redeemable amounts
async fn get_position(
    State(state): State<AppState>,
    Path(holder): Path<String>,
) -> ApiResult<LiquidityPosition> {
    let holder = parse_address(&holder)?;
    Ok(Json(state.service().position(holder).await))
}

/// POST /pool/quote - Exact-in or exact-out quote
async fn get_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<QuoteResponse> {
    let token_in = resolve_side(&state, &request.token_in).await?;
    let token_out = resolve_side(&state, &request.token_out).await?;
    let direction = Direction::from_sides(token_in, token_out)
        .map_err(|e| error_response(e.into()))?;

    let quote = state
        .service()
        .read(|pool| -> Result<_, PoolError> {
            let amount_in = match request.kind {
                QuoteKind::ExactIn => request.amount,
                QuoteKind::ExactOut => pool.quote_in(request.amount, direction)?,
            };
            pool.quote(amount_in, direction)
        })
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(QuoteResponse {
        kind: request.kind,
        direction,
        amount_in: quote.amount_in,
        amount_out: quote.amount_out,
        fee_amount: quote.fee_amount,
        price_impact: quote.price_impact,
        spot_price: quote.spot_price,
        min_output_suggested: quote.min_output_suggested,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::*;

    #[tokio::test]
    async fn test_empty_pool_view() {
        let state = app_state();
        let (status, body) = send(&state, "GET", "/pool", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reserve_a"], "0");
        assert_eq!(body["total_liquidity"], "0");
        assert!(body["one_a_to_b"].is_null());
    }

    #[tokio::test]
    async fn test_seeded_pool_view() {
        let state = app_state();
        seed(&state).await;

        let (status, body) = send(&state, "GET", "/pool", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reserve_a"], (1000 * E18).to_string());
        assert_eq!(body["reserve_b"], (1000 * E6).to_string());
        assert!((body["price_a_in_b"].as_f64().unwrap() - 1.0).abs() < 1e-9);
        // one ICECREAM buys slightly less than one USDC
        assert_eq!(body["one_a_to_b"], "996006");
    }

    #[tokio::test]
    async fn test_position() {
        let state = app_state();
        seed(&state).await;

        let uri = format!("/pool/positions/{}", PROVIDER);
        let (status, body) = send(&state, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shares"], "1000000000000000");
        assert_eq!(body["amount_a"], (1000 * E18).to_string());
        assert_eq!(body["pool_share"], 100.0);

        let (status, body) = send(&state, "GET", "/pool/positions/nope", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_address");
    }

    #[tokio::test]
    async fn test_quotes() {
        let state = app_state();
        seed(&state).await;

        let request = json!({
            "token_in": "a",
            "token_out": "b",
            "amount": (100 * E18).to_string(),
        });
        let (status, body) = send(&state, "POST", "/pool/quote", None, Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount_out"], "90661089");
        assert_eq!(body["direction"], "a_to_b");

        // exact-out by token address
        let request = json!({
            "token_in": "0xEcAe8C3655dC10760288F62698D3d36a53918C74",
            "token_out": "0x0829344670A694d66Eac833308d0b2879c2f8899",
            "amount": "90661089",
            "kind": "exact_out",
        });
        let (status, body) = send(&state, "POST", "/pool/quote", None, Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount_in"], "99999999529346048346");

        let request = json!({ "token_in": "a", "token_out": "a", "amount": "1" });
        let (status, body) = send(&state, "POST", "/pool/quote", None, Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");
    }
}
