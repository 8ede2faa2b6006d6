//! Health check and static pool configuration

use amm::fees;
use axum::{extract::State, Json};
use cosmo_core::Side;

use crate::dto::{ConfigResponse, HealthResponse};
use crate::AppState;

/// GET /health - Check API health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// GET /config - Tokens, fee and forwarder
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let service = state.service();
    Json(ConfigResponse {
        token_a: service.token(Side::A).await.into(),
        token_b: service.token(Side::B).await.into(),
        fee_numerator: fees::FEE_NUM,
        fee_denominator: fees::FEE_DENOM,
        fee_bps: fees::FEE_BPS,
        trusted_forwarder: state.trusted_forwarder(),
    })
}
