//! API route handlers

pub mod health;
pub mod liquidity;
pub mod pool;
pub mod swap;
pub mod trades;

use axum::{http::StatusCode, routing::get, Json, Router};
use cosmo_core::{Address, Error, Side};

use crate::dto::ApiError;
use crate::relay::CallerError;
use crate::AppState;

/// Handler result with a JSON error body
pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/config", get(health::get_config))
        .merge(pool::router())
        .merge(liquidity::router())
        .merge(swap::router())
        .merge(trades::router())
        .with_state(state)
}

/// Map an engine error to a status code and error body
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<ApiError>) {
    match err {
        Error::Pool(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            (status, Json(ApiError::new(e.error_code(), e.to_string())))
        }
        Error::InvalidAddress { address } => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "invalid_address",
                format!("Invalid address: {}", address),
            )),
        ),
        Error::Storage(e) => {
            tracing::error!("Storage failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("storage_error", e.to_string())),
            )
        }
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal(other.to_string())),
        ),
    }
}

pub(crate) fn caller_rejection(err: CallerError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::unauthorized(err.to_string())),
    )
}

pub(crate) fn parse_address(raw: &str) -> Result<Address, (StatusCode, Json<ApiError>)> {
    Address::parse(raw).map_err(error_response)
}

/// Resolve `a`, `b` or one of the pool's token addresses to a side
pub(crate) async fn resolve_side(
    state: &AppState,
    raw: &str,
) -> Result<Side, (StatusCode, Json<ApiError>)> {
    match raw.to_ascii_lowercase().as_str() {
        "a" => return Ok(Side::A),
        "b" => return Ok(Side::B),
        _ => {}
    }
    let address = parse_address(raw)?;
    state
        .service()
        .read(|pool| pool.side_of(&address))
        .await
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::bad_request(format!(
                    "Token {} is not traded in this pool",
                    address
                ))),
            )
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use amm::{PoolService, PreFunded};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cosmo_core::AppConfig;
    use tower::ServiceExt;

    use crate::relay::CALLER_HEADER;
    use crate::{create_app, AppState};

    pub const PROVIDER: &str = "0x1111111111111111111111111111111111111111";
    pub const TRADER: &str = "0x2222222222222222222222222222222222222222";
    pub const OPERATOR: &str = "0x7777777777777777777777777777777777777777";
    pub const E18: u128 = 1_000_000_000_000_000_000;
    pub const E6: u128 = 1_000_000;

    pub fn app_state() -> AppState {
        let mut config = AppConfig::default();
        config.pool.operators = vec![OPERATOR.to_string()];
        let service = PoolService::in_memory(&config.pool, Arc::new(PreFunded)).unwrap();
        AppState::new(service, config).unwrap()
    }

    pub async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            request = request.header(CALLER_HEADER, caller);
        }
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }

    /// Seed 1000 token A / 1000 token B from `PROVIDER`
    pub async fn seed(state: &AppState) {
        let body = serde_json::json!({
            "amount_a": (1000 * E18).to_string(),
            "amount_b": (1000 * E6).to_string(),
        });
        let (status, _) = send(state, "POST", "/liquidity/add", Some(PROVIDER), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
