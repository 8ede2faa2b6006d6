//! Trade log queries

use amm::constants::trade_log::MAX_BATCH;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::{parse_address, ApiResult};
use crate::dto::{TradeCountResponse, TraderTradesResponse, TradesQuery, TradesResponse};
use crate::AppState;

const DEFAULT_COUNT: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trades", get(list_trades))
        .route("/trades/count", get(trade_count))
        .route("/trades/:trader", get(trader_trades))
}

fn page(query: &TradesQuery) -> (usize, usize) {
    let offset = query.offset.unwrap_or(0);
    let count = query.count.unwrap_or(DEFAULT_COUNT).min(MAX_BATCH);
    (offset, count)
}

/// GET /trades?offset&count - Page through the global trade log
async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> Json<TradesResponse> {
    let (offset, count) = page(&query);
    let (trades, total) = state
        .service()
        .read(|pool| {
            let log = pool.trades();
            (log.batch(offset, count).to_vec(), log.len())
        })
        .await;
    Json(TradesResponse {
        count: trades.len(),
        trades,
        offset,
        total,
    })
}

/// GET /trades/count - Number of recorded trades
async fn trade_count(State(state): State<AppState>) -> Json<TradeCountResponse> {
    Json(TradeCountResponse {
        count: state.service().trade_history_len().await,
    })
}

/// GET /trades/:trader - One trader's trades and running totals
async fn trader_trades(
    State(state): State<AppState>,
    Path(trader): Path<String>,
    Query(query): Query<TradesQuery>,
) -> ApiResult<TraderTradesResponse> {
    let trader = parse_address(&trader)?;
    let (offset, count) = page(&query);
    let (trades, total, stats) = state.service().trader_history(trader, offset, count).await;
    Ok(Json(TraderTradesResponse {
        trader,
        trades,
        total,
        stats,
    }))
}
