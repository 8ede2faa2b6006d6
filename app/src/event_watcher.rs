//! Background pool event watcher
//!
//! Follows the service's event stream and keeps running totals that are
//! logged periodically, so operators can see pool activity without polling
//! the API.

use amm::PoolEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Log a summary after this many events
const SUMMARY_EVERY: u64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTotals {
    pub deposits: u64,
    pub withdrawals: u64,
    pub swaps: u64,
    pub triggered_swaps: u64,
    /// Events dropped because the watcher fell behind
    pub missed: u64,
}

impl ActivityTotals {
    pub fn record(&mut self, event: &PoolEvent) {
        match event {
            PoolEvent::AddLiquidity(_) => self.deposits += 1,
            PoolEvent::RemoveLiquidity(_) => self.withdrawals += 1,
            PoolEvent::Swap(_) => self.swaps += 1,
            PoolEvent::TriggeredSwap(_) => self.triggered_swaps += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.deposits + self.withdrawals + self.swaps + self.triggered_swaps
    }
}

/// Consume events until the channel closes, returning the final totals
pub async fn watch(mut events: broadcast::Receiver<PoolEvent>) -> ActivityTotals {
    let mut totals = ActivityTotals::default();
    loop {
        match events.recv().await {
            Ok(event) => {
                tracing::debug!("Pool event: {}", event);
                totals.record(&event);
                if totals.total() % SUMMARY_EVERY == 0 {
                    tracing::info!(
                        "Pool activity: {} deposits, {} withdrawals, {} swaps ({} triggered)",
                        totals.deposits,
                        totals.withdrawals,
                        totals.swaps + totals.triggered_swaps,
                        totals.triggered_swaps
                    );
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event watcher lagged, skipped {} events", skipped);
                totals.missed += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    totals
}

pub fn spawn(events: broadcast::Receiver<PoolEvent>) -> JoinHandle<ActivityTotals> {
    tokio::spawn(watch(events))
}
