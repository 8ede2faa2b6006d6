//! Append-only trade history
//!
//! Records are never mutated or removed. A per-trader index and running
//! totals are kept alongside so wallet views page through their own trades
//! without scanning the global log.

use std::collections::HashMap;

use cosmo_core::{Address, Side};

use crate::state::{TradeRecord, TraderStats};

#[derive(Debug, Clone, Default)]
pub struct TradeLog {
    records: Vec<TradeRecord>,
    by_trader: HashMap<Address, Vec<usize>>,
    stats: HashMap<Address, TraderStats>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index the next appended record will receive
    pub fn next_index(&self) -> u64 {
        self.records.len() as u64
    }

    pub(crate) fn push(&mut self, record: TradeRecord) {
        debug_assert_eq!(record.index, self.next_index());
        let position = self.records.len();

        let stats = self.stats.entry(record.trader).or_default();
        stats.trade_count += 1;
        match record.token_in {
            Side::A => stats.volume_in_a = stats.volume_in_a.saturating_add(record.amount_in),
            Side::B => stats.volume_in_b = stats.volume_in_b.saturating_add(record.amount_in),
        }
        match record.token_out {
            Side::A => stats.volume_out_a = stats.volume_out_a.saturating_add(record.amount_out),
            Side::B => stats.volume_out_b = stats.volume_out_b.saturating_add(record.amount_out),
        }

        self.by_trader.entry(record.trader).or_default().push(position);
        self.records.push(record);
    }

    /// Records `[offset, offset + count)`, clamped to the log length
    pub fn batch(&self, offset: usize, count: usize) -> &[TradeRecord] {
        let start = offset.min(self.records.len());
        let end = start.saturating_add(count).min(self.records.len());
        &self.records[start..end]
    }

    /// Number of trades recorded for `trader`
    pub fn trader_len(&self, trader: &Address) -> usize {
        self.by_trader.get(trader).map_or(0, Vec::len)
    }

    /// The trader's own trades, paged in insertion order
    pub fn for_trader(&self, trader: &Address, offset: usize, count: usize) -> Vec<TradeRecord> {
        let Some(positions) = self.by_trader.get(trader) else {
            return Vec::new();
        };
        positions
            .iter()
            .skip(offset)
            .take(count)
            .filter_map(|&i| self.records.get(i).cloned())
            .collect()
    }

    pub fn stats(&self, trader: &Address) -> TraderStats {
        self.stats.get(trader).copied().unwrap_or_default()
    }
}
