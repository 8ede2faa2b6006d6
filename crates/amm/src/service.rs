//! Serialized access to a pool
//!
//! Mutations queue on a fair writer lock and run one at a time in arrival
//! order. Each one holds the pool's write lock while it is planned against
//! committed state, settled with custody, journaled and committed, so
//! readers never observe a half-applied operation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cosmo_core::{
    Address, Amount, Direction, Error, PoolConfig, Result, Side, StorageConfig, Timestamp,
    TokenInfo,
};
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::auth::OperatorSet;
use crate::custody::Custody;
use crate::journal::{self, FileJournal, Journal, JournalEntry, MemoryJournal};
use crate::pool::Pool;
use crate::state::{
    LiquidityAdded, LiquidityPosition, LiquidityRemoved, Operation, PoolEvent, PoolSnapshot,
    SwapQuote, Swapped, TradeRecord, TraderStats,
};

/// Capacity of the event broadcast buffer
const EVENT_BUFFER: usize = 256;

/// Shared handle to one pool
#[derive(Clone)]
pub struct PoolService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    pool: RwLock<Pool>,
    writer: Mutex<Box<dyn Journal>>,
    custody: Arc<dyn Custody>,
    operators: OperatorSet,
    events: broadcast::Sender<PoolEvent>,
}

impl PoolService {
    pub fn new(
        pool: Pool,
        journal: Box<dyn Journal>,
        custody: Arc<dyn Custody>,
        operators: OperatorSet,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(ServiceInner {
                pool: RwLock::new(pool),
                writer: Mutex::new(journal),
                custody,
                operators,
                events,
            }),
        }
    }

    /// Build the pool from config and recover it from the journal, if one is
    /// configured
    pub fn open(
        config: &PoolConfig,
        storage: &StorageConfig,
        custody: Arc<dyn Custody>,
    ) -> Result<Self> {
        let mut pool = Pool::from_config(config)?;
        let operators = OperatorSet::new(config.operators()?);
        if operators.is_empty() {
            tracing::info!("No operators configured, triggered swaps are disabled");
        } else {
            tracing::info!("{} operators may trigger swaps", operators.len());
        }

        let journal: Box<dyn Journal> = match &storage.journal_path {
            Some(path) => {
                let (journal, entries) = FileJournal::open(path, storage.sync_writes)?;
                journal::replay(&mut pool, &entries)?;
                tracing::info!(
                    "Recovered pool from {} ({} operations, {} trades)",
                    journal.path().display(),
                    entries.len(),
                    pool.trades().len()
                );
                Box::new(journal)
            }
            None => {
                tracing::warn!("No journal configured, pool state is kept in memory only");
                Box::new(MemoryJournal::new())
            }
        };

        Ok(Self::new(pool, journal, custody, operators))
    }

    /// Pool without persistence
    pub fn in_memory(config: &PoolConfig, custody: Arc<dyn Custody>) -> Result<Self> {
        Self::open(config, &StorageConfig::default(), custody)
    }

    /// Run one mutation through plan, custody, journal and commit.
    ///
    /// Both locks are taken before anything has side effects, and nothing
    /// awaits while they are held. Dropping the returned future therefore
    /// either abandons the operation untouched or lets it finish.
    pub async fn execute(&self, operation: Operation) -> Result<PoolEvent> {
        let mut journal = self.inner.writer.lock().await;
        let mut pool = self.inner.pool.write().await;
        let timestamp = now();

        let transition = match pool.plan(&operation, timestamp) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", operation.name(), e);
                return Err(e.into());
            }
        };

        self.inner.custody.settle(transition.transfers())?;

        let entry = JournalEntry {
            sequence: transition.sequence(),
            timestamp,
            operation,
        };
        if let Err(e) = journal.append(&entry) {
            tracing::error!(
                "Journal append failed for sequence {}: {}",
                entry.sequence,
                e
            );
            self.inner.custody.reverse(transition.transfers());
            return Err(e.into());
        }

        let event = pool.commit(transition);
        drop(pool);
        drop(journal);

        tracing::info!("#{} {}", entry.sequence, event);
        // No subscribers is fine.
        let _ = self.inner.events.send(event.clone());
        Ok(event)
    }

    pub async fn add_liquidity(
        &self,
        caller: Address,
        amount_a: Amount,
        amount_b: Amount,
        min_liquidity: Amount,
    ) -> Result<LiquidityAdded> {
        let event = self
            .execute(Operation::AddLiquidity {
                caller,
                amount_a,
                amount_b,
                min_liquidity,
            })
            .await?;
        match event {
            PoolEvent::AddLiquidity(added) => Ok(added),
            other => Err(unexpected(other)),
        }
    }

    pub async fn remove_liquidity(
        &self,
        caller: Address,
        liquidity: Amount,
        min_amount_a: Amount,
        min_amount_b: Amount,
    ) -> Result<LiquidityRemoved> {
        let event = self
            .execute(Operation::RemoveLiquidity {
                caller,
                liquidity,
                min_amount_a,
                min_amount_b,
            })
            .await?;
        match event {
            PoolEvent::RemoveLiquidity(removed) => Ok(removed),
            other => Err(unexpected(other)),
        }
    }

    pub async fn swap(
        &self,
        caller: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
    ) -> Result<Swapped> {
        let event = self
            .execute(Operation::Swap {
                caller,
                amount_in,
                min_amount_out,
                direction,
            })
            .await?;
        match event {
            PoolEvent::Swap(swapped) => Ok(swapped),
            other => Err(unexpected(other)),
        }
    }

    /// Swap on behalf of `trader` with output to `recipient`; `operator` must
    /// be in the operator set
    pub async fn triggered_swap(
        &self,
        operator: Address,
        trader: Address,
        recipient: Address,
        amount_in: Amount,
        min_amount_out: Amount,
        direction: Direction,
    ) -> Result<Swapped> {
        if let Err(e) = self.inner.operators.authorize(&operator) {
            tracing::warn!("Triggered swap refused for {}", operator);
            return Err(e.into());
        }
        let event = self
            .execute(Operation::TriggeredSwap {
                operator,
                trader,
                recipient,
                amount_in,
                min_amount_out,
                direction,
            })
            .await?;
        match event {
            PoolEvent::TriggeredSwap(swapped) => Ok(swapped),
            other => Err(unexpected(other)),
        }
    }

    /// Run a read-only closure against one consistent view of the pool
    pub async fn read<R>(&self, f: impl FnOnce(&Pool) -> R) -> R {
        let pool = self.inner.pool.read().await;
        f(&pool)
    }

    pub async fn snapshot(&self) -> PoolSnapshot {
        self.read(Pool::snapshot).await
    }

    pub async fn token(&self, side: Side) -> TokenInfo {
        self.read(|pool| pool.token(side).clone()).await
    }

    pub async fn position(&self, holder: Address) -> LiquidityPosition {
        self.read(|pool| pool.position(&holder)).await
    }

    pub async fn quote(&self, amount_in: Amount, direction: Direction) -> Result<SwapQuote> {
        Ok(self.read(|pool| pool.quote(amount_in, direction)).await?)
    }

    pub async fn quote_in(&self, amount_out: Amount, direction: Direction) -> Result<Amount> {
        Ok(self.read(|pool| pool.quote_in(amount_out, direction)).await?)
    }

    pub async fn trade_history(&self, offset: usize, count: usize) -> Vec<TradeRecord> {
        self.read(|pool| pool.trades().batch(offset, count).to_vec())
            .await
    }

    pub async fn trade_history_len(&self) -> usize {
        self.read(|pool| pool.trades().len()).await
    }

    pub async fn trader_history(
        &self,
        trader: Address,
        offset: usize,
        count: usize,
    ) -> (Vec<TradeRecord>, usize, TraderStats) {
        self.read(|pool| {
            let trades = pool.trades();
            (
                trades.for_trader(&trader, offset, count),
                trades.trader_len(&trader),
                pool.trader_stats(&trader),
            )
        })
        .await
    }

    pub fn is_operator(&self, caller: &Address) -> bool {
        self.inner.operators.contains(caller)
    }

    /// Receive events for every mutation committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }
}

fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn unexpected(event: PoolEvent) -> Error {
    Error::Serialization(format!("operation produced unexpected event: {}", event))
}
