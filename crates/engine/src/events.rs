//! Per-account event log.

use chrono::{DateTime, Utc};
use custody_domain::{Address, TokenAmount};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Something observable that happened to a custody account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    ManagerAdded {
        manager: Address,
    },
    ManagerRemoved {
        manager: Address,
    },
    EndpointsSet {
        router: Address,
        factory: Address,
    },
    Deposited {
        asset: Address,
        from: Address,
        amount: TokenAmount,
    },
    NativeDeposited {
        from: Address,
        amount: TokenAmount,
    },
    Withdrawn {
        asset: Address,
        to: Address,
        amount: TokenAmount,
    },
    NativeWithdrawn {
        to: Address,
        amount: TokenAmount,
    },
    LiquidityAdded {
        pool: Address,
        amount_a: TokenAmount,
        amount_b: TokenAmount,
        liquidity: TokenAmount,
    },
    LiquidityRemoved {
        pool: Address,
        amount_a: TokenAmount,
        amount_b: TokenAmount,
    },
    Staked {
        gauge: Address,
        amount: TokenAmount,
    },
    Unstaked {
        gauge: Address,
        amount: TokenAmount,
    },
    RewardsClaimed {
        gauge: Address,
        token: Address,
        amount: TokenAmount,
    },
    FeesClaimed {
        pool: Address,
        amount_a: TokenAmount,
        amount_b: TokenAmount,
    },
    AssetsRecovered {
        to: Address,
    },
}

/// An event with the time it was recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub at: DateTime<Utc>,
    pub event: AccountEvent,
}

/// Append-only in-memory log of account events.
#[derive(Debug)]
pub struct EventLog {
    inner: RwLock<Vec<RecordedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    pub async fn record(&self, event: AccountEvent) {
        debug!(event = ?event, "account event");
        self.inner.write().await.push(RecordedEvent {
            at: Utc::now(),
            event,
        });
    }

    pub async fn all(&self) -> Vec<RecordedEvent> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
