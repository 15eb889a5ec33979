//! Capability interfaces to the external AMM and reward-distribution
//! protocols, plus an in-memory reference backend.
//!
//! The engine never talks to the external system directly; everything
//! goes through the traits defined here. The external side is treated
//! as untrusted: calls may revert with uninformative errors or succeed
//! without moving value, so callers verify effects by re-reading
//! observable state rather than trusting return values.

pub mod amm;
pub mod distributor;
pub mod error;
pub mod ledger;
pub mod memory;

pub use amm::{AddLiquidityCall, AmmProtocol, LiquidityReceipt, RemoveLiquidityCall};
pub use distributor::{RewardDistributor, SELECTOR_GET_REWARD, SELECTOR_GET_REWARD_ACCOUNT};
pub use error::ProtocolError;
pub use ledger::TokenLedger;
pub use memory::MemoryChain;
