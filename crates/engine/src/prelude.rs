//! Convenient re-exports of the engine's public surface.

pub use crate::account::{ChainHandles, CustodyAccount, ProtocolEndpoints};
pub use crate::auth::AuthorizationLedger;
pub use crate::claims::RewardClaim;
pub use crate::events::{AccountEvent, EventLog, RecordedEvent};
pub use crate::liquidity::{
    AddLiquidityParams, LiquidityConfig, RemoveLiquidityParams, min_out, plan_amounts,
};
pub use crate::registry::{CustodyRegistry, DelegateIndex};
pub use crate::staking::UNSTAKE_ALL;
pub use custody_domain::{Address, CustodyError, PoolKey, PoolVariant, TokenAmount};
