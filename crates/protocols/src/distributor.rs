use crate::error::ProtocolError;
use async_trait::async_trait;
use custody_domain::{Address, TokenAmount};

/// Conventional selector for `getReward(address)` on
/// Synthetix-lineage reward contracts.
pub const SELECTOR_GET_REWARD_ACCOUNT: [u8; 4] = [0xc0, 0x00, 0x07, 0xb0];

/// Conventional selector for the zero-argument `getReward()`.
pub const SELECTOR_GET_REWARD: [u8; 4] = [0x3d, 0x18, 0xb9, 0x12];

/// The external voter/gauge surface.
///
/// None of the claim entry points reliably report whether value moved;
/// a claim can revert, silently no-op, or succeed. Callers must verify
/// by reward-token balance delta.
#[async_trait]
pub trait RewardDistributor: Send + Sync {
    /// Gauge registered for `pool`, if any. A non-null gauge does not
    /// imply liveness.
    async fn gauge_for(&self, pool: Address) -> Result<Option<Address>, ProtocolError>;

    /// Whether the voter considers the gauge live.
    async fn is_alive(&self, gauge: Address) -> Result<bool, ProtocolError>;

    /// Stakes pool-share tokens pulled from `account` under a
    /// previously granted allowance.
    async fn deposit(
        &self,
        gauge: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<(), ProtocolError>;

    /// Withdraws staked pool-share tokens back to `account`.
    async fn withdraw(
        &self,
        gauge: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<(), ProtocolError>;

    /// Pool-share tokens `account` currently has staked in `gauge`.
    async fn staked_balance(
        &self,
        gauge: Address,
        account: Address,
    ) -> Result<TokenAmount, ProtocolError>;

    /// Earned-but-unclaimed reward accounting. Pre-flight only; never
    /// a post-claim verification source.
    async fn earned(&self, gauge: Address, account: Address) -> Result<TokenAmount, ProtocolError>;

    /// The token the gauge pays rewards in.
    async fn reward_token(&self, gauge: Address) -> Result<Address, ProtocolError>;

    /// Protocol-level aggregator that claims across many gauges.
    async fn claim_many(&self, gauges: &[Address], account: Address) -> Result<(), ProtocolError>;

    /// Direct per-gauge claim entry point.
    async fn claim(&self, gauge: Address, account: Address) -> Result<(), ProtocolError>;

    /// Raw low-level call with an explicit selector, for gauges whose
    /// typed interfaces are unavailable or revert.
    async fn raw_claim(
        &self,
        gauge: Address,
        selector: [u8; 4],
        account: Address,
    ) -> Result<(), ProtocolError>;
}
