use crate::error::ProtocolError;
use async_trait::async_trait;
use custody_domain::{Address, PoolKey, TokenAmount};

/// Parameters for a liquidity-provision call against the router.
#[derive(Debug, Clone)]
pub struct AddLiquidityCall {
    /// Pool the liquidity goes into.
    pub key: PoolKey,
    /// Token A amount to contribute.
    pub amount_a: TokenAmount,
    /// Token B amount to contribute.
    pub amount_b: TokenAmount,
    /// Minimum acceptable token A contribution.
    pub amount_a_min: TokenAmount,
    /// Minimum acceptable token B contribution.
    pub amount_b_min: TokenAmount,
    /// Recipient of the minted pool-share tokens.
    pub to: Address,
    /// Unix timestamp after which the router must reject the call.
    pub deadline: u64,
}

/// Parameters for a liquidity-removal call.
#[derive(Debug, Clone)]
pub struct RemoveLiquidityCall {
    pub key: PoolKey,
    /// Pool-share tokens to burn.
    pub liquidity: TokenAmount,
    pub amount_a_min: TokenAmount,
    pub amount_b_min: TokenAmount,
    /// Recipient of the withdrawn tokens.
    pub to: Address,
    pub deadline: u64,
}

/// Amounts the router reports for a successful provision. Advisory;
/// the account's pool-share balance is whatever the protocol now
/// reports, never tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityReceipt {
    pub amount_a: TokenAmount,
    pub amount_b: TokenAmount,
    pub liquidity: TokenAmount,
}

/// The external AMM's router/factory/pair surface.
///
/// The pool-share token of a pool is the pool address itself; holdings
/// are read through [`crate::TokenLedger::balance_of`] with the pool
/// address as the token.
#[async_trait]
pub trait AmmProtocol: Send + Sync {
    /// Resolves the pool for a pair and variant, if one exists.
    async fn resolve_pool(&self, key: &PoolKey) -> Result<Option<Address>, ProtocolError>;

    /// Current reserves in `(token_a, token_b)` order of `key`.
    /// `None` when the pool does not exist or has never been seeded.
    async fn reserves(
        &self,
        key: &PoolKey,
    ) -> Result<Option<(TokenAmount, TokenAmount)>, ProtocolError>;

    /// Submits a provision; tokens are pulled from `caller` under a
    /// previously granted allowance.
    async fn add_liquidity(
        &self,
        caller: Address,
        call: AddLiquidityCall,
    ) -> Result<LiquidityReceipt, ProtocolError>;

    /// Burns pool-share tokens pulled from `caller` and returns the
    /// withdrawn `(amount_a, amount_b)`.
    async fn remove_liquidity(
        &self,
        caller: Address,
        call: RemoveLiquidityCall,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError>;

    /// Claims accrued trading fees for `caller` on `pool`. The
    /// returned amounts are advisory.
    async fn claim_fees(
        &self,
        caller: Address,
        pool: Address,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError>;

    /// The protocol's own claimable-fee accounting for `account`.
    async fn claimable_fees(
        &self,
        pool: Address,
        account: Address,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError>;
}
