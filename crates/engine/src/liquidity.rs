//! Liquidity provisioning against the external AMM.
//!
//! Caller-desired amounts are recomputed against live pool reserves
//! before submission so a drifted reserve ratio does not cause
//! over-contribution of one side, and minimum-acceptable amounts are
//! floored at a fixed fraction of the recomputed amounts.

use crate::account::{CustodyAccount, protocol_err};
use crate::events::AccountEvent;
use custody_domain::{Address, CustodyError, PoolKey, TokenAmount};
use custody_protocols::{
    AddLiquidityCall, AmmProtocol, LiquidityReceipt, RemoveLiquidityCall, TokenLedger,
};
use primitive_types::{U256, U512};
use tracing::{debug, info};

/// Tunables for liquidity operations.
#[derive(Debug, Clone)]
pub struct LiquidityConfig {
    /// Pool-share amounts below this are not worth removing; removal
    /// short-circuits to a zero result.
    pub dust_threshold: TokenAmount,
    /// Minimum-acceptable amounts as a fraction of the recomputed
    /// optimal amounts. Deliberately overrides caller-supplied
    /// minimums so a stale quote does not trip the external slippage
    /// check.
    pub min_out_numerator: u64,
    pub min_out_denominator: u64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            dust_threshold: TokenAmount::from(1_000u64),
            min_out_numerator: 80,
            min_out_denominator: 100,
        }
    }
}

/// Caller-facing parameters for provisioning.
#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    pub key: PoolKey,
    pub amount_a_desired: TokenAmount,
    pub amount_b_desired: TokenAmount,
    /// Overridden by the configured floor; kept for surface parity
    /// with the router call shape.
    pub amount_a_min: TokenAmount,
    pub amount_b_min: TokenAmount,
    pub deadline: u64,
}

/// Caller-facing parameters for removal.
#[derive(Debug, Clone)]
pub struct RemoveLiquidityParams {
    pub key: PoolKey,
    pub liquidity: TokenAmount,
    pub amount_a_min: TokenAmount,
    pub amount_b_min: TokenAmount,
    pub deadline: u64,
}

fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let wide: U512 = a.full_mul(b) / U512::from(denominator);
    U256::try_from(wide).ok()
}

/// Recomputes the contribution pair against live reserves: hold
/// `desired_a` fixed and match `b = a * reserve_b / reserve_a`; if
/// that exceeds the caller's B budget, hold `desired_b` fixed and
/// match A instead. With no readable reserves the desired amounts are
/// used verbatim.
pub fn plan_amounts(
    desired_a: TokenAmount,
    desired_b: TokenAmount,
    reserves: Option<(TokenAmount, TokenAmount)>,
) -> (TokenAmount, TokenAmount) {
    let Some((reserve_a, reserve_b)) = reserves else {
        return (desired_a, desired_b);
    };
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return (desired_a, desired_b);
    }
    let Some(b_optimal) = mul_div(desired_a.0, reserve_b.0, reserve_a.0) else {
        return (desired_a, desired_b);
    };
    if b_optimal <= desired_b.0 {
        (desired_a, TokenAmount(b_optimal))
    } else {
        match mul_div(desired_b.0, reserve_a.0, reserve_b.0) {
            Some(a_optimal) => (TokenAmount(a_optimal), desired_b),
            None => (desired_a, desired_b),
        }
    }
}

/// Floor fraction of `amount` per the configured numerator and
/// denominator.
pub fn min_out(amount: TokenAmount, config: &LiquidityConfig) -> TokenAmount {
    mul_div(
        amount.0,
        U256::from(config.min_out_numerator),
        U256::from(config.min_out_denominator),
    )
    .map(TokenAmount)
    .unwrap_or(amount)
}

impl CustodyAccount {
    /// Provisions liquidity into the pool for `params.key`.
    ///
    /// The pool must already exist; liquidity is never provisioned
    /// into a pool that must first be created. On external failure the
    /// protocol's reason string is surfaced verbatim.
    pub async fn add_liquidity(
        &self,
        caller: Address,
        params: AddLiquidityParams,
    ) -> Result<LiquidityReceipt, CustodyError> {
        self.auth.require(caller).await?;
        let endpoints = self.require_endpoints().await?;

        let pool = self
            .chain
            .amm
            .resolve_pool(&params.key)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::PoolNotFound(params.key))?;

        let reserves = self.chain.amm.reserves(&params.key).await.map_err(protocol_err)?;
        let (amount_a, amount_b) =
            plan_amounts(params.amount_a_desired, params.amount_b_desired, reserves);
        let amount_a_min = min_out(amount_a, &self.liquidity_config);
        let amount_b_min = min_out(amount_b, &self.liquidity_config);

        debug!(
            pool = ?pool,
            amount_a = %amount_a,
            amount_b = %amount_b,
            "planned liquidity amounts"
        );

        self.approve_exact(params.key.token_a, endpoints.router, amount_a)
            .await?;
        self.approve_exact(params.key.token_b, endpoints.router, amount_b)
            .await?;

        let receipt = self
            .chain
            .amm
            .add_liquidity(
                self.address(),
                AddLiquidityCall {
                    key: params.key,
                    amount_a,
                    amount_b,
                    amount_a_min,
                    amount_b_min,
                    to: self.address(),
                    deadline: params.deadline,
                },
            )
            .await
            .map_err(protocol_err)?;

        self.events
            .record(AccountEvent::LiquidityAdded {
                pool,
                amount_a: receipt.amount_a,
                amount_b: receipt.amount_b,
                liquidity: receipt.liquidity,
            })
            .await;
        info!(
            account = ?self.address(),
            pool = ?pool,
            liquidity = %receipt.liquidity,
            "liquidity added"
        );
        Ok(receipt)
    }

    /// Removes liquidity from the pool for `params.key`.
    ///
    /// Requests below the dust threshold return a zero result without
    /// touching the external protocol; requests above the held
    /// pool-share balance are clamped to it.
    pub async fn remove_liquidity(
        &self,
        caller: Address,
        params: RemoveLiquidityParams,
    ) -> Result<(TokenAmount, TokenAmount), CustodyError> {
        self.auth.require(caller).await?;
        let endpoints = self.require_endpoints().await?;

        if params.liquidity < self.liquidity_config.dust_threshold {
            debug!(requested = %params.liquidity, "removal below dust threshold");
            return Ok((TokenAmount::zero(), TokenAmount::zero()));
        }

        let pool = self
            .chain
            .amm
            .resolve_pool(&params.key)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::PoolNotFound(params.key))?;

        let held = self.token_balance(pool).await?;
        let liquidity = params.liquidity.min(held);
        if liquidity < self.liquidity_config.dust_threshold {
            return Ok((TokenAmount::zero(), TokenAmount::zero()));
        }

        self.approve_exact(pool, endpoints.router, liquidity).await?;

        let (amount_a, amount_b) = self
            .chain
            .amm
            .remove_liquidity(
                self.address(),
                RemoveLiquidityCall {
                    key: params.key,
                    liquidity,
                    amount_a_min: params.amount_a_min,
                    amount_b_min: params.amount_b_min,
                    to: self.address(),
                    deadline: params.deadline,
                },
            )
            .await
            .map_err(protocol_err)?;

        self.events
            .record(AccountEvent::LiquidityRemoved {
                pool,
                amount_a,
                amount_b,
            })
            .await;
        info!(
            account = ?self.address(),
            pool = ?pool,
            liquidity = %liquidity,
            "liquidity removed"
        );
        Ok((amount_a, amount_b))
    }

    /// Pool-share balance for a position, re-derived from the external
    /// protocol on every query.
    pub async fn position_balance(&self, key: &PoolKey) -> Result<TokenAmount, CustodyError> {
        let pool = self
            .chain
            .amm
            .resolve_pool(key)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::PoolNotFound(*key))?;
        self.token_balance(pool).await
    }

    /// Grants the spender an allowance for exactly `amount`.
    /// Allowances granted before a failing external call are a known,
    /// accepted residual side effect.
    pub(crate) async fn approve_exact(
        &self,
        token: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        let ok = self
            .chain
            .ledger
            .approve(token, self.address(), spender, amount)
            .await
            .map_err(protocol_err)?;
        if !ok {
            return Err(CustodyError::TransferFailed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(v: u64) -> TokenAmount {
        TokenAmount::from(v)
    }

    #[test]
    fn test_plan_uses_desired_when_unseeded() {
        assert_eq!(plan_amounts(amt(10), amt(20), None), (amt(10), amt(20)));
        assert_eq!(
            plan_amounts(amt(10), amt(20), Some((amt(0), amt(5)))),
            (amt(10), amt(20))
        );
    }

    #[test]
    fn test_plan_holds_a_fixed_when_b_fits_budget() {
        // Reserve ratio 1:2; matching B for A=10 is 20, within budget.
        let planned = plan_amounts(amt(10), amt(30), Some((amt(100), amt(200))));
        assert_eq!(planned, (amt(10), amt(20)));
    }

    #[test]
    fn test_plan_clamps_to_b_budget() {
        // Matching B for A=10 would be 40, over the caller's 30; hold
        // B fixed and recompute A = 30 * 100 / 400 = 7.
        let planned = plan_amounts(amt(10), amt(30), Some((amt(100), amt(400))));
        assert_eq!(planned, (amt(7), amt(30)));
    }

    #[test]
    fn test_plan_one_to_fifty_scenario() {
        // 0.5 USDC (6 decimals) and 1 AERO (18 decimals would not fit
        // u64; scaled units), reserves at 1:50. Matching AERO for the
        // full USDC budget is 25, over the 1 AERO held, so the AERO
        // budget is held fixed and USDC recomputed: 1 * 1/50 = 0.02.
        let usdc = amt(500_000); // 0.5 in 6-decimal units
        let aero = amt(1_000_000); // 1.0 in the same scale
        let reserves = Some((amt(10_000_000), amt(500_000_000))); // 1:50

        let (planned_usdc, planned_aero) = plan_amounts(usdc, aero, reserves);
        assert_eq!(planned_aero, aero);
        assert_eq!(planned_usdc, amt(20_000)); // 0.02
    }

    #[test]
    fn test_min_out_is_configured_fraction() {
        let config = LiquidityConfig::default();
        assert_eq!(min_out(amt(100), &config), amt(80));
        assert_eq!(min_out(amt(0), &config), amt(0));
        // Floor division.
        assert_eq!(min_out(amt(13), &config), amt(10));
    }
}
