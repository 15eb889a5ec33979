//! Reward and fee claiming with balance-delta verification.
//!
//! The external distributor may not honor its own return-value
//! contract: a claim can revert, silently no-op, or succeed without
//! moving value. Every claim snapshots the relevant balances before
//! ceding control and treats the observed delta as the source of
//! truth, not any strategy's reported outcome.

use crate::account::{CustodyAccount, protocol_err};
use crate::events::AccountEvent;
use custody_domain::{Address, CustodyError, PoolKey, TokenAmount};
use custody_protocols::{
    AmmProtocol, ProtocolError, RewardDistributor, SELECTOR_GET_REWARD,
    SELECTOR_GET_REWARD_ACCOUNT,
};
use tracing::{debug, info};

/// Outcome of a successful reward claim. `amount` is the observed
/// reward-token balance delta; zero is a legitimate outcome when the
/// rewards were already harvested in the same settlement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardClaim {
    pub gauge: Address,
    pub reward_token: Address,
    pub amount: TokenAmount,
}

impl CustodyAccount {
    /// Claims staking rewards from the gauge of `pool`.
    ///
    /// Claim strategies are attempted in order (voter aggregator,
    /// direct gauge claim, then raw calls with the two conventional
    /// reward selectors), stopping at the first structural success.
    /// Success is then decided by the balance delta alone.
    pub async fn claim_rewards(
        &self,
        caller: Address,
        pool: Address,
    ) -> Result<RewardClaim, CustodyError> {
        self.auth.require(caller).await?;

        let gauge = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::NoGauge(pool))?;
        if !self.chain.rewards.is_alive(gauge).await.map_err(protocol_err)? {
            return Err(CustodyError::InvalidGaugeState(gauge));
        }

        // Skip the external call when the distributor itself reports
        // nothing to claim.
        let earned = self
            .chain
            .rewards
            .earned(gauge, self.address())
            .await
            .map_err(protocol_err)?;
        if earned.is_zero() {
            return Err(CustodyError::NoRewardsAvailable(gauge));
        }

        let reward_token = self
            .chain
            .rewards
            .reward_token(gauge)
            .await
            .map_err(protocol_err)?;
        let before = self.token_balance(reward_token).await?;

        let signaled = self.try_claim_strategies(gauge).await;

        let after = self.token_balance(reward_token).await?;
        let delta = after.saturating_sub(before);

        if delta.is_zero() && !signaled {
            return Err(CustodyError::GaugeClaimFailed(gauge));
        }

        self.events
            .record(AccountEvent::RewardsClaimed {
                gauge,
                token: reward_token,
                amount: delta,
            })
            .await;
        info!(
            account = ?self.address(),
            gauge = ?gauge,
            amount = %delta,
            "rewards claimed"
        );
        Ok(RewardClaim {
            gauge,
            reward_token,
            amount: delta,
        })
    }

    /// Runs the fallback chain; returns whether any strategy reported
    /// structural success. The report is advisory.
    async fn try_claim_strategies(&self, gauge: Address) -> bool {
        let account = self.address();

        match self.chain.rewards.claim_many(&[gauge], account).await {
            Ok(()) => return true,
            Err(error) => debug!(gauge = ?gauge, error = %error, "aggregator claim failed"),
        }
        match self.chain.rewards.claim(gauge, account).await {
            Ok(()) => return true,
            Err(error) => debug!(gauge = ?gauge, error = %error, "direct claim failed"),
        }
        for selector in [SELECTOR_GET_REWARD_ACCOUNT, SELECTOR_GET_REWARD] {
            match self.chain.rewards.raw_claim(gauge, selector, account).await {
                Ok(()) => return true,
                Err(error) => {
                    debug!(gauge = ?gauge, selector = ?selector, error = %error, "raw claim failed")
                }
            }
        }
        false
    }

    /// Earned rewards per the distributor's own accounting. Pre-flight
    /// only; a positive value is not a guarantee a claim will move it.
    pub async fn earned_rewards(&self, pool: Address) -> Result<TokenAmount, CustodyError> {
        let gauge = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::NoGauge(pool))?;
        self.chain
            .rewards
            .earned(gauge, self.address())
            .await
            .map_err(protocol_err)
    }

    /// Earned rewards, or zero when the pool has no live gauge. For
    /// callers deciding whether a claim is worth attempting.
    pub async fn claimable_rewards(&self, pool: Address) -> Result<TokenAmount, CustodyError> {
        let Some(gauge) = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
        else {
            return Ok(TokenAmount::zero());
        };
        if !self.chain.rewards.is_alive(gauge).await.map_err(protocol_err)? {
            return Ok(TokenAmount::zero());
        }
        self.chain
            .rewards
            .earned(gauge, self.address())
            .await
            .map_err(protocol_err)
    }

    /// Claims accrued trading fees on the pool for `key`. The reported
    /// amounts are the observed balance deltas of the two constituent
    /// tokens, not the external call's return values.
    pub async fn claim_fees(
        &self,
        caller: Address,
        key: &PoolKey,
    ) -> Result<(TokenAmount, TokenAmount), CustodyError> {
        self.auth.require(caller).await?;

        let pool = self
            .chain
            .amm
            .resolve_pool(key)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::PoolNotFound(*key))?;

        let before_a = self.token_balance(key.token_a).await?;
        let before_b = self.token_balance(key.token_b).await?;

        self.chain
            .amm
            .claim_fees(self.address(), pool)
            .await
            .map_err(|error| match error {
                ProtocolError::Revert(reason) => CustodyError::Protocol(reason),
                _ => CustodyError::FeeClaimFailed(pool),
            })?;

        let after_a = self.token_balance(key.token_a).await?;
        let after_b = self.token_balance(key.token_b).await?;
        let delta_a = after_a.saturating_sub(before_a);
        let delta_b = after_b.saturating_sub(before_b);

        self.events
            .record(AccountEvent::FeesClaimed {
                pool,
                amount_a: delta_a,
                amount_b: delta_b,
            })
            .await;
        info!(
            account = ?self.address(),
            pool = ?pool,
            amount_a = %delta_a,
            amount_b = %delta_b,
            "fees claimed"
        );
        Ok((delta_a, delta_b))
    }

    /// The protocol's own claimable-fee accounting for this account.
    /// Pre-flight only.
    pub async fn claimable_fees(
        &self,
        key: &PoolKey,
    ) -> Result<(TokenAmount, TokenAmount), CustodyError> {
        let pool = self
            .chain
            .amm
            .resolve_pool(key)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::PoolNotFound(*key))?;
        self.chain
            .amm
            .claimable_fees(pool, self.address())
            .await
            .map_err(protocol_err)
    }
}
