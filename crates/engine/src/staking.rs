//! Gauge stake/unstake lifecycle.
//!
//! A staked position has no independent lifecycle: it appears when a
//! stake succeeds and disappears when the gauge balance reaches zero.

use crate::account::{CustodyAccount, protocol_err};
use crate::events::AccountEvent;
use custody_domain::{Address, CustodyError, TokenAmount};
use custody_protocols::RewardDistributor;
use primitive_types::U256;
use tracing::info;

/// Sentinel meaning "unstake everything"; resolved to the
/// gauge-reported staked balance at call time.
pub const UNSTAKE_ALL: TokenAmount = TokenAmount(U256::MAX);

impl CustodyAccount {
    /// Stakes `amount` pool-share tokens of `pool` into its gauge.
    pub async fn stake(
        &self,
        caller: Address,
        pool: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Err(CustodyError::ZeroAmount);
        }
        self.auth.require(caller).await?;

        let gauge = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::NoGauge(pool))?;
        if !self.chain.rewards.is_alive(gauge).await.map_err(protocol_err)? {
            return Err(CustodyError::GaugeInactive(gauge));
        }

        let held = self.token_balance(pool).await?;
        if held < amount {
            return Err(CustodyError::InsufficientBalance {
                available: held,
                requested: amount,
            });
        }

        self.approve_exact(pool, gauge, amount).await?;
        self.chain
            .rewards
            .deposit(gauge, self.address(), amount)
            .await
            .map_err(protocol_err)?;

        self.events
            .record(AccountEvent::Staked { gauge, amount })
            .await;
        info!(account = ?self.address(), gauge = ?gauge, amount = %amount, "staked");
        Ok(())
    }

    /// Unstakes from the gauge of `pool`, returning pool-share tokens
    /// to the account. Pass [`UNSTAKE_ALL`] to withdraw the full
    /// staked balance. Returns the amount actually withdrawn.
    pub async fn unstake(
        &self,
        caller: Address,
        pool: Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount, CustodyError> {
        self.auth.require(caller).await?;

        let gauge = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::NoGauge(pool))?;

        let amount = if amount == UNSTAKE_ALL {
            self.chain
                .rewards
                .staked_balance(gauge, self.address())
                .await
                .map_err(protocol_err)?
        } else {
            amount
        };
        if amount.is_zero() {
            return Err(CustodyError::NothingStaked(gauge));
        }

        self.chain
            .rewards
            .withdraw(gauge, self.address(), amount)
            .await
            .map_err(protocol_err)?;

        self.events
            .record(AccountEvent::Unstaked { gauge, amount })
            .await;
        info!(account = ?self.address(), gauge = ?gauge, amount = %amount, "unstaked");
        Ok(amount)
    }

    /// Gauge registered for `pool`, if any.
    pub async fn gauge_for(&self, pool: Address) -> Result<Option<Address>, CustodyError> {
        self.chain.rewards.gauge_for(pool).await.map_err(protocol_err)
    }

    /// Pool-share tokens this account has staked in the gauge of
    /// `pool`.
    pub async fn staked_balance(&self, pool: Address) -> Result<TokenAmount, CustodyError> {
        let gauge = self
            .chain
            .rewards
            .gauge_for(pool)
            .await
            .map_err(protocol_err)?
            .ok_or(CustodyError::NoGauge(pool))?;
        self.chain
            .rewards
            .staked_balance(gauge, self.address())
            .await
            .map_err(protocol_err)
    }
}
