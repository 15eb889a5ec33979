//! Reward and fee claiming: fallback-strategy chain, delta-based
//! verification, and zero-amount success semantics.

mod common;

use common::{amt, fixture, provision_and_stake};
use custody_engine::prelude::*;
use custody_protocols::memory::ClaimSupport;

#[tokio::test]
async fn test_claim_reports_observed_delta() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(55)).await;

    let claim = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(claim.gauge, fx.gauge);
    assert_eq!(claim.reward_token, fx.reward_token);
    assert_eq!(claim.amount, amt(55));
    assert_eq!(
        fx.account.token_balance(fx.reward_token).await.unwrap(),
        amt(55)
    );
}

#[tokio::test]
async fn test_claim_with_no_accrual_fails_fast() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;

    let err = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap_err();
    assert_eq!(err, CustodyError::NoRewardsAvailable(fx.gauge));
}

#[tokio::test]
async fn test_repeat_claim_in_same_window_is_zero_amount_success() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;

    // The gauge's accounting keeps reporting the credited amount for
    // the rest of the settlement window.
    fx.chain.set_sticky_earned(fx.gauge, true).await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(55)).await;

    let first = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(first.amount, amt(55));

    // Second call: the claim signals success but nothing moves; the
    // engine reports a zero-amount success, not a failure.
    let second = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(second.amount, TokenAmount::zero());
}

#[tokio::test]
async fn test_claim_falls_back_to_direct_then_raw() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;

    // Aggregator unavailable: the direct claim succeeds.
    fx.chain
        .set_claim_support(
            fx.gauge,
            ClaimSupport {
                aggregator: false,
                ..ClaimSupport::default()
            },
        )
        .await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(10)).await;
    let claim = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(claim.amount, amt(10));

    // Both typed interfaces unavailable: raw getReward(address).
    fx.chain
        .set_claim_support(
            fx.gauge,
            ClaimSupport {
                aggregator: false,
                direct: false,
                raw_account: true,
                raw_no_arg: false,
            },
        )
        .await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(20)).await;
    let claim = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(claim.amount, amt(20));

    // Only the zero-argument selector is honored.
    fx.chain
        .set_claim_support(
            fx.gauge,
            ClaimSupport {
                aggregator: false,
                direct: false,
                raw_account: false,
                raw_no_arg: true,
            },
        )
        .await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(30)).await;
    let claim = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(claim.amount, amt(30));
}

#[tokio::test]
async fn test_claim_fails_when_no_strategy_lands_and_no_delta() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;

    fx.chain
        .set_claim_support(
            fx.gauge,
            ClaimSupport {
                aggregator: false,
                direct: false,
                raw_account: false,
                raw_no_arg: false,
            },
        )
        .await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(5)).await;

    let err = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap_err();
    assert_eq!(err, CustodyError::GaugeClaimFailed(fx.gauge));
}

#[tokio::test]
async fn test_silent_noop_claim_is_detected_as_zero_success() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;

    // The gauge reports success from every entry point but moves no
    // value. The delta check converts this into a zero-amount success
    // rather than trusting the reported outcome.
    fx.chain.set_silent_noop(fx.gauge, true).await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(40)).await;

    let claim = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap();
    assert_eq!(claim.amount, TokenAmount::zero());
    assert_eq!(
        fx.account.token_balance(fx.reward_token).await.unwrap(),
        TokenAmount::zero()
    );
}

#[tokio::test]
async fn test_claim_requires_live_gauge() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;
    fx.chain.set_gauge_alive(fx.gauge, false).await;

    let err = fx.account.claim_rewards(fx.owner, fx.pool).await.unwrap_err();
    assert_eq!(err, CustodyError::InvalidGaugeState(fx.gauge));
}

#[tokio::test]
async fn test_claimable_rewards_is_zero_for_dead_or_missing_gauge() {
    let fx = fixture().await;
    provision_and_stake(&fx).await;
    fx.chain.credit_rewards(fx.gauge, fx.account.address(), amt(12)).await;

    assert_eq!(fx.account.claimable_rewards(fx.pool).await.unwrap(), amt(12));
    assert_eq!(fx.account.earned_rewards(fx.pool).await.unwrap(), amt(12));

    fx.chain.set_gauge_alive(fx.gauge, false).await;
    assert_eq!(
        fx.account.claimable_rewards(fx.pool).await.unwrap(),
        TokenAmount::zero()
    );

    let bare = fx.chain.create_pool(PoolKey::stable(fx.token_a, fx.token_b)).await;
    assert_eq!(
        fx.account.claimable_rewards(bare).await.unwrap(),
        TokenAmount::zero()
    );
    let err = fx.account.earned_rewards(bare).await.unwrap_err();
    assert_eq!(err, CustodyError::NoGauge(bare));
}

#[tokio::test]
async fn test_claim_fees_reports_deltas() {
    let fx = fixture().await;
    fx.chain
        .credit_fees(fx.pool, fx.account.address(), amt(7), amt(3))
        .await;

    assert_eq!(
        fx.account.claimable_fees(&fx.key).await.unwrap(),
        (amt(7), amt(3))
    );

    let before_a = fx.account.token_balance(fx.token_a).await.unwrap();
    let (fee_a, fee_b) = fx.account.claim_fees(fx.owner, &fx.key).await.unwrap();
    assert_eq!((fee_a, fee_b), (amt(7), amt(3)));

    let after_a = fx.account.token_balance(fx.token_a).await.unwrap();
    assert_eq!(after_a.saturating_sub(before_a), amt(7));
}

#[tokio::test]
async fn test_claim_fees_with_nothing_claimable_succeeds_with_zero() {
    let fx = fixture().await;
    let (fee_a, fee_b) = fx.account.claim_fees(fx.owner, &fx.key).await.unwrap();
    assert_eq!((fee_a, fee_b), (TokenAmount::zero(), TokenAmount::zero()));
}

#[tokio::test]
async fn test_claim_fees_unknown_pool() {
    let fx = fixture().await;
    let missing = PoolKey::stable(fx.token_a, fx.token_b);
    let err = fx.account.claim_fees(fx.owner, &missing).await.unwrap_err();
    assert_eq!(err, CustodyError::PoolNotFound(missing));

    let err = fx.account.claimable_fees(&missing).await.unwrap_err();
    assert_eq!(err, CustodyError::PoolNotFound(missing));
}
