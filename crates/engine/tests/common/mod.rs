//! Shared fixture: a custody account wired to an in-memory external
//! system with one seeded volatile pool and a live gauge.

use custody_engine::prelude::*;
use custody_protocols::memory::MemoryChain;
use custody_protocols::{AddLiquidityCall, AmmProtocol, TokenLedger};
use std::sync::Arc;

#[allow(dead_code)]
pub struct Fixture {
    pub chain: Arc<MemoryChain>,
    pub registry: Arc<CustodyRegistry>,
    pub account: Arc<CustodyAccount>,
    pub owner: Address,
    pub key: PoolKey,
    pub pool: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub reward_token: Address,
    pub gauge: Address,
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(0xE000_0000 + n)
}

pub fn amt(v: u64) -> TokenAmount {
    TokenAmount::from(v)
}

/// Seeds the pool at a 1:50 reserve ratio (token_a:token_b = 1_000_000
/// : 50_000_000) from an unrelated whale, creates the gauge, and funds
/// the custody account with 500_000 of each token.
pub async fn fixture() -> Fixture {
    let chain = Arc::new(MemoryChain::new());
    let handles = ChainHandles {
        ledger: chain.clone(),
        amm: chain.clone(),
        rewards: chain.clone(),
    };
    let registry = CustodyRegistry::new(addr(0xFAC), handles, LiquidityConfig::default());

    let owner = addr(1);
    let account = registry.create_account(owner).await.unwrap();
    account
        .set_endpoints(owner, chain.router(), chain.factory())
        .await
        .unwrap();

    let token_a = chain.create_token().await;
    let token_b = chain.create_token().await;
    let key = PoolKey::volatile(token_a, token_b);
    let pool = chain.create_pool(key).await;

    let whale = addr(0xBEEF);
    chain.mint(token_a, whale, amt(1_000_000)).await;
    chain.mint(token_b, whale, amt(50_000_000)).await;
    chain
        .approve(token_a, whale, chain.router(), amt(1_000_000))
        .await
        .unwrap();
    chain
        .approve(token_b, whale, chain.router(), amt(50_000_000))
        .await
        .unwrap();
    chain
        .add_liquidity(
            whale,
            AddLiquidityCall {
                key,
                amount_a: amt(1_000_000),
                amount_b: amt(50_000_000),
                amount_a_min: TokenAmount::zero(),
                amount_b_min: TokenAmount::zero(),
                to: whale,
                deadline: u64::MAX,
            },
        )
        .await
        .unwrap();

    let reward_token = chain.create_token().await;
    let gauge = chain.create_gauge(pool, reward_token).await;

    chain.mint(token_a, owner, amt(500_000)).await;
    chain.mint(token_b, owner, amt(500_000)).await;
    account.deposit(owner, token_a, amt(500_000)).await.unwrap();
    account.deposit(owner, token_b, amt(500_000)).await.unwrap();

    Fixture {
        chain,
        registry,
        account,
        owner,
        key,
        pool,
        token_a,
        token_b,
        reward_token,
        gauge,
    }
}

/// Adds liquidity from the account's full token_a budget and stakes
/// everything, returning the staked pool-share amount.
pub async fn provision_and_stake(fx: &Fixture) -> TokenAmount {
    fx.account
        .add_liquidity(
            fx.owner,
            AddLiquidityParams {
                key: fx.key,
                amount_a_desired: amt(10_000),
                amount_b_desired: amt(500_000),
                amount_a_min: TokenAmount::zero(),
                amount_b_min: TokenAmount::zero(),
                deadline: u64::MAX,
            },
        )
        .await
        .unwrap();
    let held = fx.account.position_balance(&fx.key).await.unwrap();
    fx.account.stake(fx.owner, fx.pool, held).await.unwrap();
    held
}
