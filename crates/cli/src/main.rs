//! Command Line Interface for the custody engine.
//!
//! Runs the full position lifecycle against the in-memory reference
//! backend, and exposes the liquidity-quote planner for dry runs.
use anyhow::Result;
use clap::{Parser, Subcommand};
use custody_engine::prelude::*;
use custody_protocols::memory::MemoryChain;
use custody_protocols::{AddLiquidityCall, AmmProtocol, TokenLedger};
use dotenv::dotenv;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "custody-cli")]
#[command(about = "Delegated custody and AMM position management demo CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full lifecycle against the in-memory backend
    Demo {
        /// Token A the account deposits
        #[arg(long, default_value_t = 500_000)]
        amount_a: u64,

        /// Token B the account deposits
        #[arg(long, default_value_t = 500_000)]
        amount_b: u64,

        /// Rewards credited to the gauge before the claim
        #[arg(long, default_value_t = 1_250)]
        rewards: u64,
    },
    /// Plan contribution amounts against a reserve ratio
    Quote {
        /// Desired token A amount
        #[arg(long)]
        amount_a: u64,

        /// Desired token B amount
        #[arg(long)]
        amount_b: u64,

        /// Pool reserve of token A
        #[arg(long)]
        reserve_a: u64,

        /// Pool reserve of token B
        #[arg(long)]
        reserve_b: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            amount_a,
            amount_b,
            rewards,
        } => run_demo(amount_a, amount_b, rewards).await?,
        Commands::Quote {
            amount_a,
            amount_b,
            reserve_a,
            reserve_b,
        } => {
            let reserves = Some((TokenAmount::from(reserve_a), TokenAmount::from(reserve_b)));
            let (planned_a, planned_b) =
                plan_amounts(TokenAmount::from(amount_a), TokenAmount::from(amount_b), reserves);
            let config = LiquidityConfig::default();
            println!("planned amounts: A = {planned_a}, B = {planned_b}");
            println!(
                "minimums submitted: A = {}, B = {}",
                min_out(planned_a, &config),
                min_out(planned_b, &config)
            );
        }
    }

    Ok(())
}

async fn run_demo(amount_a: u64, amount_b: u64, rewards: u64) -> Result<()> {
    let chain = Arc::new(MemoryChain::new());
    let handles = ChainHandles {
        ledger: chain.clone(),
        amm: chain.clone(),
        rewards: chain.clone(),
    };
    let registry = CustodyRegistry::new(
        Address::from_low_u64_be(0xFAC),
        handles,
        LiquidityConfig::default(),
    );

    let owner = Address::from_low_u64_be(0x0A11CE);
    let account = registry.create_account(owner).await?;
    account
        .set_endpoints(owner, chain.router(), chain.factory())
        .await?;
    println!("✅ account {:?} created for {:?}", account.address(), owner);

    // Shape the external world: a seeded 1:50 pool with a live gauge.
    let token_a = chain.create_token().await;
    let token_b = chain.create_token().await;
    let key = PoolKey::volatile(token_a, token_b);
    let pool = chain.create_pool(key).await;

    let whale = Address::from_low_u64_be(0xBEEF);
    let (seed_a, seed_b) = (TokenAmount::from(1_000_000u64), TokenAmount::from(50_000_000u64));
    chain.mint(token_a, whale, seed_a).await;
    chain.mint(token_b, whale, seed_b).await;
    chain.approve(token_a, whale, chain.router(), seed_a).await?;
    chain.approve(token_b, whale, chain.router(), seed_b).await?;
    chain
        .add_liquidity(
            whale,
            AddLiquidityCall {
                key,
                amount_a: seed_a,
                amount_b: seed_b,
                amount_a_min: TokenAmount::zero(),
                amount_b_min: TokenAmount::zero(),
                to: whale,
                deadline: u64::MAX,
            },
        )
        .await?;

    let reward_token = chain.create_token().await;
    let gauge = chain.create_gauge(pool, reward_token).await;

    // Fund and provision.
    chain.mint(token_a, owner, TokenAmount::from(amount_a)).await;
    chain.mint(token_b, owner, TokenAmount::from(amount_b)).await;
    account.deposit(owner, token_a, TokenAmount::from(amount_a)).await?;
    account.deposit(owner, token_b, TokenAmount::from(amount_b)).await?;

    let receipt = account
        .add_liquidity(
            owner,
            AddLiquidityParams {
                key,
                amount_a_desired: TokenAmount::from(amount_a),
                amount_b_desired: TokenAmount::from(amount_b),
                amount_a_min: TokenAmount::zero(),
                amount_b_min: TokenAmount::zero(),
                deadline: u64::MAX,
            },
        )
        .await?;
    println!(
        "✅ provisioned {} / {} for {} pool shares",
        receipt.amount_a, receipt.amount_b, receipt.liquidity
    );

    // Stake, accrue, claim.
    account.stake(owner, pool, receipt.liquidity).await?;
    chain
        .credit_rewards(gauge, account.address(), TokenAmount::from(rewards))
        .await;
    let claim = account.claim_rewards(owner, pool).await?;
    println!("✅ claimed {} reward tokens (verified by balance delta)", claim.amount);

    // Unwind.
    let withdrawn = account.unstake(owner, pool, UNSTAKE_ALL).await?;
    let (out_a, out_b) = account
        .remove_liquidity(
            owner,
            RemoveLiquidityParams {
                key,
                liquidity: withdrawn,
                amount_a_min: TokenAmount::zero(),
                amount_b_min: TokenAmount::zero(),
                deadline: u64::MAX,
            },
        )
        .await?;
    println!("✅ unwound position: {out_a} / {out_b} returned to custody");

    println!("\nevent log:");
    for recorded in account.events().await {
        println!("  {} {:?}", recorded.at.format("%H:%M:%S%.3f"), recorded.event);
    }
    Ok(())
}
