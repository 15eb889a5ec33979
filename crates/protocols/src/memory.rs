//! In-memory reference backend implementing all three capability
//! traits over constant-product pools.
//!
//! Used as the substrate for integration tests and the CLI demo. The
//! claim paths carry fault-injection switches so tests can exercise
//! every fallback strategy, including gauges that report success
//! without moving value.

use crate::amm::{AddLiquidityCall, AmmProtocol, LiquidityReceipt, RemoveLiquidityCall};
use crate::distributor::{RewardDistributor, SELECTOR_GET_REWARD, SELECTOR_GET_REWARD_ACCOUNT};
use crate::error::ProtocolError;
use crate::ledger::TokenLedger;
use async_trait::async_trait;
use custody_domain::{Address, PoolKey, TokenAmount};
use primitive_types::{U256, U512};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Which claim entry points a gauge honors.
#[derive(Debug, Clone, Copy)]
pub struct ClaimSupport {
    /// Honors the voter-level aggregator.
    pub aggregator: bool,
    /// Honors the typed per-gauge claim.
    pub direct: bool,
    /// Honors raw `getReward(address)`.
    pub raw_account: bool,
    /// Honors raw `getReward()`.
    pub raw_no_arg: bool,
}

impl Default for ClaimSupport {
    fn default() -> Self {
        Self {
            aggregator: true,
            direct: true,
            raw_account: true,
            raw_no_arg: true,
        }
    }
}

#[derive(Debug)]
struct PoolState {
    address: Address,
    key: PoolKey,
    reserve_a: U256,
    reserve_b: U256,
    total_supply: U256,
    /// Claimable trading fees per account, in (token_a, token_b).
    fees_owed: HashMap<Address, (U256, U256)>,
}

#[derive(Debug)]
struct GaugeState {
    pool: Address,
    alive: bool,
    reward_token: Address,
    staked: HashMap<Address, U256>,
    rewards_owed: HashMap<Address, U256>,
    /// What `earned` reports; normally tracks `rewards_owed` but can
    /// lag it when the gauge's accounting is sticky.
    earned_view: HashMap<Address, U256>,
    support: ClaimSupport,
    /// Claim entry points return Ok but move no value.
    silent_noop: bool,
    /// `earned` keeps reporting the last credited value after a
    /// settlement, as real gauges do within one settlement window.
    sticky_earned: bool,
}

#[derive(Debug, Default)]
struct ChainState {
    native: HashMap<Address, U256>,
    /// token -> holder -> balance.
    tokens: HashMap<Address, HashMap<Address, U256>>,
    /// (token, owner, spender) -> remaining allowance.
    allowances: HashMap<(Address, Address, Address), U256>,
    pools: HashMap<PoolKey, PoolState>,
    pools_by_addr: HashMap<Address, PoolKey>,
    gauges: HashMap<Address, GaugeState>,
    gauge_by_pool: HashMap<Address, Address>,
    timestamp: u64,
    next_id: u64,
}

/// One struct standing in for the whole external system: token
/// contracts, AMM router/factory/pairs, and voter/gauges.
pub struct MemoryChain {
    router: Address,
    factory: Address,
    state: RwLock<ChainState>,
}

impl MemoryChain {
    pub fn new() -> Self {
        let mut state = ChainState {
            next_id: 0x1000,
            ..Default::default()
        };
        let router = Self::alloc(&mut state);
        let factory = Self::alloc(&mut state);
        Self {
            router,
            factory,
            state: RwLock::new(state),
        }
    }

    /// Router endpoint address; the spender the engine approves for
    /// liquidity operations.
    pub fn router(&self) -> Address {
        self.router
    }

    /// Factory endpoint address.
    pub fn factory(&self) -> Address {
        self.factory
    }

    fn alloc(state: &mut ChainState) -> Address {
        let addr = Address::from_low_u64_be(state.next_id);
        state.next_id += 1;
        addr
    }

    // Administrative surface used by tests and the demo to shape the
    // external world.

    pub async fn create_token(&self) -> Address {
        let mut state = self.state.write().await;
        let token = Self::alloc(&mut state);
        state.tokens.insert(token, HashMap::new());
        token
    }

    pub async fn mint(&self, token: Address, to: Address, amount: TokenAmount) {
        let mut state = self.state.write().await;
        *state
            .tokens
            .entry(token)
            .or_default()
            .entry(to)
            .or_default() += amount.0;
    }

    pub async fn mint_native(&self, to: Address, amount: TokenAmount) {
        let mut state = self.state.write().await;
        *state.native.entry(to).or_default() += amount.0;
    }

    pub async fn create_pool(&self, key: PoolKey) -> Address {
        let key = key.canonical();
        let mut state = self.state.write().await;
        if let Some(pool) = state.pools.get(&key) {
            return pool.address;
        }
        let address = Self::alloc(&mut state);
        state.tokens.insert(address, HashMap::new());
        state.pools.insert(
            key,
            PoolState {
                address,
                key,
                reserve_a: U256::zero(),
                reserve_b: U256::zero(),
                total_supply: U256::zero(),
                fees_owed: HashMap::new(),
            },
        );
        state.pools_by_addr.insert(address, key);
        debug!(pool = ?address, "created pool");
        address
    }

    pub async fn create_gauge(&self, pool: Address, reward_token: Address) -> Address {
        let mut state = self.state.write().await;
        let gauge = Self::alloc(&mut state);
        state.gauges.insert(
            gauge,
            GaugeState {
                pool,
                alive: true,
                reward_token,
                staked: HashMap::new(),
                rewards_owed: HashMap::new(),
                earned_view: HashMap::new(),
                support: ClaimSupport::default(),
                silent_noop: false,
                sticky_earned: false,
            },
        );
        state.gauge_by_pool.insert(pool, gauge);
        gauge
    }

    pub async fn set_gauge_alive(&self, gauge: Address, alive: bool) {
        if let Some(g) = self.state.write().await.gauges.get_mut(&gauge) {
            g.alive = alive;
        }
    }

    pub async fn set_claim_support(&self, gauge: Address, support: ClaimSupport) {
        if let Some(g) = self.state.write().await.gauges.get_mut(&gauge) {
            g.support = support;
        }
    }

    pub async fn set_silent_noop(&self, gauge: Address, silent: bool) {
        if let Some(g) = self.state.write().await.gauges.get_mut(&gauge) {
            g.silent_noop = silent;
        }
    }

    pub async fn set_sticky_earned(&self, gauge: Address, sticky: bool) {
        if let Some(g) = self.state.write().await.gauges.get_mut(&gauge) {
            g.sticky_earned = sticky;
        }
    }

    /// Credits earned-but-unclaimed rewards, as accrual would.
    pub async fn credit_rewards(&self, gauge: Address, account: Address, amount: TokenAmount) {
        if let Some(g) = self.state.write().await.gauges.get_mut(&gauge) {
            *g.rewards_owed.entry(account).or_default() += amount.0;
            *g.earned_view.entry(account).or_default() += amount.0;
        }
    }

    /// Credits claimable trading fees on a pool for an account.
    pub async fn credit_fees(
        &self,
        pool: Address,
        account: Address,
        fee_a: TokenAmount,
        fee_b: TokenAmount,
    ) {
        let mut state = self.state.write().await;
        if let Some(key) = state.pools_by_addr.get(&pool).copied()
            && let Some(p) = state.pools.get_mut(&key)
        {
            let owed = p.fees_owed.entry(account).or_default();
            owed.0 += fee_a.0;
            owed.1 += fee_b.0;
        }
    }

    pub async fn set_timestamp(&self, timestamp: u64) {
        self.state.write().await.timestamp = timestamp;
    }

    fn spend_allowance(
        state: &mut ChainState,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let entry = state
            .allowances
            .get_mut(&(token, owner, spender))
            .filter(|a| **a >= amount)
            .ok_or_else(|| ProtocolError::revert("insufficient allowance"))?;
        *entry -= amount;
        Ok(())
    }

    fn move_tokens(
        state: &mut ChainState,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let balances = state
            .tokens
            .get_mut(&token)
            .ok_or(ProtocolError::UnknownToken(token))?;
        let from_balance = balances.entry(from).or_default();
        if *from_balance < amount {
            return Err(ProtocolError::revert("transfer amount exceeds balance"));
        }
        *from_balance -= amount;
        *balances.entry(to).or_default() += amount;
        Ok(())
    }

    /// Babylonian integer square root, for first-provision minting.
    fn sqrt(x: U256) -> U256 {
        if x.is_zero() {
            return U256::zero();
        }
        let mut z = (x + U256::one()) / 2;
        let mut y = x;
        while z < y {
            y = z;
            z = (x / z + z) / 2;
        }
        y
    }

    fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, ProtocolError> {
        let wide: U512 = a.full_mul(b) / U512::from(denominator);
        U256::try_from(wide).map_err(|_| ProtocolError::revert("arithmetic overflow"))
    }

    /// Pays out and clears rewards owed to `account` on `gauge`,
    /// respecting the silent no-op switch. Returns whether the call
    /// should report success.
    fn settle_rewards(state: &mut ChainState, gauge: Address, account: Address) -> bool {
        let Some(g) = state.gauges.get_mut(&gauge) else {
            return false;
        };
        if g.silent_noop {
            return true;
        }
        let owed = g.rewards_owed.remove(&account).unwrap_or_default();
        if !g.sticky_earned {
            g.earned_view.remove(&account);
        }
        let reward_token = g.reward_token;
        if !owed.is_zero() {
            *state
                .tokens
                .entry(reward_token)
                .or_default()
                .entry(account)
                .or_default() += owed;
        }
        true
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenLedger for MemoryChain {
    async fn balance_of(
        &self,
        token: Address,
        holder: Address,
    ) -> Result<TokenAmount, ProtocolError> {
        let state = self.state.read().await;
        let balances = state
            .tokens
            .get(&token)
            .ok_or(ProtocolError::UnknownToken(token))?;
        Ok(TokenAmount(
            balances.get(&holder).copied().unwrap_or_default(),
        ))
    }

    async fn native_balance(&self, holder: Address) -> Result<TokenAmount, ProtocolError> {
        let state = self.state.read().await;
        Ok(TokenAmount(
            state.native.get(&holder).copied().unwrap_or_default(),
        ))
    }

    async fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError> {
        let mut state = self.state.write().await;
        match Self::move_tokens(&mut state, token, from, to, amount.0) {
            Ok(()) => Ok(true),
            Err(ProtocolError::UnknownToken(t)) => Err(ProtocolError::UnknownToken(t)),
            Err(_) => Ok(false),
        }
    }

    async fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError> {
        let mut state = self.state.write().await;
        let from_balance = state.native.entry(from).or_default();
        if *from_balance < amount.0 {
            return Ok(false);
        }
        *from_balance -= amount.0;
        *state.native.entry(to).or_default() += amount.0;
        Ok(true)
    }

    async fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError> {
        let mut state = self.state.write().await;
        if !state.tokens.contains_key(&token) {
            return Err(ProtocolError::UnknownToken(token));
        }
        state.allowances.insert((token, owner, spender), amount.0);
        Ok(true)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<TokenAmount, ProtocolError> {
        let state = self.state.read().await;
        Ok(TokenAmount(
            state
                .allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl AmmProtocol for MemoryChain {
    async fn resolve_pool(&self, key: &PoolKey) -> Result<Option<Address>, ProtocolError> {
        let state = self.state.read().await;
        Ok(state.pools.get(&key.canonical()).map(|p| p.address))
    }

    async fn reserves(
        &self,
        key: &PoolKey,
    ) -> Result<Option<(TokenAmount, TokenAmount)>, ProtocolError> {
        let canonical = key.canonical();
        let state = self.state.read().await;
        let Some(pool) = state.pools.get(&canonical) else {
            return Ok(None);
        };
        if pool.total_supply.is_zero() {
            return Ok(None);
        }
        // Reserves are stored in canonical token order; report them in
        // the caller's order.
        let (ra, rb) = if key.token_a == canonical.token_a {
            (pool.reserve_a, pool.reserve_b)
        } else {
            (pool.reserve_b, pool.reserve_a)
        };
        Ok(Some((TokenAmount(ra), TokenAmount(rb))))
    }

    async fn add_liquidity(
        &self,
        caller: Address,
        call: AddLiquidityCall,
    ) -> Result<LiquidityReceipt, ProtocolError> {
        let canonical = call.key.canonical();
        let flipped = call.key.token_a != canonical.token_a;
        let mut state = self.state.write().await;

        if call.deadline < state.timestamp {
            return Err(ProtocolError::revert("expired"));
        }
        let pool_addr = state
            .pools
            .get(&canonical)
            .map(|p| p.address)
            .ok_or_else(|| ProtocolError::revert("pool does not exist"))?;

        // Desired/min amounts in canonical order.
        let (desired_a, desired_b, min_a, min_b) = if flipped {
            (call.amount_b.0, call.amount_a.0, call.amount_b_min.0, call.amount_a_min.0)
        } else {
            (call.amount_a.0, call.amount_b.0, call.amount_a_min.0, call.amount_b_min.0)
        };

        let pool = state.pools.get(&canonical).expect("pool resolved above");
        let (reserve_a, reserve_b, total_supply) =
            (pool.reserve_a, pool.reserve_b, pool.total_supply);

        // Router-side optimal amounts, same shape as the engine's own
        // planning: hold one side fixed, match the other to reserves.
        let (amount_a, amount_b) = if total_supply.is_zero() {
            (desired_a, desired_b)
        } else {
            let b_optimal = Self::mul_div(desired_a, reserve_b, reserve_a)?;
            if b_optimal <= desired_b {
                if b_optimal < min_b {
                    return Err(ProtocolError::revert("insufficient b amount"));
                }
                (desired_a, b_optimal)
            } else {
                let a_optimal = Self::mul_div(desired_b, reserve_a, reserve_b)?;
                if a_optimal < min_a {
                    return Err(ProtocolError::revert("insufficient a amount"));
                }
                (a_optimal, desired_b)
            }
        };

        Self::spend_allowance(&mut state, canonical.token_a, caller, self.router, amount_a)?;
        Self::spend_allowance(&mut state, canonical.token_b, caller, self.router, amount_b)?;
        Self::move_tokens(&mut state, canonical.token_a, caller, pool_addr, amount_a)?;
        Self::move_tokens(&mut state, canonical.token_b, caller, pool_addr, amount_b)?;

        let liquidity = if total_supply.is_zero() {
            Self::sqrt(amount_a.checked_mul(amount_b).unwrap_or(U256::MAX))
        } else {
            Self::mul_div(amount_a, total_supply, reserve_a)?
                .min(Self::mul_div(amount_b, total_supply, reserve_b)?)
        };
        if liquidity.is_zero() {
            return Err(ProtocolError::revert("insufficient liquidity minted"));
        }

        let pool = state.pools.get_mut(&canonical).expect("pool resolved above");
        pool.reserve_a += amount_a;
        pool.reserve_b += amount_b;
        pool.total_supply += liquidity;
        *state
            .tokens
            .entry(pool_addr)
            .or_default()
            .entry(call.to)
            .or_default() += liquidity;

        debug!(pool = ?pool_addr, liquidity = %liquidity, "minted liquidity");

        let (amount_a, amount_b) = if flipped {
            (amount_b, amount_a)
        } else {
            (amount_a, amount_b)
        };
        Ok(LiquidityReceipt {
            amount_a: TokenAmount(amount_a),
            amount_b: TokenAmount(amount_b),
            liquidity: TokenAmount(liquidity),
        })
    }

    async fn remove_liquidity(
        &self,
        caller: Address,
        call: RemoveLiquidityCall,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError> {
        let canonical = call.key.canonical();
        let flipped = call.key.token_a != canonical.token_a;
        let mut state = self.state.write().await;

        if call.deadline < state.timestamp {
            return Err(ProtocolError::revert("expired"));
        }
        let pool_addr = state
            .pools
            .get(&canonical)
            .map(|p| p.address)
            .ok_or_else(|| ProtocolError::revert("pool does not exist"))?;

        let pool = state.pools.get(&canonical).expect("pool resolved above");
        let (reserve_a, reserve_b, total_supply) =
            (pool.reserve_a, pool.reserve_b, pool.total_supply);
        if total_supply.is_zero() || call.liquidity.0 > total_supply {
            return Err(ProtocolError::revert("insufficient liquidity burned"));
        }

        let amount_a = Self::mul_div(call.liquidity.0, reserve_a, total_supply)?;
        let amount_b = Self::mul_div(call.liquidity.0, reserve_b, total_supply)?;
        let (min_a, min_b) = if flipped {
            (call.amount_b_min.0, call.amount_a_min.0)
        } else {
            (call.amount_a_min.0, call.amount_b_min.0)
        };
        if amount_a < min_a {
            return Err(ProtocolError::revert("insufficient a amount"));
        }
        if amount_b < min_b {
            return Err(ProtocolError::revert("insufficient b amount"));
        }

        Self::spend_allowance(&mut state, pool_addr, caller, self.router, call.liquidity.0)?;
        // Burn the shares.
        let lp_balances = state
            .tokens
            .get_mut(&pool_addr)
            .ok_or(ProtocolError::UnknownToken(pool_addr))?;
        let held = lp_balances.entry(caller).or_default();
        if *held < call.liquidity.0 {
            return Err(ProtocolError::revert("transfer amount exceeds balance"));
        }
        *held -= call.liquidity.0;

        Self::move_tokens(&mut state, canonical.token_a, pool_addr, call.to, amount_a)?;
        Self::move_tokens(&mut state, canonical.token_b, pool_addr, call.to, amount_b)?;

        let pool = state.pools.get_mut(&canonical).expect("pool resolved above");
        pool.reserve_a -= amount_a;
        pool.reserve_b -= amount_b;
        pool.total_supply -= call.liquidity.0;

        if flipped {
            Ok((TokenAmount(amount_b), TokenAmount(amount_a)))
        } else {
            Ok((TokenAmount(amount_a), TokenAmount(amount_b)))
        }
    }

    async fn claim_fees(
        &self,
        caller: Address,
        pool: Address,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError> {
        let mut state = self.state.write().await;
        let key = *state
            .pools_by_addr
            .get(&pool)
            .ok_or(ProtocolError::UnknownPool(pool))?;
        let pool_state = state.pools.get_mut(&key).expect("indexed pool exists");
        let (fee_a, fee_b) = pool_state.fees_owed.remove(&caller).unwrap_or_default();
        let (token_a, token_b) = (key.token_a, key.token_b);
        // Fees accrue inside the pair, outside its reserves; pay them
        // out by minting to the claimer.
        if !fee_a.is_zero() {
            *state
                .tokens
                .entry(token_a)
                .or_default()
                .entry(caller)
                .or_default() += fee_a;
        }
        if !fee_b.is_zero() {
            *state
                .tokens
                .entry(token_b)
                .or_default()
                .entry(caller)
                .or_default() += fee_b;
        }
        Ok((TokenAmount(fee_a), TokenAmount(fee_b)))
    }

    async fn claimable_fees(
        &self,
        pool: Address,
        account: Address,
    ) -> Result<(TokenAmount, TokenAmount), ProtocolError> {
        let state = self.state.read().await;
        let key = state
            .pools_by_addr
            .get(&pool)
            .ok_or(ProtocolError::UnknownPool(pool))?;
        let pool_state = state.pools.get(key).expect("indexed pool exists");
        let (fee_a, fee_b) = pool_state.fees_owed.get(&account).copied().unwrap_or_default();
        Ok((TokenAmount(fee_a), TokenAmount(fee_b)))
    }
}

#[async_trait]
impl RewardDistributor for MemoryChain {
    async fn gauge_for(&self, pool: Address) -> Result<Option<Address>, ProtocolError> {
        let state = self.state.read().await;
        Ok(state.gauge_by_pool.get(&pool).copied())
    }

    async fn is_alive(&self, gauge: Address) -> Result<bool, ProtocolError> {
        let state = self.state.read().await;
        state
            .gauges
            .get(&gauge)
            .map(|g| g.alive)
            .ok_or(ProtocolError::UnknownGauge(gauge))
    }

    async fn deposit(
        &self,
        gauge: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        let pool = state
            .gauges
            .get(&gauge)
            .map(|g| g.pool)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        Self::spend_allowance(&mut state, pool, account, gauge, amount.0)?;
        Self::move_tokens(&mut state, pool, account, gauge, amount.0)?;
        let g = state.gauges.get_mut(&gauge).expect("gauge resolved above");
        *g.staked.entry(account).or_default() += amount.0;
        Ok(())
    }

    async fn withdraw(
        &self,
        gauge: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        let pool = state
            .gauges
            .get(&gauge)
            .map(|g| g.pool)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        {
            let g = state.gauges.get_mut(&gauge).expect("gauge resolved above");
            let staked = g.staked.entry(account).or_default();
            if *staked < amount.0 {
                return Err(ProtocolError::revert("withdraw exceeds staked balance"));
            }
            *staked -= amount.0;
        }
        Self::move_tokens(&mut state, pool, gauge, account, amount.0)?;
        Ok(())
    }

    async fn staked_balance(
        &self,
        gauge: Address,
        account: Address,
    ) -> Result<TokenAmount, ProtocolError> {
        let state = self.state.read().await;
        let g = state
            .gauges
            .get(&gauge)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        Ok(TokenAmount(g.staked.get(&account).copied().unwrap_or_default()))
    }

    async fn earned(&self, gauge: Address, account: Address) -> Result<TokenAmount, ProtocolError> {
        let state = self.state.read().await;
        let g = state
            .gauges
            .get(&gauge)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        Ok(TokenAmount(
            g.earned_view.get(&account).copied().unwrap_or_default(),
        ))
    }

    async fn reward_token(&self, gauge: Address) -> Result<Address, ProtocolError> {
        let state = self.state.read().await;
        state
            .gauges
            .get(&gauge)
            .map(|g| g.reward_token)
            .ok_or(ProtocolError::UnknownGauge(gauge))
    }

    async fn claim_many(&self, gauges: &[Address], account: Address) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        for gauge in gauges {
            let supported = state
                .gauges
                .get(gauge)
                .map(|g| g.support.aggregator)
                .ok_or(ProtocolError::UnknownGauge(*gauge))?;
            if !supported {
                return Err(ProtocolError::Unsupported("claim_many"));
            }
            Self::settle_rewards(&mut state, *gauge, account);
        }
        Ok(())
    }

    async fn claim(&self, gauge: Address, account: Address) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        let supported = state
            .gauges
            .get(&gauge)
            .map(|g| g.support.direct)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        if !supported {
            return Err(ProtocolError::Unsupported("claim"));
        }
        Self::settle_rewards(&mut state, gauge, account);
        Ok(())
    }

    async fn raw_claim(
        &self,
        gauge: Address,
        selector: [u8; 4],
        account: Address,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        let support = state
            .gauges
            .get(&gauge)
            .map(|g| g.support)
            .ok_or(ProtocolError::UnknownGauge(gauge))?;
        let honored = match selector {
            SELECTOR_GET_REWARD_ACCOUNT => support.raw_account,
            SELECTOR_GET_REWARD => support.raw_no_arg,
            _ => false,
        };
        if !honored {
            return Err(ProtocolError::revert("function selector not recognized"));
        }
        Self::settle_rewards(&mut state, gauge, account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_domain::PoolVariant;

    async fn seeded_pool(
        chain: &MemoryChain,
        provider: Address,
        reserve_a: u64,
        reserve_b: u64,
    ) -> (PoolKey, Address) {
        let token_a = chain.create_token().await;
        let token_b = chain.create_token().await;
        let key = PoolKey::new(token_a, token_b, PoolVariant::Volatile);
        let pool = chain.create_pool(key).await;

        chain.mint(token_a, provider, TokenAmount::from(reserve_a)).await;
        chain.mint(token_b, provider, TokenAmount::from(reserve_b)).await;
        let router = chain.router();
        chain
            .approve(token_a, provider, router, TokenAmount::from(reserve_a))
            .await
            .unwrap();
        chain
            .approve(token_b, provider, router, TokenAmount::from(reserve_b))
            .await
            .unwrap();
        chain
            .add_liquidity(
                provider,
                AddLiquidityCall {
                    key,
                    amount_a: TokenAmount::from(reserve_a),
                    amount_b: TokenAmount::from(reserve_b),
                    amount_a_min: TokenAmount::zero(),
                    amount_b_min: TokenAmount::zero(),
                    to: provider,
                    deadline: u64::MAX,
                },
            )
            .await
            .unwrap();
        (key, pool)
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(MemoryChain::sqrt(U256::zero()), U256::zero());
        assert_eq!(MemoryChain::sqrt(U256::from(1)), U256::from(1));
        assert_eq!(MemoryChain::sqrt(U256::from(144)), U256::from(12));
        assert_eq!(MemoryChain::sqrt(U256::from(145)), U256::from(12));
    }

    #[tokio::test]
    async fn test_first_provision_mints_sqrt() {
        let chain = MemoryChain::new();
        let provider = Address::from_low_u64_be(0xAA);
        let (key, pool) = seeded_pool(&chain, provider, 400, 100).await;

        // sqrt(400 * 100) = 200
        let held = chain.balance_of(pool, provider).await.unwrap();
        assert_eq!(held, TokenAmount::from(200u64));

        let reserves = chain.reserves(&key).await.unwrap().unwrap();
        assert_eq!(reserves, (TokenAmount::from(400u64), TokenAmount::from(100u64)));
    }

    #[tokio::test]
    async fn test_reserves_reported_in_caller_order() {
        let chain = MemoryChain::new();
        let provider = Address::from_low_u64_be(0xAA);
        let (key, _) = seeded_pool(&chain, provider, 400, 100).await;

        let flipped = PoolKey::new(key.token_b, key.token_a, key.variant);
        let reserves = chain.reserves(&flipped).await.unwrap().unwrap();
        assert_eq!(reserves, (TokenAmount::from(100u64), TokenAmount::from(400u64)));
    }

    #[tokio::test]
    async fn test_expired_deadline_reverts() {
        let chain = MemoryChain::new();
        let provider = Address::from_low_u64_be(0xAA);
        let (key, _) = seeded_pool(&chain, provider, 400, 100).await;
        chain.set_timestamp(1_000).await;

        let err = chain
            .add_liquidity(
                provider,
                AddLiquidityCall {
                    key,
                    amount_a: TokenAmount::from(10u64),
                    amount_b: TokenAmount::from(10u64),
                    amount_a_min: TokenAmount::zero(),
                    amount_b_min: TokenAmount::zero(),
                    to: provider,
                    deadline: 999,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, ProtocolError::revert("expired"));
    }

    #[tokio::test]
    async fn test_remove_returns_proportional_amounts() {
        let chain = MemoryChain::new();
        let provider = Address::from_low_u64_be(0xAA);
        let (key, pool) = seeded_pool(&chain, provider, 400, 100).await;

        chain
            .approve(pool, provider, chain.router(), TokenAmount::from(100u64))
            .await
            .unwrap();
        let (out_a, out_b) = chain
            .remove_liquidity(
                provider,
                RemoveLiquidityCall {
                    key,
                    liquidity: TokenAmount::from(100u64), // half the supply
                    amount_a_min: TokenAmount::zero(),
                    amount_b_min: TokenAmount::zero(),
                    to: provider,
                    deadline: u64::MAX,
                },
            )
            .await
            .unwrap();
        assert_eq!(out_a, TokenAmount::from(200u64));
        assert_eq!(out_b, TokenAmount::from(50u64));
    }

    #[tokio::test]
    async fn test_gauge_stake_and_silent_noop_claim() {
        let chain = MemoryChain::new();
        let account = Address::from_low_u64_be(0xAA);
        let (_, pool) = seeded_pool(&chain, account, 400, 100).await;
        let reward_token = chain.create_token().await;
        let gauge = chain.create_gauge(pool, reward_token).await;

        chain
            .approve(pool, account, gauge, TokenAmount::from(200u64))
            .await
            .unwrap();
        chain.deposit(gauge, account, TokenAmount::from(200u64)).await.unwrap();
        assert_eq!(
            chain.staked_balance(gauge, account).await.unwrap(),
            TokenAmount::from(200u64)
        );

        chain.credit_rewards(gauge, account, TokenAmount::from(55u64)).await;
        chain.set_silent_noop(gauge, true).await;
        chain.claim(gauge, account).await.unwrap();
        // Reported success, moved nothing.
        assert_eq!(
            chain.balance_of(reward_token, account).await.unwrap(),
            TokenAmount::zero()
        );

        chain.set_silent_noop(gauge, false).await;
        chain.claim(gauge, account).await.unwrap();
        assert_eq!(
            chain.balance_of(reward_token, account).await.unwrap(),
            TokenAmount::from(55u64)
        );
    }
}
