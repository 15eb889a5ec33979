//! Registry of custody accounts per principal.
//!
//! Tracks which accounts a principal owns versus merely manages. The
//! managed index is maintained by best-effort notifications from the
//! accounts themselves and may under- or over-report relative to the
//! authorization ledgers, which stay authoritative.

use crate::account::{ChainHandles, CustodyAccount};
use crate::liquidity::LiquidityConfig;
use async_trait::async_trait;
use custody_domain::{Address, CustodyError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Callback surface an account uses to keep the delegate index
/// current when its manager set changes.
#[async_trait]
pub trait DelegateIndex: Send + Sync {
    async fn register_delegate(
        &self,
        principal: Address,
        account: Address,
    ) -> Result<(), CustodyError>;

    async fn unregister_delegate(
        &self,
        principal: Address,
        account: Address,
    ) -> Result<(), CustodyError>;
}

#[derive(Default)]
struct RegistryState {
    /// Accounts created by each principal. At most one today; kept as
    /// a collection for forward compatibility.
    owned: HashMap<Address, Vec<Address>>,
    /// Accounts where each principal was added as a delegate.
    managed: HashMap<Address, Vec<Address>>,
    accounts: HashMap<Address, Arc<CustodyAccount>>,
    next_id: u64,
}

/// Creates custody accounts and indexes ownership and delegation.
pub struct CustodyRegistry {
    id: Address,
    chain: ChainHandles,
    liquidity_config: LiquidityConfig,
    state: RwLock<RegistryState>,
}

impl CustodyRegistry {
    pub fn new(id: Address, chain: ChainHandles, liquidity_config: LiquidityConfig) -> Arc<Self> {
        Arc::new(Self {
            id,
            chain,
            liquidity_config,
            state: RwLock::new(RegistryState {
                next_id: 1,
                ..Default::default()
            }),
        })
    }

    pub fn id(&self) -> Address {
        self.id
    }

    /// Creates the custody account for `principal`. One per principal,
    /// enforced at creation time; accounts are never destroyed.
    pub async fn create_account(
        self: &Arc<Self>,
        principal: Address,
    ) -> Result<Arc<CustodyAccount>, CustodyError> {
        let mut state = self.state.write().await;
        if state.owned.get(&principal).is_some_and(|a| !a.is_empty()) {
            return Err(CustodyError::AlreadyHasAccount(principal));
        }

        let address = Address::from_low_u64_be(0xACC0_0000_0000 + state.next_id);
        state.next_id += 1;

        let account = Arc::new(CustodyAccount::new(
            address,
            principal,
            self.id,
            self.chain.clone(),
            self.liquidity_config.clone(),
        ));
        let index: Arc<dyn DelegateIndex> = self.clone();
        account.attach_registry(Arc::downgrade(&index)).await;

        state.owned.entry(principal).or_default().push(address);
        state.accounts.insert(address, account.clone());
        info!(principal = ?principal, account = ?address, "custody account created");
        Ok(account)
    }

    pub async fn account(&self, address: Address) -> Option<Arc<CustodyAccount>> {
        self.state.read().await.accounts.get(&address).cloned()
    }

    /// Accounts created by `principal`.
    pub async fn owned_accounts(&self, principal: Address) -> Vec<Address> {
        self.state
            .read()
            .await
            .owned
            .get(&principal)
            .cloned()
            .unwrap_or_default()
    }

    /// Accounts where `principal` is (per this index) a delegate.
    /// Best-effort; may be stale relative to the authorization
    /// ledgers.
    pub async fn managed_accounts(&self, principal: Address) -> Vec<Address> {
        self.state
            .read()
            .await
            .managed
            .get(&principal)
            .cloned()
            .unwrap_or_default()
    }

    /// Union of owned and managed accounts, owned first.
    pub async fn accessible_accounts(&self, principal: Address) -> Vec<Address> {
        let state = self.state.read().await;
        let mut all = state.owned.get(&principal).cloned().unwrap_or_default();
        for account in state.managed.get(&principal).into_iter().flatten() {
            if !all.contains(account) {
                all.push(*account);
            }
        }
        all
    }
}

#[async_trait]
impl DelegateIndex for CustodyRegistry {
    async fn register_delegate(
        &self,
        principal: Address,
        account: Address,
    ) -> Result<(), CustodyError> {
        let mut state = self.state.write().await;
        let known = state
            .accounts
            .get(&account)
            .ok_or(CustodyError::UnknownAccount(account))?;
        // Mutual authentication: the account must report this registry
        // as its originating factory.
        if known.originating_factory() != self.id {
            return Err(CustodyError::UnknownAccount(account));
        }
        let list = state.managed.entry(principal).or_default();
        if !list.contains(&account) {
            list.push(account);
        }
        debug!(principal = ?principal, account = ?account, "delegate registered");
        Ok(())
    }

    async fn unregister_delegate(
        &self,
        principal: Address,
        account: Address,
    ) -> Result<(), CustodyError> {
        let mut state = self.state.write().await;
        let known = state
            .accounts
            .get(&account)
            .ok_or(CustodyError::UnknownAccount(account))?;
        if known.originating_factory() != self.id {
            return Err(CustodyError::UnknownAccount(account));
        }
        if let Some(list) = state.managed.get_mut(&principal) {
            list.retain(|a| *a != account);
        }
        debug!(principal = ?principal, account = ?account, "delegate unregistered");
        Ok(())
    }
}
