//! Owner plus flat manager set. A single authorization predicate over
//! an explicit set; there is no role hierarchy.

use custody_domain::{Address, CustodyError};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::info;

/// Per-account authorization state: one immutable owner and a set of
/// delegate managers that never contains the owner.
#[derive(Debug)]
pub struct AuthorizationLedger {
    owner: Address,
    managers: RwLock<HashSet<Address>>,
}

impl AuthorizationLedger {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            managers: RwLock::new(HashSet::new()),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// `caller = owner ∨ caller ∈ managers`.
    pub async fn is_authorized(&self, caller: Address) -> bool {
        caller == self.owner || self.managers.read().await.contains(&caller)
    }

    pub async fn require(&self, caller: Address) -> Result<(), CustodyError> {
        if self.is_authorized(caller).await {
            Ok(())
        } else {
            Err(CustodyError::NotAuthorized(caller))
        }
    }

    pub async fn require_owner(&self, caller: Address) -> Result<(), CustodyError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(CustodyError::NotAuthorized(caller))
        }
    }

    /// Adds a delegate manager. Owner-only; rejects a second add of
    /// the same address (and the owner itself) with
    /// `AlreadyAuthorized` rather than silently accepting it.
    pub async fn add_manager(&self, caller: Address, manager: Address) -> Result<(), CustodyError> {
        self.require_owner(caller).await?;
        if manager == self.owner {
            return Err(CustodyError::AlreadyAuthorized(manager));
        }
        let mut managers = self.managers.write().await;
        if !managers.insert(manager) {
            return Err(CustodyError::AlreadyAuthorized(manager));
        }
        info!(manager = ?manager, "manager added");
        Ok(())
    }

    /// Removes a delegate manager. Owner-only; rejects an address
    /// that is not currently a manager with `NotAuthorized`.
    pub async fn remove_manager(
        &self,
        caller: Address,
        manager: Address,
    ) -> Result<(), CustodyError> {
        self.require_owner(caller).await?;
        let mut managers = self.managers.write().await;
        if !managers.remove(&manager) {
            return Err(CustodyError::NotAuthorized(manager));
        }
        info!(manager = ?manager, "manager removed");
        Ok(())
    }

    pub async fn managers(&self) -> Vec<Address> {
        self.managers.read().await.iter().copied().collect()
    }
}
