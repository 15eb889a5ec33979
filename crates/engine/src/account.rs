//! The custody account aggregate.

use crate::auth::AuthorizationLedger;
use crate::events::{AccountEvent, EventLog, RecordedEvent};
use crate::liquidity::LiquidityConfig;
use crate::registry::DelegateIndex;
use custody_domain::{Address, CustodyError};
use custody_protocols::{AmmProtocol, ProtocolError, RewardDistributor, TokenLedger};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Handles to the external system's three capability surfaces.
#[derive(Clone)]
pub struct ChainHandles {
    pub ledger: Arc<dyn TokenLedger>,
    pub amm: Arc<dyn AmmProtocol>,
    pub rewards: Arc<dyn RewardDistributor>,
}

impl std::fmt::Debug for ChainHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainHandles").finish_non_exhaustive()
    }
}

/// Owner-settable addresses of the external protocol's entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolEndpoints {
    pub router: Address,
    pub factory: Address,
}

/// A per-principal holding account. Exactly one owner; mutating
/// operations require the caller to be the owner or a delegate
/// manager, except deposits, which are permissionless.
#[derive(Debug)]
pub struct CustodyAccount {
    address: Address,
    factory: Address,
    pub(crate) auth: AuthorizationLedger,
    pub(crate) endpoints: RwLock<Option<ProtocolEndpoints>>,
    pub(crate) chain: ChainHandles,
    pub(crate) liquidity_config: LiquidityConfig,
    pub(crate) events: EventLog,
    registry: RwLock<Option<Weak<dyn DelegateIndex>>>,
}

impl CustodyAccount {
    pub fn new(
        address: Address,
        owner: Address,
        factory: Address,
        chain: ChainHandles,
        liquidity_config: LiquidityConfig,
    ) -> Self {
        Self {
            address,
            factory,
            auth: AuthorizationLedger::new(owner),
            endpoints: RwLock::new(None),
            chain,
            liquidity_config,
            events: EventLog::new(),
            registry: RwLock::new(None),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.auth.owner()
    }

    /// The registry/factory this account was created by. Used for
    /// mutual authentication of registry callbacks.
    pub fn originating_factory(&self) -> Address {
        self.factory
    }

    /// Wires the best-effort registry back-reference. Called once by
    /// the registry at creation time.
    pub async fn attach_registry(&self, registry: Weak<dyn DelegateIndex>) {
        *self.registry.write().await = Some(registry);
    }

    pub async fn is_authorized(&self, caller: Address) -> bool {
        self.auth.is_authorized(caller).await
    }

    pub async fn managers(&self) -> Vec<Address> {
        self.auth.managers().await
    }

    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.all().await
    }

    /// Sets the external-protocol endpoints. Owner-only.
    pub async fn set_endpoints(
        &self,
        caller: Address,
        router: Address,
        factory: Address,
    ) -> Result<(), CustodyError> {
        self.auth.require_owner(caller).await?;
        *self.endpoints.write().await = Some(ProtocolEndpoints { router, factory });
        self.events
            .record(AccountEvent::EndpointsSet { router, factory })
            .await;
        info!(account = ?self.address, router = ?router, "protocol endpoints set");
        Ok(())
    }

    pub async fn endpoints(&self) -> Option<ProtocolEndpoints> {
        *self.endpoints.read().await
    }

    pub(crate) async fn require_endpoints(&self) -> Result<ProtocolEndpoints, CustodyError> {
        self.endpoints.read().await.ok_or(CustodyError::EndpointNotSet)
    }

    /// Adds a delegate manager and best-effort notifies the registry.
    pub async fn add_manager(&self, caller: Address, manager: Address) -> Result<(), CustodyError> {
        self.auth.add_manager(caller, manager).await?;
        self.events
            .record(AccountEvent::ManagerAdded { manager })
            .await;
        self.notify_delegate_change(manager, true).await;
        Ok(())
    }

    /// Removes a delegate manager and best-effort notifies the
    /// registry.
    pub async fn remove_manager(
        &self,
        caller: Address,
        manager: Address,
    ) -> Result<(), CustodyError> {
        self.auth.remove_manager(caller, manager).await?;
        self.events
            .record(AccountEvent::ManagerRemoved { manager })
            .await;
        self.notify_delegate_change(manager, false).await;
        Ok(())
    }

    /// Fire-and-forget registry notification. The authorization change
    /// has already happened and is not rolled back if this fails; the
    /// registry is a best-effort index, the authorization ledger is
    /// authoritative.
    async fn notify_delegate_change(&self, principal: Address, added: bool) {
        let Some(weak) = self.registry.read().await.clone() else {
            return;
        };
        let Some(registry) = weak.upgrade() else {
            debug!(account = ?self.address, "registry no longer reachable");
            return;
        };
        let result = if added {
            registry.register_delegate(principal, self.address).await
        } else {
            registry.unregister_delegate(principal, self.address).await
        };
        if let Err(error) = result {
            warn!(
                account = ?self.address,
                principal = ?principal,
                error = %error,
                "registry notification failed"
            );
        }
    }
}

/// External-call failures keep their reason string verbatim.
pub(crate) fn protocol_err(error: ProtocolError) -> CustodyError {
    CustodyError::Protocol(error.to_string())
}
