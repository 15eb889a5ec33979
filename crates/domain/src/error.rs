use crate::pool::PoolKey;
use crate::token::{Address, TokenAmount};
use thiserror::Error;

/// Error taxonomy shared by every engine entry point.
///
/// External-call failures on liquidity operations carry the external
/// protocol's reason string verbatim (`Protocol`); reward and fee
/// claim failures are normalized into the local variants because the
/// external distributor's own failure reporting is inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    // Authorization
    #[error("caller {0:?} is not authorized")]
    NotAuthorized(Address),
    #[error("{0:?} is already an authorized manager")]
    AlreadyAuthorized(Address),

    // Configuration
    #[error("external protocol endpoints are not configured")]
    EndpointNotSet,

    // Not found
    #[error("no pool exists for {0}")]
    PoolNotFound(PoolKey),
    #[error("no gauge registered for pool {0:?}")]
    NoGauge(Address),
    #[error("principal {0:?} owns no custody account")]
    NoAccount(Address),

    // State
    #[error("gauge {0:?} is not in a claimable state")]
    InvalidGaugeState(Address),
    #[error("gauge {0:?} is not alive")]
    GaugeInactive(Address),
    #[error("nothing staked in gauge {0:?}")]
    NothingStaked(Address),

    // Value
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance {
        available: TokenAmount,
        requested: TokenAmount,
    },

    // External call
    #[error("asset transfer failed")]
    TransferFailed,
    #[error("no rewards available to claim from gauge {0:?}")]
    NoRewardsAvailable(Address),
    #[error("gauge reward claim failed for {0:?}")]
    GaugeClaimFailed(Address),
    #[error("fee claim failed for pool {0:?}")]
    FeeClaimFailed(Address),
    #[error("external protocol call failed: {0}")]
    Protocol(String),

    // Registry
    #[error("principal {0:?} already has a custody account")]
    AlreadyHasAccount(Address),
    #[error("account {0:?} was not created by this registry")]
    UnknownAccount(Address),
}
