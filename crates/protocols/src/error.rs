use custody_domain::Address;
use thiserror::Error;

/// Failure surface of the external protocol.
///
/// `Revert` carries the external reason string verbatim so operators
/// can distinguish an expired deadline from a slippage check from any
/// other cause. `Unsupported` models a typed interface that simply is
/// not present on the target contract, which is what makes the claim
/// fallback chain necessary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{0}")]
    Revert(String),
    #[error("interface not supported: {0}")]
    Unsupported(&'static str),
    #[error("unknown pool {0:?}")]
    UnknownPool(Address),
    #[error("unknown gauge {0:?}")]
    UnknownGauge(Address),
    #[error("unknown token {0:?}")]
    UnknownToken(Address),
}

impl ProtocolError {
    pub fn revert(reason: impl Into<String>) -> Self {
        Self::Revert(reason.into())
    }
}
