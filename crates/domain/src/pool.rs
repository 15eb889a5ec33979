use crate::token::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pricing-curve configuration of a pool. The external AMM may
/// instantiate both variants for the same token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolVariant {
    Stable,
    Volatile,
}

impl PoolVariant {
    pub fn is_stable(&self) -> bool {
        matches!(self, PoolVariant::Stable)
    }
}

impl fmt::Display for PoolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolVariant::Stable => write!(f, "stable"),
            PoolVariant::Volatile => write!(f, "volatile"),
        }
    }
}

/// Identifies a position. Positions are not stored anywhere; the key
/// is resolved against the external AMM every time it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token_a: Address,
    pub token_b: Address,
    pub variant: PoolVariant,
}

impl PoolKey {
    pub fn new(token_a: Address, token_b: Address, variant: PoolVariant) -> Self {
        Self {
            token_a,
            token_b,
            variant,
        }
    }

    pub fn stable(token_a: Address, token_b: Address) -> Self {
        Self::new(token_a, token_b, PoolVariant::Stable)
    }

    pub fn volatile(token_a: Address, token_b: Address) -> Self {
        Self::new(token_a, token_b, PoolVariant::Volatile)
    }

    /// Token-order-independent form, so (A, B) and (B, A) resolve to
    /// the same pool.
    pub fn canonical(&self) -> Self {
        if self.token_a <= self.token_b {
            *self
        } else {
            Self {
                token_a: self.token_b,
                token_b: self.token_a,
                variant: self.variant,
            }
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?} ({})", self.token_a, self.token_b, self.variant)
    }
}
