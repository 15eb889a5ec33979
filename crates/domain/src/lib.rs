//! Shared domain types for the custody engine.
//!
//! Addresses and token amounts, pool identification, and the error
//! taxonomy used across every crate in the workspace.

pub mod error;
pub mod pool;
pub mod token;

pub use error::CustodyError;
pub use pool::{PoolKey, PoolVariant};
pub use token::{Address, TokenAmount};
