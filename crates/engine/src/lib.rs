//! Per-user custody and position-management engine.
//!
//! A custody account is owned by one principal and optionally operable
//! by a delegated set of managers. It deposits assets, provisions and
//! removes AMM liquidity, stakes pool-share tokens into reward gauges,
//! and harvests rewards and fees. Every operation that hands control
//! to the external protocol snapshots observable state first and
//! confirms effects by re-reading it afterward; external return values
//! are advisory only.

/// Prelude module for convenient imports.
pub mod prelude;

/// Custody account aggregate.
pub mod account;
/// Owner/delegate authorization ledger.
pub mod auth;
/// Reward and fee claiming with delta verification.
pub mod claims;
/// Account event log.
pub mod events;
/// Asset deposits and withdrawals.
pub mod funds;
/// Liquidity provisioning and removal.
pub mod liquidity;
/// Owned/managed account registry.
pub mod registry;
/// Gauge stake/unstake lifecycle.
pub mod staking;
