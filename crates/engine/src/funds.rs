//! Asset custody: deposits, withdrawals, balance reads, and recovery.
//!
//! Balances are never cached; every read goes to the external token
//! ledger.

use crate::account::{CustodyAccount, protocol_err};
use crate::events::AccountEvent;
use custody_domain::{Address, CustodyError, TokenAmount};
use custody_protocols::TokenLedger;
use tracing::info;

impl CustodyAccount {
    /// Deposits `amount` of `asset` from `caller` into the account.
    /// Permissionless so third parties can fund a principal's account.
    pub async fn deposit(
        &self,
        caller: Address,
        asset: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Err(CustodyError::ZeroAmount);
        }
        let ok = self
            .chain
            .ledger
            .transfer(asset, caller, self.address(), amount)
            .await
            .unwrap_or(false);
        if !ok {
            return Err(CustodyError::TransferFailed);
        }
        self.events
            .record(AccountEvent::Deposited {
                asset,
                from: caller,
                amount,
            })
            .await;
        info!(account = ?self.address(), asset = ?asset, amount = %amount, "deposit");
        Ok(())
    }

    /// Deposits native currency. Permissionless.
    pub async fn deposit_native(
        &self,
        caller: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Err(CustodyError::ZeroAmount);
        }
        let ok = self
            .chain
            .ledger
            .transfer_native(caller, self.address(), amount)
            .await
            .unwrap_or(false);
        if !ok {
            return Err(CustodyError::TransferFailed);
        }
        self.events
            .record(AccountEvent::NativeDeposited {
                from: caller,
                amount,
            })
            .await;
        Ok(())
    }

    /// Withdraws `amount` of `asset` to `recipient`. Owner/manager
    /// gated; fails if `amount` exceeds the available balance.
    pub async fn withdraw(
        &self,
        caller: Address,
        asset: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        self.auth.require(caller).await?;
        let available = self.token_balance(asset).await?;
        if amount > available {
            return Err(CustodyError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let ok = self
            .chain
            .ledger
            .transfer(asset, self.address(), recipient, amount)
            .await
            .unwrap_or(false);
        if !ok {
            return Err(CustodyError::TransferFailed);
        }
        self.events
            .record(AccountEvent::Withdrawn {
                asset,
                to: recipient,
                amount,
            })
            .await;
        info!(account = ?self.address(), asset = ?asset, amount = %amount, "withdrawal");
        Ok(())
    }

    /// Withdraws native currency to `recipient`. Owner/manager gated.
    pub async fn withdraw_native(
        &self,
        caller: Address,
        recipient: Address,
        amount: TokenAmount,
    ) -> Result<(), CustodyError> {
        self.auth.require(caller).await?;
        let available = self.native_balance().await?;
        if amount > available {
            return Err(CustodyError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let ok = self
            .chain
            .ledger
            .transfer_native(self.address(), recipient, amount)
            .await
            .unwrap_or(false);
        if !ok {
            return Err(CustodyError::TransferFailed);
        }
        self.events
            .record(AccountEvent::NativeWithdrawn {
                to: recipient,
                amount,
            })
            .await;
        Ok(())
    }

    /// Current balance of `asset` held by the account.
    pub async fn token_balance(&self, asset: Address) -> Result<TokenAmount, CustodyError> {
        self.chain
            .ledger
            .balance_of(asset, self.address())
            .await
            .map_err(protocol_err)
    }

    /// Current native-currency balance of the account.
    pub async fn native_balance(&self) -> Result<TokenAmount, CustodyError> {
        self.chain
            .ledger
            .native_balance(self.address())
            .await
            .map_err(protocol_err)
    }

    /// Sweeps the listed assets and any native balance to `recipient`.
    /// Owner-only. Empties the account without decommissioning it.
    pub async fn recover_assets(
        &self,
        caller: Address,
        recipient: Address,
        assets: &[Address],
    ) -> Result<(), CustodyError> {
        self.auth.require_owner(caller).await?;
        for &asset in assets {
            let balance = self.token_balance(asset).await?;
            if balance.is_zero() {
                continue;
            }
            let ok = self
                .chain
                .ledger
                .transfer(asset, self.address(), recipient, balance)
                .await
                .unwrap_or(false);
            if !ok {
                return Err(CustodyError::TransferFailed);
            }
        }
        let native = self.native_balance().await?;
        if !native.is_zero() {
            let ok = self
                .chain
                .ledger
                .transfer_native(self.address(), recipient, native)
                .await
                .unwrap_or(false);
            if !ok {
                return Err(CustodyError::TransferFailed);
            }
        }
        self.events
            .record(AccountEvent::AssetsRecovered { to: recipient })
            .await;
        info!(account = ?self.address(), to = ?recipient, "assets recovered");
        Ok(())
    }
}
