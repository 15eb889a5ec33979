use crate::error::ProtocolError;
use async_trait::async_trait;
use custody_domain::{Address, TokenAmount};

/// Token and native-asset balance primitive.
///
/// Transfers and approvals return `Ok(false)` when the underlying
/// asset contract reports failure without reverting; callers must
/// treat that the same as an error.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn balance_of(&self, token: Address, holder: Address)
    -> Result<TokenAmount, ProtocolError>;

    async fn native_balance(&self, holder: Address) -> Result<TokenAmount, ProtocolError>;

    async fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError>;

    async fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError>;

    async fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<bool, ProtocolError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<TokenAmount, ProtocolError>;
}
