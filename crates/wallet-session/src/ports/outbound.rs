//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The wallet provider is the only collaborator the session talks to. It is
//! the sole authority on whether a wallet is present, which accounts are
//! authorised, and it mediates every contract call and transaction.

use crate::domain::AbiValue;
use crate::error::ProviderError;
use async_trait::async_trait;
use shared_types::{Address, TxHash};
use tokio::sync::broadcast;

/// Notification pushed by the provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Selected accounts changed; empty means the wallet locked or revoked access
    AccountsChanged(Vec<Address>),
    /// Provider lost its connection
    Disconnected,
}

/// A fully-resolved contract call
///
/// Produced by a contract handle after shape checks; the provider only
/// encodes and forwards it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    /// Signing identity
    pub from: Address,
    pub function: String,
    pub selector: [u8; 4],
    pub args: Vec<AbiValue>,
}

/// Outcome of a mined transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted { reason: Option<String> },
}

/// Transaction receipt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx: TxHash,
    pub status: ReceiptStatus,
    pub block_number: u64,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }
}

/// Wallet provider (browser-injected wallet, or a devnet stand-in)
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// True iff a wallet-compatible provider is reachable.
    fn detect(&self) -> bool;

    /// Prompt the user for account access.
    ///
    /// A declined prompt is `ProviderError::UserRejected`.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Already-authorised accounts, without prompting. Empty if never authorised.
    async fn current_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Subscribe to account-changed and disconnect notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Execute a read-only call.
    async fn call(&self, call: ContractCall) -> Result<AbiValue, ProviderError>;

    /// Sign and broadcast a transaction; returns once the wallet has accepted it.
    async fn send_transaction(&self, call: ContractCall) -> Result<TxHash, ProviderError>;

    /// Wait until `tx` has `confirmations` confirmations.
    ///
    /// A reverted transaction is reported through the receipt status; errors
    /// mean the transaction never reached finality.
    async fn wait_for_receipt(
        &self,
        tx: TxHash,
        confirmations: u64,
    ) -> Result<TxReceipt, ProviderError>;
}
