//! Ports module for the wallet session
//!
//! Inbound: the API the presentation layer drives.
//! Outbound: the wallet provider the session depends on.

pub mod inbound;
pub mod outbound;

pub use inbound::WalletSessionApi;
pub use outbound::{ContractCall, ProviderEvent, ReceiptStatus, TxReceipt, WalletProvider};
