//! # wallet-session
//!
//! Wallet-bound contract session for an ATM-style and a voting-style contract.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Connection phases**: an explicit state machine from provider detection
//!   to a bound contract handle
//! - **Contract binding**: immutable handles tied to one signing identity
//! - **Read-state cache**: balance, frozen flag, voting-open flag and
//!   candidate list, refreshed field by field
//! - **Action dispatcher**: one protocol for every state-changing call
//!
//! ## Architecture
//!
//! ```text
//! Presentation ──intents──→ WalletSessionApi ──→ WalletSession
//!      ↑                                             │
//!      └──── watch: Session / ReadState / PendingAction
//!                                                    │
//!                        ContractHandle ──calls──→ WalletProvider (port)
//!                                                    │
//!                          notifications ←───────────┘
//! ```
//!
//! ## Session State Machine
//!
//! ```text
//! [NO PROVIDER]
//!
//! [DISCONNECTED] ──connect──→ [CONNECTING] ──bound──→ [CONNECTED]
//!       ↑                      │       ↑                  │
//!       ├──────abandoned───────┘       └─account changed──┤
//!       │                      │                          │
//!       │                   failed ──→ [CONNECTION FAILED]│
//!       │                                  │ retry        │
//!       └────────────────── disconnected ─────────────────┘
//! ```
//!
//! ## Action Protocol
//!
//! 1. Preconditions: `NotReady`, then `InvalidInput`, then `ActionInProgress`
//! 2. Submit through the bound handle, in a task that owns the in-flight
//!    slot (dropping the caller's future does not cancel the action)
//! 3. Await confirmation (revert and drop are reported differently)
//! 4. Refresh exactly the fields the action can affect
//! 5. Report a terminal `PendingAction`
//!
//! ## Example
//!
//! ```rust,ignore
//! use wallet_session::{InMemoryWallet, SessionConfig, WalletSession, WalletSessionApi};
//!
//! let wallet = Arc::new(InMemoryWallet::new(vec![account]));
//! let session = WalletSession::new(SessionConfig::from_env()?, wallet);
//! session.spawn_notification_loop();
//!
//! session.connect().await?;
//! let pending = session.deposit(Amount::parse_ether("0.5")?).await?;
//! ```

pub mod adapters;
pub mod binding;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::InMemoryWallet;
pub use binding::{bind, ContractHandle};
pub use config::{ConfigError, SessionConfig, DEFAULT_CONTRACT_ADDRESS};
pub use domain::{
    AbiError, AbiValue, Action, ActionKind, ActionStatus, ConnectionPhase, ContractInterface,
    FieldFailure, PendingAction, ProviderEventOutcome, ReadField, ReadState, RefreshReport,
    Session, StaleReadWarning,
};
pub use error::{BindingError, CallError, ProviderError, SessionError, SessionResult};
pub use ports::inbound::WalletSessionApi;
pub use ports::outbound::{ContractCall, ProviderEvent, ReceiptStatus, TxReceipt, WalletProvider};
pub use service::WalletSession;
pub use shared_types::{Address, Amount, TxHash, U256};
