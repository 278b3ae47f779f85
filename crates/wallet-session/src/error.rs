//! Error types for the wallet session
//!
//! `SessionError` is the only error the presentation boundary ever sees.
//! Port-level errors (`ProviderError`, `CallError`) are converted at the
//! session boundary according to the stage at which they occurred.

use crate::domain::{ActionKind, ConnectionPhase, ReadField};
use thiserror::Error;

/// Session errors, as reported to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No wallet extension detected
    #[error("No wallet provider detected - install a wallet extension")]
    ProviderUnavailable,

    /// Wallet is installed but could not serve the request right now
    #[error("Wallet request failed: {reason}")]
    ProviderRequestFailed { reason: String },

    /// User declined a wallet prompt
    #[error("Request rejected by user")]
    UserRejected,

    /// Local validation failed before any network interaction
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Mutating call attempted while not connected
    #[error("Session not ready: phase is {phase}")]
    NotReady { phase: ConnectionPhase },

    /// Another mutating action is still in flight
    #[error("Action already in progress: {kind}")]
    ActionInProgress { kind: ActionKind },

    /// Contract logic rejected the call
    #[error("Call reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    CallReverted { reason: Option<String> },

    /// Transaction dropped, timed out, or never reached the ledger
    #[error("Transaction never confirmed: {reason}")]
    NeverConfirmed { reason: String },

    /// Read query failed
    #[error("Refresh failed for {field}: {reason}")]
    RefreshFailed { field: ReadField, reason: String },

    /// Contract handle could not be constructed
    #[error("Contract binding failed: {0}")]
    Binding(#[from] BindingError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by the wallet provider port
///
/// Codes follow the EIP-1193 provider error conventions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No provider object in the execution environment
    #[error("Wallet provider not installed")]
    NotInstalled,

    /// User declined the prompt (4001)
    #[error("User rejected the request")]
    UserRejected,

    /// Provider lost its connection to the chain (4900 / 4901)
    #[error("Provider disconnected")]
    Disconnected,

    /// Execution reverted (3), either during estimation or on-chain
    #[error("Execution reverted: {reason:?}")]
    Reverted { reason: Option<String> },

    /// Transaction was dropped or replaced before confirmation
    #[error("Transaction dropped: {reason}")]
    Dropped { reason: String },

    /// Any other JSON-RPC error
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl ProviderError {
    /// EIP-1193 user-rejected code
    pub const USER_REJECTED: i64 = 4001;
    /// EIP-1193 disconnected code
    pub const DISCONNECTED: i64 = 4900;
    /// EIP-1193 chain-disconnected code
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// JSON-RPC execution-reverted code
    pub const EXECUTION_REVERTED: i64 = 3;

    /// Classify a raw JSON-RPC error.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Self::USER_REJECTED => Self::UserRejected,
            Self::DISCONNECTED | Self::CHAIN_DISCONNECTED => Self::Disconnected,
            Self::EXECUTION_REVERTED => Self::Reverted {
                reason: revert_reason(&message),
            },
            _ => Self::Rpc { code, message },
        }
    }
}

/// Extract the reason string from an `execution reverted: <reason>` message.
fn revert_reason(message: &str) -> Option<String> {
    message
        .split_once("reverted:")
        .map(|(_, reason)| reason.trim().to_string())
        .filter(|reason| !reason.is_empty())
}

/// Contract binding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Contract address is not a well-formed 20-byte address
    #[error("Malformed contract address {address}: {reason}")]
    MalformedAddress { address: String, reason: String },

    /// No signing identity available
    #[error("No signer available")]
    MissingSigner,
}

/// Contract-handle call errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Function not declared by the interface
    #[error("Contract interface does not declare `{0}`")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("`{function}` takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Argument value does not match the declared type
    #[error("`{function}` argument {index} must be {expected}")]
    TypeMismatch {
        function: String,
        index: usize,
        expected: String,
    },

    /// Read-only function used as a transaction or vice versa
    #[error("`{function}` is not a {expected} function")]
    WrongMutability {
        function: String,
        expected: &'static str,
    },

    /// Return value does not match the declared output
    #[error("`{function}` returned an unexpected value")]
    UnexpectedOutput { function: String },

    /// Provider-level failure
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SessionError {
    /// Convert a provider failure during account discovery.
    ///
    /// Only a missing extension is `ProviderUnavailable`; anything else the
    /// installed wallet reports can be retried.
    pub fn from_connect(error: ProviderError) -> Self {
        match error {
            ProviderError::NotInstalled => Self::ProviderUnavailable,
            ProviderError::UserRejected => Self::UserRejected,
            other => Self::ProviderRequestFailed {
                reason: other.to_string(),
            },
        }
    }

    /// Convert a failure while submitting a transaction.
    ///
    /// No chain state has changed at this point.
    pub fn from_submission(error: CallError) -> Self {
        match error {
            CallError::Provider(ProviderError::UserRejected) => Self::UserRejected,
            CallError::Provider(ProviderError::Reverted { reason }) => Self::CallReverted { reason },
            CallError::Provider(ProviderError::NotInstalled) => Self::ProviderUnavailable,
            CallError::Provider(ProviderError::Disconnected) => Self::NeverConfirmed {
                reason: "provider disconnected before submission".to_string(),
            },
            CallError::Provider(ProviderError::Dropped { reason }) => Self::NeverConfirmed { reason },
            CallError::Provider(ProviderError::Rpc { message, .. }) => Self::NeverConfirmed {
                reason: format!("submission failed: {message}"),
            },
            other => Self::InvalidInput {
                field: "call",
                reason: other.to_string(),
            },
        }
    }

    /// Convert a failure while awaiting confirmation.
    pub fn from_confirmation(error: CallError) -> Self {
        match error {
            CallError::Provider(ProviderError::Reverted { reason }) => Self::CallReverted { reason },
            CallError::Provider(ProviderError::Dropped { reason }) => Self::NeverConfirmed { reason },
            other => Self::NeverConfirmed {
                reason: other.to_string(),
            },
        }
    }

    /// True if the user can simply try again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ProviderUnavailable | Self::NotReady { .. })
    }
}
