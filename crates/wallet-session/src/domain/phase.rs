//! Connection phase state machine
//!
//! State Machine:
//! ```text
//! [NO PROVIDER]  (terminal until the environment changes)
//!
//! [DISCONNECTED] ──connect──→ [CONNECTING] ──bound──→ [CONNECTED]
//!       ↑                      │    │    ↑                 │
//!       │                      │    │    └──account changed┘
//!       ├──────abandoned───────┘    │                      │
//!       │                        failed                    │
//!       │                           ↓                      │
//!       │                  [CONNECTION FAILED] ──retry──→ [CONNECTING]
//!       │                                                  │
//!       └────────────────────── disconnected ──────────────┘
//! ```

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::fmt;

/// Connection phase of the session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionPhase {
    /// No wallet extension reachable; every action disabled
    NoProvider,
    /// Provider present, no account bound
    Disconnected,
    /// Account request or contract binding in progress
    Connecting,
    /// Account and contract handle bound
    Connected,
    /// Last attempt was rejected or binding failed
    ConnectionFailed,
}

impl ConnectionPhase {
    /// Phase at construction, from provider detection.
    pub fn initial(provider_detected: bool) -> Self {
        if provider_detected {
            Self::Disconnected
        } else {
            Self::NoProvider
        }
    }

    /// Next phase for an event, or `None` if the event is not valid here.
    ///
    /// Pure and deterministic; the session applies the result.
    pub fn on(self, event: PhaseEvent) -> Option<Self> {
        use ConnectionPhase::*;
        use PhaseEvent::*;

        match (self, event) {
            (NoProvider, _) => None,

            (Disconnected | ConnectionFailed, ConnectStarted) => Some(Connecting),

            (Connecting, Bound) => Some(Connected),
            (Connecting, ConnectFailed) => Some(ConnectionFailed),
            (Connecting, Abandoned) => Some(Disconnected),

            (Connected, AccountChanged) => Some(Connecting),

            (Connecting | Connected | ConnectionFailed, Disconnect) => Some(Disconnected),

            _ => None,
        }
    }

    /// True if mutating calls may be attempted.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoProvider => "no provider",
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ConnectionFailed => "connection failed",
        };
        f.write_str(label)
    }
}

/// Events that drive phase transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Connection attempt begins (user connect, silent reconnect, retry)
    ConnectStarted,
    /// Contract handle bound for the requested account
    Bound,
    /// Account request rejected or binding failed
    ConnectFailed,
    /// Attempt torn down before completion
    Abandoned,
    /// Provider reported a different selected account
    AccountChanged,
    /// Provider disconnect or user-initiated disconnect
    Disconnect,
}

/// Observable snapshot of the session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current phase
    pub phase: ConnectionPhase,
    /// Bound account (set together with `contract`)
    pub account: Option<Address>,
    /// Address of the bound contract handle
    pub contract: Option<Address>,
}

impl Session {
    /// Snapshot with nothing bound.
    pub fn unbound(phase: ConnectionPhase) -> Self {
        Self {
            phase,
            account: None,
            contract: None,
        }
    }

    /// Account label for display: `0x1234...7890`, or the phase name.
    pub fn display_name(&self) -> String {
        match (&self.phase, &self.account) {
            (ConnectionPhase::Connected, Some(account)) => account.short(),
            (phase, _) => phase.to_string(),
        }
    }
}

/// What a provider notification did to the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEventOutcome {
    /// No effect in the current phase (or same account re-reported)
    Ignored,
    /// Rebound to a different account; read state was invalidated
    Switched { account: Address },
    /// Rebinding to the new account failed
    SwitchFailed(SessionError),
    /// Session returned to `Disconnected`
    Disconnected,
}
