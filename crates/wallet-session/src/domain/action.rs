//! Mutating actions and their lifecycle
//!
//! Lifecycle of a dispatched action:
//! ```text
//! [SUBMITTED] ──tx hash──→ [AWAITING CONFIRMATION] ──mined──→ [CONFIRMED]
//!      │                            │
//!      └──rejected / provider──→ [FAILED] ←──reverted / dropped / timeout
//! ```
//!
//! Adding an action kind means extending `ActionKind` and its two mappings
//! (contract function and affected read fields); the dispatcher is generic.

use crate::domain::abi::AbiValue;
use crate::domain::read_state::{FieldFailure, ReadField};
use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, TxHash, U256};
use std::fmt;
use uuid::Uuid;

/// Kind of mutating action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Deposit,
    Withdraw,
    SetBalance,
    ResetBalance,
    TransferOwnership,
    Freeze,
    Unfreeze,
    RegisterVoter,
    AddCandidate,
    OpenVoting,
    CloseVoting,
    Vote,
}

impl ActionKind {
    pub const ALL: [ActionKind; 12] = [
        ActionKind::Deposit,
        ActionKind::Withdraw,
        ActionKind::SetBalance,
        ActionKind::ResetBalance,
        ActionKind::TransferOwnership,
        ActionKind::Freeze,
        ActionKind::Unfreeze,
        ActionKind::RegisterVoter,
        ActionKind::AddCandidate,
        ActionKind::OpenVoting,
        ActionKind::CloseVoting,
        ActionKind::Vote,
    ];

    /// Contract function invoked by this action.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::SetBalance => "setBalance",
            Self::ResetBalance => "resetBalance",
            Self::TransferOwnership => "transferOwnership",
            Self::Freeze => "freezeAccount",
            Self::Unfreeze => "unfreezeAccount",
            Self::RegisterVoter => "registerVoter",
            Self::AddCandidate => "addCandidate",
            Self::OpenVoting => "openVoting",
            Self::CloseVoting => "closeVoting",
            Self::Vote => "vote",
        }
    }

    /// Read fields this action can change; refreshed after confirmation.
    pub fn affected_fields(self) -> &'static [ReadField] {
        match self {
            Self::Deposit | Self::Withdraw | Self::SetBalance | Self::ResetBalance => {
                &[ReadField::Balance]
            }
            Self::Freeze | Self::Unfreeze => &[ReadField::Frozen],
            Self::OpenVoting | Self::CloseVoting => &[ReadField::VotingOpen],
            Self::AddCandidate => &[ReadField::Candidates],
            Self::TransferOwnership | Self::RegisterVoter | Self::Vote => &[],
        }
    }

    /// Whether the action takes user input.
    pub fn takes_input(self) -> bool {
        !matches!(
            self,
            Self::ResetBalance
                | Self::Freeze
                | Self::Unfreeze
                | Self::OpenVoting
                | Self::CloseVoting
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// A validated action with its typed input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Deposit(Amount),
    Withdraw(Amount),
    SetBalance(Amount),
    ResetBalance,
    TransferOwnership(Address),
    Freeze,
    Unfreeze,
    RegisterVoter(Address),
    AddCandidate(String),
    OpenVoting,
    CloseVoting,
    /// Candidate index
    Vote(U256),
}

impl Action {
    /// Validate raw user input for `kind`.
    ///
    /// Input is ignored for actions that take none.
    pub fn parse(kind: ActionKind, input: &str) -> SessionResult<Self> {
        let invalid = |field: &'static str, reason: String| SessionError::InvalidInput { field, reason };

        let amount = |field: &'static str| -> SessionResult<Amount> {
            Amount::parse_ether(input).map_err(|e| invalid(field, e.to_string()))
        };
        let full_address = |field: &'static str| -> SessionResult<Address> {
            let address = Address::parse(input).map_err(|e| invalid(field, e.to_string()))?;
            if !address.is_full_length() {
                return Err(invalid(field, format!("{address} is not a 20-byte address")));
            }
            Ok(address)
        };

        Ok(match kind {
            ActionKind::Deposit => Self::Deposit(amount("amount")?),
            ActionKind::Withdraw => Self::Withdraw(amount("amount")?),
            ActionKind::SetBalance => Self::SetBalance(amount("balance")?),
            ActionKind::ResetBalance => Self::ResetBalance,
            ActionKind::TransferOwnership => Self::TransferOwnership(full_address("newOwner")?),
            ActionKind::Freeze => Self::Freeze,
            ActionKind::Unfreeze => Self::Unfreeze,
            ActionKind::RegisterVoter => Self::RegisterVoter(full_address("voter")?),
            ActionKind::AddCandidate => {
                let name = input.trim();
                if name.is_empty() {
                    return Err(invalid("name", "candidate name is empty".into()));
                }
                Self::AddCandidate(name.to_string())
            }
            ActionKind::OpenVoting => Self::OpenVoting,
            ActionKind::CloseVoting => Self::CloseVoting,
            ActionKind::Vote => {
                let index = input.trim();
                if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid(
                        "candidateIndex",
                        format!("not a candidate index: {input:?}"),
                    ));
                }
                let index = U256::from_dec_str(index)
                    .map_err(|_| invalid("candidateIndex", "index overflows 256 bits".into()))?;
                Self::Vote(index)
            }
        })
    }

    /// Re-check a typed action built outside `parse`.
    pub fn validate(&self) -> SessionResult<()> {
        let invalid = |field: &'static str, reason: String| -> SessionResult<()> {
            Err(SessionError::InvalidInput { field, reason })
        };
        match self {
            Self::TransferOwnership(address) if !address.is_full_length() => {
                invalid("newOwner", format!("{address} is not a 20-byte address"))
            }
            Self::RegisterVoter(address) if !address.is_full_length() => {
                invalid("voter", format!("{address} is not a 20-byte address"))
            }
            Self::AddCandidate(name) if name.trim().is_empty() => {
                invalid("name", "candidate name is empty".into())
            }
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Deposit(_) => ActionKind::Deposit,
            Self::Withdraw(_) => ActionKind::Withdraw,
            Self::SetBalance(_) => ActionKind::SetBalance,
            Self::ResetBalance => ActionKind::ResetBalance,
            Self::TransferOwnership(_) => ActionKind::TransferOwnership,
            Self::Freeze => ActionKind::Freeze,
            Self::Unfreeze => ActionKind::Unfreeze,
            Self::RegisterVoter(_) => ActionKind::RegisterVoter,
            Self::AddCandidate(_) => ActionKind::AddCandidate,
            Self::OpenVoting => ActionKind::OpenVoting,
            Self::CloseVoting => ActionKind::CloseVoting,
            Self::Vote(_) => ActionKind::Vote,
        }
    }

    /// Contract call arguments.
    pub fn call_args(&self) -> Vec<AbiValue> {
        match self {
            Self::Deposit(amount) | Self::Withdraw(amount) | Self::SetBalance(amount) => {
                vec![AbiValue::Uint(amount.wei())]
            }
            Self::TransferOwnership(address) | Self::RegisterVoter(address) => {
                vec![AbiValue::Address(address.clone())]
            }
            Self::AddCandidate(name) => vec![AbiValue::String(name.clone())],
            Self::Vote(index) => vec![AbiValue::Uint(*index)],
            Self::ResetBalance
            | Self::Freeze
            | Self::Unfreeze
            | Self::OpenVoting
            | Self::CloseVoting => Vec::new(),
        }
    }
}

/// Status of a dispatched action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionStatus {
    /// Awaiting the wallet's signature prompt
    Submitted,
    /// Broadcast, waiting for finality
    AwaitingConfirmation { tx: TxHash },
    /// Mined successfully and affected fields refreshed
    Confirmed { tx: TxHash },
    /// Terminal failure
    Failed(SessionError),
}

impl ActionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed(_))
    }
}

/// Mutation succeeded but the post-confirmation refresh did not
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleReadWarning {
    pub failures: Vec<FieldFailure>,
}

impl StaleReadWarning {
    pub fn fields(&self) -> Vec<ReadField> {
        self.failures.iter().map(|f| f.field).collect()
    }
}

/// A mutating call in flight or just completed
///
/// Not retained past the feedback it triggers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub id: Uuid,
    pub action: Action,
    pub status: ActionStatus,
    pub stale_read: Option<StaleReadWarning>,
}

impl PendingAction {
    pub fn new(action: Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            status: ActionStatus::Submitted,
            stale_read: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, ActionStatus::Confirmed { .. })
    }

    /// Failure reason, if failed.
    pub fn failure(&self) -> Option<&SessionError> {
        match &self.status {
            ActionStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn tx(&self) -> Option<TxHash> {
        match self.status {
            ActionStatus::AwaitingConfirmation { tx } | ActionStatus::Confirmed { tx } => Some(tx),
            _ => None,
        }
    }
}
