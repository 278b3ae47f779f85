//! Domain module for the wallet session
//!
//! ## Core Modules
//! - phase: Connection phase state machine and session snapshot
//! - abi: Contract interface description
//! - read_state: Read-state cache fields and refresh reports
//! - action: Mutating actions and their lifecycle

pub mod abi;
pub mod action;
pub mod phase;
pub mod read_state;

pub use abi::{AbiError, AbiFunction, AbiParam, AbiType, AbiValue, ContractInterface, StateMutability};
pub use action::{Action, ActionKind, ActionStatus, PendingAction, StaleReadWarning};
pub use phase::{ConnectionPhase, PhaseEvent, ProviderEventOutcome, Session};
pub use read_state::{FieldFailure, FieldValue, ReadField, ReadState, RefreshReport};
