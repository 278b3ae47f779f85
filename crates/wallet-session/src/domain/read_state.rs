//! Read-state cache values
//!
//! The cache is a fixed set of named fields, each overwritten independently on
//! refresh. A field that has never been refreshed for the bound account is
//! `None`; nothing is ever merged or computed locally.

use crate::domain::abi::AbiValue;
use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use std::fmt;

/// Named cache field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadField {
    Balance,
    Frozen,
    VotingOpen,
    Candidates,
}

impl ReadField {
    /// Every known field.
    pub const ALL: [ReadField; 4] = [
        ReadField::Balance,
        ReadField::Frozen,
        ReadField::VotingOpen,
        ReadField::Candidates,
    ];

    /// Read-only contract function backing this field.
    pub fn query_function(self) -> &'static str {
        match self {
            Self::Balance => "getBalance",
            Self::Frozen => "frozen",
            Self::VotingOpen => "votingOpen",
            Self::Candidates => "getCandidates",
        }
    }
}

impl fmt::Display for ReadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Balance => "balance",
            Self::Frozen => "frozen",
            Self::VotingOpen => "votingOpen",
            Self::Candidates => "candidates",
        };
        f.write_str(label)
    }
}

/// A decoded field value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Balance(Amount),
    Frozen(bool),
    VotingOpen(bool),
    Candidates(Vec<String>),
}

impl FieldValue {
    /// Decode a query result for `field`.
    pub fn decode(field: ReadField, value: &AbiValue) -> Option<Self> {
        match field {
            ReadField::Balance => value.as_uint().map(|wei| Self::Balance(Amount::from_wei(wei))),
            ReadField::Frozen => value.as_bool().map(Self::Frozen),
            ReadField::VotingOpen => value.as_bool().map(Self::VotingOpen),
            ReadField::Candidates => value.as_string_list().map(Self::Candidates),
        }
    }

    pub fn field(&self) -> ReadField {
        match self {
            Self::Balance(_) => ReadField::Balance,
            Self::Frozen(_) => ReadField::Frozen,
            Self::VotingOpen(_) => ReadField::VotingOpen,
            Self::Candidates(_) => ReadField::Candidates,
        }
    }
}

/// Last-known on-chain values for the bound account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    /// Account these values were read for
    pub account: Option<Address>,
    pub balance: Option<Amount>,
    pub frozen: Option<bool>,
    pub voting_open: Option<bool>,
    pub candidates: Option<Vec<String>>,
}

impl ReadState {
    /// Empty cache owned by `account`.
    pub fn for_account(account: Option<Address>) -> Self {
        Self {
            account,
            ..Self::default()
        }
    }

    /// Overwrite one field.
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::Balance(v) => self.balance = Some(v),
            FieldValue::Frozen(v) => self.frozen = Some(v),
            FieldValue::VotingOpen(v) => self.voting_open = Some(v),
            FieldValue::Candidates(v) => self.candidates = Some(v),
        }
    }

    pub fn get(&self, field: ReadField) -> Option<FieldValue> {
        match field {
            ReadField::Balance => self.balance.map(FieldValue::Balance),
            ReadField::Frozen => self.frozen.map(FieldValue::Frozen),
            ReadField::VotingOpen => self.voting_open.map(FieldValue::VotingOpen),
            ReadField::Candidates => self.candidates.clone().map(FieldValue::Candidates),
        }
    }

    pub fn is_populated(&self, field: ReadField) -> bool {
        self.get(field).is_some()
    }
}

/// One field's failed query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: ReadField,
    pub reason: String,
}

impl FieldFailure {
    pub fn to_error(&self) -> SessionError {
        SessionError::RefreshFailed {
            field: self.field,
            reason: self.reason.clone(),
        }
    }
}

/// Outcome of a refresh
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    /// Cache contents after the refresh was applied
    pub state: ReadState,
    /// Fields overwritten with fresh values
    pub refreshed: Vec<ReadField>,
    /// Fields whose query failed; these kept their previous value
    pub failures: Vec<FieldFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_fields(&self) -> Vec<ReadField> {
        self.failures.iter().map(|f| f.field).collect()
    }

    pub fn errors(&self) -> Vec<SessionError> {
        self.failures.iter().map(FieldFailure::to_error).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::U256;

    #[test]
    fn test_decode_matches_field_shape() {
        let wei = AbiValue::Uint(U256::exp10(18));
        assert_eq!(
            FieldValue::decode(ReadField::Balance, &wei),
            Some(FieldValue::Balance(Amount::from_ether(1)))
        );
        assert_eq!(FieldValue::decode(ReadField::Frozen, &wei), None);
        assert_eq!(
            FieldValue::decode(ReadField::VotingOpen, &AbiValue::Bool(true)),
            Some(FieldValue::VotingOpen(true))
        );
        let names = AbiValue::Array(vec![
            AbiValue::String("alice".into()),
            AbiValue::String("bob".into()),
        ]);
        assert_eq!(
            FieldValue::decode(ReadField::Candidates, &names),
            Some(FieldValue::Candidates(vec!["alice".into(), "bob".into()]))
        );
    }

    #[test]
    fn test_apply_overwrites_single_field() {
        let mut state = ReadState::default();
        state.apply(FieldValue::Balance(Amount::from_ether(1)));
        state.apply(FieldValue::Frozen(true));
        state.apply(FieldValue::Balance(Amount::from_ether(2)));

        assert_eq!(state.balance, Some(Amount::from_ether(2)));
        assert_eq!(state.frozen, Some(true));
        assert!(!state.is_populated(ReadField::Candidates));
    }

    #[test]
    fn test_for_account_starts_empty() {
        let account = Address::parse("0xdef").unwrap();
        let state = ReadState::for_account(Some(account.clone()));
        assert_eq!(state.account, Some(account));
        assert!(ReadField::ALL.iter().all(|f| !state.is_populated(*f)));
    }

    #[test]
    fn test_report_errors() {
        let report = RefreshReport {
            state: ReadState::default(),
            refreshed: vec![ReadField::Balance],
            failures: vec![FieldFailure {
                field: ReadField::Candidates,
                reason: "timeout".into(),
            }],
        };
        assert!(!report.is_complete());
        assert_eq!(report.failed_fields(), vec![ReadField::Candidates]);
        assert!(matches!(
            report.errors()[0],
            SessionError::RefreshFailed {
                field: ReadField::Candidates,
                ..
            }
        ));
    }
}
