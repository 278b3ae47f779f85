//! # Contract Interface Description
//!
//! Parsed from a compiled-contract artifact (`{"abi": [...]}`) or a bare ABI
//! array. Only `function` entries are kept; constructors, events and errors
//! are ignored. Overloaded names keep their first declaration.

use serde::Deserialize;
use sha3::{Digest, Keccak256};
use shared_types::{Address, U256};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const ATM_ARTIFACT: &str = include_str!("../../abi/assessment.json");
const VOTING_ARTIFACT: &str = include_str!("../../abi/voting.json");

/// Interface parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Document is not valid JSON or not an ABI
    #[error("Invalid ABI document: {0}")]
    InvalidDocument(String),

    /// Function entry without a name
    #[error("Function entry {index} has no name")]
    UnnamedFunction { index: usize },
}

// =============================================================================
// TYPES AND VALUES
// =============================================================================

/// Solidity parameter type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiType {
    /// `uintN`
    Uint(u16),
    Address,
    Bool,
    String,
    /// `T[]`
    Array(Box<AbiType>),
    /// Any type this client does not encode
    Other(String),
}

impl AbiType {
    /// Parse a Solidity type name.
    pub fn parse(name: &str) -> Self {
        if let Some(inner) = name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::parse(inner)));
        }
        match name {
            "address" => Self::Address,
            "bool" => Self::Bool,
            "string" => Self::String,
            "uint" => Self::Uint(256),
            _ => name
                .strip_prefix("uint")
                .and_then(|bits| bits.parse::<u16>().ok())
                .filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
                .map(Self::Uint)
                .unwrap_or_else(|| Self::Other(name.to_string())),
        }
    }

    /// Whether a value has this type's shape.
    pub fn accepts(&self, value: &AbiValue) -> bool {
        match (self, value) {
            (Self::Uint(bits), AbiValue::Uint(v)) => *bits >= 256 || v.bits() <= usize::from(*bits),
            (Self::Address, AbiValue::Address(a)) => a.is_full_length(),
            (Self::Bool, AbiValue::Bool(_)) => true,
            (Self::String, AbiValue::String(_)) => true,
            (Self::Array(inner), AbiValue::Array(items)) => items.iter().all(|i| inner.accepts(i)),
            _ => false,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// A call argument or return value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Address(Address),
    Bool(bool),
    String(String),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// `string[]` as owned names.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }
}

// =============================================================================
// FUNCTIONS
// =============================================================================

/// Function state mutability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Pure and view functions never change state.
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Pure | Self::View)
    }
}

/// Named, typed parameter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbiParam {
    pub name: String,
    pub ty: AbiType,
}

/// Declared contract function
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    pub mutability: StateMutability,
}

impl AbiFunction {
    /// Canonical signature: `transferOwnership(address)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.inputs.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// First four bytes of the Keccak-256 hash of the signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = Keccak256::digest(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    pub fn is_read_only(&self) -> bool {
        self.mutability.is_read_only()
    }
}

// =============================================================================
// INTERFACE
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum AbiDocument {
    Artifact { abi: Vec<RawEntry> },
    Bare(Vec<RawEntry>),
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(rename = "stateMutability")]
    state_mutability: Option<StateMutability>,
    /// Pre-0.5 compilers emit `constant` instead of `stateMutability`
    #[serde(default)]
    constant: bool,
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

fn default_entry_type() -> String {
    "function".to_string()
}

/// Interface description of a deployed contract
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ContractInterface {
    functions: BTreeMap<String, AbiFunction>,
}

impl ContractInterface {
    /// Parse an artifact object or a bare ABI array.
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let document: AbiDocument =
            serde_json::from_str(json).map_err(|e| AbiError::InvalidDocument(e.to_string()))?;
        let entries = match document {
            AbiDocument::Artifact { abi } => abi,
            AbiDocument::Bare(entries) => entries,
        };

        let mut functions = BTreeMap::new();
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.kind != "function" {
                continue;
            }
            let name = entry.name.ok_or(AbiError::UnnamedFunction { index })?;
            let mutability = entry.state_mutability.unwrap_or(if entry.constant {
                StateMutability::View
            } else {
                StateMutability::NonPayable
            });
            let convert = |params: Vec<RawParam>| {
                params
                    .into_iter()
                    .map(|p| AbiParam {
                        name: p.name,
                        ty: AbiType::parse(&p.ty),
                    })
                    .collect()
            };
            functions.entry(name.clone()).or_insert(AbiFunction {
                name,
                inputs: convert(entry.inputs),
                outputs: convert(entry.outputs),
                mutability,
            });
        }

        Ok(Self { functions })
    }

    /// Built-in ATM contract interface.
    pub fn atm() -> Self {
        Self::builtin(ATM_ARTIFACT)
    }

    /// Built-in voting contract interface.
    pub fn voting() -> Self {
        Self::builtin(VOTING_ARTIFACT)
    }

    fn builtin(artifact: &str) -> Self {
        match Self::from_json(artifact) {
            Ok(interface) => interface,
            Err(e) => {
                tracing::error!(error = %e, "Built-in contract interface is invalid");
                Self::default()
            }
        }
    }

    /// Combine two interfaces; functions already present win.
    pub fn merged(mut self, other: Self) -> Self {
        for (name, function) in other.functions {
            self.functions.entry(name).or_insert(function);
        }
        self
    }

    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.get(name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiFunction> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
