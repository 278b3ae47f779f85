//! # Core Value Types
//!
//! - **Identity**: `Address`
//! - **Value**: `Amount` (wei, displayed and entered as ether)
//! - **Ledger**: `TxHash`

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// ADDRESS
// =============================================================================

/// Number of hex digits in a full 20-byte address.
pub const ADDRESS_HEX_LEN: usize = 40;

/// A `0x`-prefixed hex account or contract address, normalised to lowercase.
///
/// Wallet providers are authoritative for the accounts they report, so any
/// non-empty hex string is accepted here. Callers that need a full 20-byte
/// address (contract binding, ownership transfer) check `is_full_length()`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse a `0x`-prefixed hex address.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| ParseError::MissingPrefix(text.to_string()))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::NotHex(text.to_string()));
        }
        if digits.len() > ADDRESS_HEX_LEN {
            return Err(ParseError::AddressTooLong {
                digits: digits.len(),
            });
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// The 20-byte address from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// True if this is a full 20-byte address.
    #[must_use]
    pub fn is_full_length(&self) -> bool {
        self.0.len() == ADDRESS_HEX_LEN + 2
    }

    /// The normalised `0x...` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display: `0x1234...7890`.
    ///
    /// Short addresses are returned unchanged.
    #[must_use]
    pub fn short(&self) -> String {
        if self.0.len() < 12 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

// =============================================================================
// AMOUNT
// =============================================================================

/// Decimal places of ether.
pub const ETHER_DECIMALS: usize = 18;

/// An amount of wei.
///
/// Entered and displayed as ether (`1.5`), stored as an exact integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Amount(pub U256);

impl Amount {
    /// Zero wei.
    #[must_use]
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Amount from a raw wei count.
    #[must_use]
    pub fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    /// Whole ether.
    #[must_use]
    pub fn from_ether(ether: u64) -> Self {
        Self(U256::from(ether) * U256::exp10(ETHER_DECIMALS))
    }

    /// The raw wei count.
    #[must_use]
    pub fn wei(&self) -> U256 {
        self.0
    }

    /// Parse a decimal ether string (`"1"`, `"0.5"`, `".25"`) into wei.
    ///
    /// No sign, no exponent, at most 18 fractional digits.
    pub fn parse_ether(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(ParseError::NotDecimal(text.to_string()));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(ParseError::TooManyDecimals {
                places: fraction.len(),
                max: ETHER_DECIMALS,
            });
        }

        let whole = if whole.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(whole).map_err(|_| ParseError::Overflow)?
        };
        let fraction = if fraction.is_empty() {
            U256::zero()
        } else {
            let padded = format!("{fraction:0<width$}", width = ETHER_DECIMALS);
            U256::from_dec_str(&padded).map_err(|_| ParseError::Overflow)?
        };

        whole
            .checked_mul(U256::exp10(ETHER_DECIMALS))
            .and_then(|wei| wei.checked_add(fraction))
            .map(Self)
            .ok_or(ParseError::Overflow)
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({self} ETH)")
    }
}

impl fmt::Display for Amount {
    /// Ether with at least one fractional digit: `1.0`, `1.5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = U256::exp10(ETHER_DECIMALS);
        let whole = self.0 / unit;
        let fraction = format!("{:0>width$}", (self.0 % unit).to_string(), width = ETHER_DECIMALS);
        let fraction = fraction.trim_end_matches('0');
        let fraction = if fraction.is_empty() { "0" } else { fraction };
        write!(f, "{whole}.{fraction}")
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_ether(s)
    }
}

// =============================================================================
// TRANSACTION HASH
// =============================================================================

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
