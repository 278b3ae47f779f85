//! # Error Types
//!
//! Parse failures for the shared value types.

use thiserror::Error;

/// Errors produced while parsing user-supplied values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only.
    #[error("value is empty")]
    Empty,

    /// Address is missing the `0x` prefix.
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    /// Address contains a non-hex character or has no digits.
    #[error("address is not hex: {0}")]
    NotHex(String),

    /// Address has more than 40 hex digits.
    #[error("address too long: {digits} hex digits, max 40")]
    AddressTooLong { digits: usize },

    /// Amount is not a plain decimal number.
    #[error("amount is not a decimal number: {0}")]
    NotDecimal(String),

    /// Amount has more fractional digits than the unit supports.
    #[error("too many decimal places: {places}, max {max}")]
    TooManyDecimals { places: usize, max: usize },

    /// Amount does not fit in 256 bits of wei.
    #[error("amount overflows 256 bits")]
    Overflow,
}
