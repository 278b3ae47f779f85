//! # Shared Types Crate
//!
//! Value types used across the workspace.
//!
//! ## Design Principles
//!
//! - **Parse, don't validate**: every value that arrives as user text
//!   (`Address`, `Amount`) has a fallible constructor and is immutable after.
//! - **Chain units only**: amounts are stored in wei; ether is a display and
//!   input format, never an arithmetic one.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
