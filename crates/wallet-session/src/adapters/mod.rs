//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound wallet-provider port.

mod in_memory;

pub use in_memory::InMemoryWallet;
