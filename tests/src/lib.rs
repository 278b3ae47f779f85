//! # Wallet Session Test Suite
//!
//! End-to-end scenarios driving `WalletSession` against the in-memory wallet.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Accounts, amounts, session builders
//! └── scenarios/
//!     ├── connection.rs # Connect, reconnect, abandon, account switch
//!     ├── atm.rs        # ATM action lifecycle
//!     ├── voting.rs     # Voting action lifecycle
//!     ├── metrics.rs    # Prometheus counters
//!     ├── read_state.rs # Refresh idempotence and failure isolation
//!     └── telemetry.rs  # Subscriber bootstrap
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p session-tests
//! cargo test -p session-tests scenarios::voting::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod scenarios;
