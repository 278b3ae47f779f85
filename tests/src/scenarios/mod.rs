//! Scenario modules, one per user-facing flow.

mod atm;
mod connection;
mod metrics;
mod read_state;
mod telemetry;
mod voting;
