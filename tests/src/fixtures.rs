//! Shared fixtures for the scenario suite.

use shared_types::{Address, Amount};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use wallet_session::{
    ActionStatus, ConnectionPhase, ContractInterface, InMemoryWallet, SessionConfig,
    WalletSession, WalletSessionApi,
};

pub type DevSession = WalletSession<InMemoryWallet>;

/// Upper bound for anything a scenario waits on.
pub const GUARD: Duration = Duration::from_secs(5);

pub const OWNER: &str = "0xABC";
pub const OTHER: &str = "0xDEF";
pub const VOTER_A: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
pub const VOTER_B: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";

pub fn addr(text: &str) -> Address {
    Address::parse(text).expect("fixture address")
}

pub fn ether(text: &str) -> Amount {
    Amount::parse_ether(text).expect("fixture amount")
}

/// Interface declaring both the ATM and the voting functions.
pub fn full_config() -> SessionConfig {
    SessionConfig::default()
        .with_interface(ContractInterface::atm().merged(ContractInterface::voting()))
}

pub fn session(config: SessionConfig, wallet: &Arc<InMemoryWallet>) -> Arc<DevSession> {
    WalletSession::new(config, Arc::clone(wallet))
}

pub async fn connected(config: SessionConfig, wallet: &Arc<InMemoryWallet>) -> Arc<DevSession> {
    let session = session(config, wallet);
    session.connect().await.expect("connect");
    session
}

pub async fn wait_for_status<F>(session: &DevSession, predicate: F)
where
    F: Fn(&ActionStatus) -> bool,
{
    let mut pending = session.watch_pending_action();
    timeout(
        GUARD,
        pending.wait_for(|p| p.as_ref().is_some_and(|p| predicate(&p.status))),
    )
    .await
    .expect("status never reached")
    .expect("session dropped");
}

pub async fn wait_for_phase(session: &DevSession, phase: ConnectionPhase) {
    let mut rx = session.watch_session();
    timeout(GUARD, rx.wait_for(|s| s.phase == phase))
        .await
        .expect("phase never reached")
        .expect("session dropped");
}

pub async fn wait_for_account(session: &DevSession, account: &Address) {
    let mut rx = session.watch_session();
    timeout(GUARD, rx.wait_for(|s| s.account.as_ref() == Some(account)))
        .await
        .expect("account never selected")
        .expect("session dropped");
}
