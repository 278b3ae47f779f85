//! Driving Ports (API - Inbound)
//!
//! What the presentation layer sees: observable `Session` / `ReadState` /
//! `PendingAction` values and one dispatch entry point per action kind.

use crate::domain::{
    Action, ActionKind, PendingAction, ProviderEventOutcome, ReadField, ReadState, RefreshReport,
    Session,
};
use crate::error::SessionResult;
use crate::ports::outbound::ProviderEvent;
use async_trait::async_trait;
use shared_types::{Address, Amount, U256};
use tokio::sync::watch;

/// Primary wallet session API
///
/// Every mutating entry point resolves to a terminal `PendingAction`
/// (`Confirmed` or `Failed`) once the protocol has finished. Precondition
/// failures (`NotReady`, `InvalidInput`, `ActionInProgress`) are returned as
/// `Err` before anything reaches the provider.
#[async_trait]
pub trait WalletSessionApi: Send + Sync {
    /// Current session snapshot.
    fn session(&self) -> Session;

    /// Current read-state snapshot.
    fn read_state(&self) -> ReadState;

    /// Action in flight or most recently completed, if any.
    fn pending_action(&self) -> Option<PendingAction>;

    fn watch_session(&self) -> watch::Receiver<Session>;

    fn watch_read_state(&self) -> watch::Receiver<ReadState>;

    /// Publishes every status transition of the current action.
    fn watch_pending_action(&self) -> watch::Receiver<Option<PendingAction>>;

    /// Silent reconnect using already-authorised accounts.
    ///
    /// Leaves the session `Disconnected` if the wallet has none.
    async fn start(&self) -> SessionResult<Session>;

    /// Request accounts and bind the contract.
    ///
    /// While a connection attempt is in flight, returns that attempt's result
    /// instead of prompting again.
    async fn connect(&self) -> SessionResult<Address>;

    /// Drop the bound account and handle.
    async fn disconnect(&self) -> Session;

    /// Refresh the given fields.
    ///
    /// Per-field failures are reported in the returned report; other fields
    /// are still applied.
    async fn refresh(&self, fields: &[ReadField]) -> SessionResult<RefreshReport>;

    /// Refresh every field the bound interface can serve.
    async fn refresh_all(&self) -> SessionResult<RefreshReport>;

    /// Apply a provider notification (deferred while a mutation is in flight).
    async fn handle_provider_event(&self, event: ProviderEvent) -> ProviderEventOutcome;

    /// Dispatch an already-typed action.
    async fn dispatch_action(&self, action: Action) -> SessionResult<PendingAction>;

    /// Dispatch from raw user input (form field text).
    async fn dispatch(&self, kind: ActionKind, input: &str) -> SessionResult<PendingAction>;

    async fn deposit(&self, amount: Amount) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::Deposit(amount)).await
    }

    async fn withdraw(&self, amount: Amount) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::Withdraw(amount)).await
    }

    async fn set_balance(&self, balance: Amount) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::SetBalance(balance)).await
    }

    async fn reset_balance(&self) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::ResetBalance).await
    }

    async fn transfer_ownership(&self, new_owner: Address) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::TransferOwnership(new_owner)).await
    }

    async fn freeze(&self) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::Freeze).await
    }

    async fn unfreeze(&self) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::Unfreeze).await
    }

    async fn register_voter(&self, voter: Address) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::RegisterVoter(voter)).await
    }

    async fn add_candidate(&self, name: String) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::AddCandidate(name)).await
    }

    async fn open_voting(&self) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::OpenVoting).await
    }

    async fn close_voting(&self) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::CloseVoting).await
    }

    /// Vote for the candidate at `candidate_index`.
    async fn vote(&self, candidate_index: U256) -> SessionResult<PendingAction> {
        self.dispatch_action(Action::Vote(candidate_index)).await
    }
}
