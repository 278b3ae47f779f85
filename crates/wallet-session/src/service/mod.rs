//! Wallet Session Service - Core session logic
//!
//! Owns the only mutable shared state (`Session` and `ReadState`) and
//! serialises every change through one mutex that is never held across an
//! await point. Observers get snapshots through `watch` channels.
//!
//! Two rules govern concurrency:
//! - at most one mutating action is in flight (`in_flight`)
//! - provider notifications and `disconnect()` wait until that slot is free,
//!   so a handle is never rebound mid-transaction
//!
//! Every change of binding bumps `epoch`; refresh results computed against an
//! older binding are discarded rather than applied to the new account.
//!
//! A connection attempt counts as finished only after its initial refresh, so
//! every caller that joined the attempt sees the same populated cache.

mod dispatch;
mod refresh;

use crate::binding::{bind, ContractHandle};
use crate::config::SessionConfig;
use crate::domain::{
    Action, ActionKind, ConnectionPhase, PendingAction, PhaseEvent, ProviderEventOutcome,
    ReadField, ReadState, RefreshReport, Session,
};
use crate::error::{SessionError, SessionResult};
use crate::metrics;
use crate::ports::inbound::WalletSessionApi;
use crate::ports::outbound::{ProviderEvent, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Address;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where a connection attempt gets its accounts from
enum AccountSource {
    /// Prompt the user
    Prompt,
    /// Already authorised, discovered silently
    Known(Vec<Address>),
}

/// Mutable session state, guarded by `WalletSession::inner`
struct SessionInner<P> {
    phase: ConnectionPhase,
    account: Option<Address>,
    contract: Option<ContractHandle<P>>,
    /// Bumped on every change of binding
    epoch: u64,
    /// Kind of the mutating action currently in flight
    in_flight: Option<ActionKind>,
    /// Id of the latest connection attempt
    attempt: u64,
    /// Failure of the most recent connection attempt
    last_connect_error: Option<SessionError>,
}

impl<P: WalletProvider> SessionInner<P> {
    fn snapshot(&self) -> Session {
        Session {
            phase: self.phase,
            account: self.account.clone(),
            contract: self.contract.as_ref().map(|c| c.address().clone()),
        }
    }
}

/// Wallet session bound to one provider
pub struct WalletSession<P: WalletProvider> {
    config: SessionConfig,
    provider: Arc<P>,
    inner: Mutex<SessionInner<P>>,
    session_tx: watch::Sender<Session>,
    read_tx: watch::Sender<ReadState>,
    pending_tx: watch::Sender<Option<PendingAction>>,
    /// True from the start of a connection attempt until it has finished
    connecting_tx: watch::Sender<bool>,
    /// Signalled whenever the in-flight slot is released
    settled: Notify,
    /// Handed to action tasks so they outlive the caller's future
    this: Weak<Self>,
}

impl<P: WalletProvider> WalletSession<P> {
    /// Create a session. The initial phase comes from provider detection.
    pub fn new(config: SessionConfig, provider: Arc<P>) -> Arc<Self> {
        let phase = ConnectionPhase::initial(provider.detect());
        info!(%phase, contract = %config.contract_address, "Wallet session created");

        Arc::new_cyclic(|this| Self {
            config,
            provider,
            inner: Mutex::new(SessionInner {
                phase,
                account: None,
                contract: None,
                epoch: 0,
                in_flight: None,
                attempt: 0,
                last_connect_error: None,
            }),
            session_tx: watch::Sender::new(Session::unbound(phase)),
            read_tx: watch::Sender::new(ReadState::default()),
            pending_tx: watch::Sender::new(None),
            connecting_tx: watch::Sender::new(false),
            settled: Notify::new(),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Kind of the action currently in flight, if any.
    pub fn action_in_flight(&self) -> Option<ActionKind> {
        self.inner.lock().in_flight
    }

    /// Apply provider notifications in the background.
    ///
    /// The task holds only a weak reference and ends when the session is
    /// dropped or the provider closes its notification channel.
    pub fn spawn_notification_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut events = self.provider.subscribe();

        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Provider notifications lagged, resyncing accounts");
                        let Some(session) = weak.upgrade() else { break };
                        match session.provider.current_accounts().await {
                            Ok(accounts) => ProviderEvent::AccountsChanged(accounts),
                            Err(e) => {
                                warn!(error = %e, "Account resync failed");
                                continue;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                let Some(session) = weak.upgrade() else { break };
                let outcome = session.handle_provider_event(event).await;
                debug!(?outcome, "Provider notification applied");
            }
            debug!("Notification loop stopped");
        })
    }

    // -------------------------------------------------------------------------
    // State helpers (called with `inner` locked)
    // -------------------------------------------------------------------------

    /// Apply a phase event; invalid events are ignored.
    fn transition(&self, inner: &mut SessionInner<P>, event: PhaseEvent) -> bool {
        match inner.phase.on(event) {
            Some(next) => {
                debug!(from = %inner.phase, to = %next, ?event, "Phase transition");
                inner.phase = next;
                self.session_tx.send_replace(inner.snapshot());
                true
            }
            None => {
                debug!(phase = %inner.phase, ?event, "Ignoring phase event");
                false
            }
        }
    }

    /// Drop account, handle and cache; returns to `Disconnected`.
    fn unbind(&self, inner: &mut SessionInner<P>) {
        inner.account = None;
        inner.contract = None;
        inner.epoch += 1;
        self.read_tx.send_replace(ReadState::default());
        if !self.transition(inner, PhaseEvent::Disconnect) {
            self.session_tx.send_replace(inner.snapshot());
        }
    }

    /// Bind a fresh handle for `accounts[0]` (phase must be `Connecting`).
    fn bind_account(
        &self,
        inner: &mut SessionInner<P>,
        accounts: Vec<Address>,
    ) -> SessionResult<Address> {
        let signer = accounts.into_iter().next();
        let result = bind(
            &self.config.contract_address,
            Arc::clone(&self.config.interface),
            signer,
            Arc::clone(&self.provider),
        );

        match result {
            Ok(handle) => {
                let account = handle.signer().clone();
                inner.account = Some(account.clone());
                inner.contract = Some(handle);
                inner.last_connect_error = None;
                self.read_tx.send_replace(ReadState::for_account(Some(account.clone())));
                self.transition(inner, PhaseEvent::Bound);
                info!(%account, "Wallet connected");
                metrics::record_connect("connected");
                Ok(account)
            }
            Err(e) => {
                let error = SessionError::from(e);
                self.fail_connect(inner, error.clone());
                Err(error)
            }
        }
    }

    fn fail_connect(&self, inner: &mut SessionInner<P>, error: SessionError) {
        warn!(error = %error, "Connection attempt failed");
        inner.account = None;
        inner.contract = None;
        inner.last_connect_error = Some(error);
        self.transition(inner, PhaseEvent::ConnectFailed);
        metrics::record_connect("failed");
    }

    /// Run `apply` once no mutating action is in flight.
    ///
    /// The check and the change happen under one lock, so a dispatch cannot
    /// slip in between.
    async fn when_settled<T, F>(&self, what: &str, mut apply: F) -> T
    where
        F: FnMut(&mut SessionInner<P>) -> T,
    {
        let mut deferred = false;
        loop {
            let notified = self.settled.notified();
            {
                let mut inner = self.inner.lock();
                match inner.in_flight {
                    None => return apply(&mut *inner),
                    Some(kind) if !deferred => {
                        warn!(action = %kind, "Deferring {what} until action completes");
                        deferred = true;
                    }
                    Some(_) => {}
                }
            }
            notified.await;
        }
    }

    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------

    async fn connect_with(&self, source: AccountSource) -> SessionResult<Address> {
        let started = {
            let mut inner = self.inner.lock();
            if inner.phase == ConnectionPhase::NoProvider {
                return Err(SessionError::ProviderUnavailable);
            }
            let joining = *self.connecting_tx.borrow();
            if joining {
                None
            } else {
                if inner.phase == ConnectionPhase::Connected {
                    if let Some(account) = &inner.account {
                        return Ok(account.clone());
                    }
                }
                self.transition(&mut inner, PhaseEvent::ConnectStarted);
                inner.epoch += 1;
                inner.attempt += 1;
                inner.last_connect_error = None;
                self.connecting_tx.send_replace(true);
                Some((inner.epoch, inner.attempt))
            }
        };
        let Some((epoch, attempt)) = started else {
            debug!("Connection already in progress, awaiting its result");
            return self.await_connection().await;
        };

        let _attempt = AttemptGuard {
            session: self,
            epoch,
            attempt,
        };

        let accounts = match source {
            AccountSource::Known(accounts) => Ok(accounts),
            AccountSource::Prompt => self.provider.request_accounts().await,
        };

        let result = {
            let mut inner = self.inner.lock();
            if inner.epoch != epoch || inner.phase != ConnectionPhase::Connecting {
                // Disconnected while the prompt was open
                return Err(inner
                    .last_connect_error
                    .clone()
                    .unwrap_or(SessionError::NotReady { phase: inner.phase }));
            }

            match accounts {
                Ok(accounts) => self.bind_account(&mut inner, accounts),
                Err(e) => {
                    let error = SessionError::from_connect(e);
                    self.fail_connect(&mut inner, error.clone());
                    Err(error)
                }
            }
        };

        if result.is_ok() {
            self.refresh_after_binding().await;
        }
        result
    }

    /// Wait for the in-flight connection attempt, initial refresh included,
    /// and return its result.
    async fn await_connection(&self) -> SessionResult<Address> {
        let mut connecting_rx = self.connecting_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = connecting_rx.wait_for(|connecting| !*connecting).await;

        let inner = self.inner.lock();
        match (inner.phase, &inner.account) {
            (ConnectionPhase::Connected, Some(account)) => Ok(account.clone()),
            (phase, _) => Err(inner
                .last_connect_error
                .clone()
                .unwrap_or(SessionError::NotReady { phase })),
        }
    }

    async fn refresh_after_binding(&self) {
        if !self.config.refresh_on_connect {
            return;
        }
        match self.refresh_all().await {
            Ok(report) if !report.is_complete() => {
                warn!(fields = ?report.failed_fields(), "Initial refresh incomplete");
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Initial refresh skipped"),
        }
    }

    fn apply_provider_event(
        &self,
        inner: &mut SessionInner<P>,
        event: ProviderEvent,
    ) -> ProviderEventOutcome {
        let account = match event {
            ProviderEvent::Disconnected => None,
            ProviderEvent::AccountsChanged(accounts) => accounts.into_iter().next(),
        };

        let Some(account) = account else {
            if matches!(
                inner.phase,
                ConnectionPhase::NoProvider | ConnectionPhase::Disconnected
            ) {
                return ProviderEventOutcome::Ignored;
            }
            info!("Wallet disconnected");
            self.unbind(inner);
            return ProviderEventOutcome::Disconnected;
        };

        if inner.phase != ConnectionPhase::Connected || inner.account.as_ref() == Some(&account) {
            return ProviderEventOutcome::Ignored;
        }

        info!(from = ?inner.account, to = %account, "Account changed, rebinding contract");
        inner.account = None;
        inner.contract = None;
        inner.epoch += 1;
        self.read_tx.send_replace(ReadState::for_account(Some(account.clone())));
        self.transition(inner, PhaseEvent::AccountChanged);

        match self.bind_account(inner, vec![account]) {
            Ok(account) => ProviderEventOutcome::Switched { account },
            Err(e) => ProviderEventOutcome::SwitchFailed(e),
        }
    }
}

/// Ends a connection attempt on every exit path.
///
/// Resets `Connecting` to `Disconnected` if the connect future is dropped
/// mid-flight, then releases callers waiting on the attempt.
struct AttemptGuard<'a, P: WalletProvider> {
    session: &'a WalletSession<P>,
    epoch: u64,
    attempt: u64,
}

impl<P: WalletProvider> Drop for AttemptGuard<'_, P> {
    fn drop(&mut self) {
        let mut inner = self.session.inner.lock();
        if inner.epoch == self.epoch && inner.phase == ConnectionPhase::Connecting {
            warn!("Connection attempt abandoned");
            inner.epoch += 1;
            self.session.transition(&mut inner, PhaseEvent::Abandoned);
            metrics::record_connect("abandoned");
        }
        if inner.attempt == self.attempt {
            self.session.connecting_tx.send_replace(false);
        }
    }
}

#[async_trait]
impl<P: WalletProvider> WalletSessionApi for WalletSession<P> {
    fn session(&self) -> Session {
        self.session_tx.borrow().clone()
    }

    fn read_state(&self) -> ReadState {
        self.read_tx.borrow().clone()
    }

    fn pending_action(&self) -> Option<PendingAction> {
        self.pending_tx.borrow().clone()
    }

    fn watch_session(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }

    fn watch_read_state(&self) -> watch::Receiver<ReadState> {
        self.read_tx.subscribe()
    }

    fn watch_pending_action(&self) -> watch::Receiver<Option<PendingAction>> {
        self.pending_tx.subscribe()
    }

    async fn start(&self) -> SessionResult<Session> {
        let phase = self.inner.lock().phase;
        match phase {
            ConnectionPhase::NoProvider => return Err(SessionError::ProviderUnavailable),
            ConnectionPhase::Disconnected => {}
            _ => return Ok(self.session()),
        }

        let accounts = self
            .provider
            .current_accounts()
            .await
            .map_err(SessionError::from_connect)?;
        if accounts.is_empty() {
            debug!("No authorised accounts, waiting for user to connect");
            return Ok(self.session());
        }

        self.connect_with(AccountSource::Known(accounts)).await?;
        Ok(self.session())
    }

    async fn connect(&self) -> SessionResult<Address> {
        self.connect_with(AccountSource::Prompt).await
    }

    async fn disconnect(&self) -> Session {
        self.when_settled("disconnect", |inner| {
            if inner.phase != ConnectionPhase::NoProvider {
                info!("Disconnecting wallet");
                self.unbind(inner);
            }
            inner.snapshot()
        })
        .await
    }

    async fn refresh(&self, fields: &[ReadField]) -> SessionResult<RefreshReport> {
        let (handle, epoch) = self.bound_handle()?;
        Ok(self.refresh_fields(&handle, epoch, fields).await)
    }

    async fn refresh_all(&self) -> SessionResult<RefreshReport> {
        let (handle, epoch) = self.bound_handle()?;
        let fields: Vec<ReadField> = ReadField::ALL
            .into_iter()
            .filter(|field| handle.supports(field.query_function()))
            .collect();
        Ok(self.refresh_fields(&handle, epoch, &fields).await)
    }

    async fn handle_provider_event(&self, event: ProviderEvent) -> ProviderEventOutcome {
        let outcome = self
            .when_settled("provider notification", |inner| {
                self.apply_provider_event(inner, event.clone())
            })
            .await;

        if let ProviderEventOutcome::Switched { .. } = outcome {
            // Always refresh after a switch; the cache was invalidated
            match self.refresh_all().await {
                Ok(report) if !report.is_complete() => {
                    warn!(fields = ?report.failed_fields(), "Refresh after account switch incomplete");
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Refresh after account switch skipped"),
            }
        }
        outcome
    }

    async fn dispatch_action(&self, action: Action) -> SessionResult<PendingAction> {
        self.execute(move || action.validate().map(|()| action)).await
    }

    async fn dispatch(&self, kind: ActionKind, input: &str) -> SessionResult<PendingAction> {
        self.execute(|| Action::parse(kind, input)).await
    }
}
