//! Action dispatcher
//!
//! The uniform envelope around every state-changing call:
//!
//! ```text
//! precondition ──→ submit ──→ await confirmation ──→ refresh affected fields ──→ report
//!   (Err)          (Failed)        (Failed)           (StaleReadWarning)      (Confirmed)
//! ```
//!
//! Precondition failures are returned as `Err` before the provider is touched.
//! Everything after that runs in its own task, which owns the in-flight slot
//! and always ends in a terminal `PendingAction`. Dropping the caller's future
//! only stops the caller from waiting; the action itself runs to completion.

use super::WalletSession;
use crate::binding::ContractHandle;
use crate::domain::{Action, ActionKind, ActionStatus, ConnectionPhase, PendingAction, StaleReadWarning};
use crate::error::{CallError, SessionError, SessionResult};
use crate::metrics;
use crate::ports::outbound::{ReceiptStatus, WalletProvider};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Releases the in-flight slot on every exit path of the action task
struct InFlightSlot<P: WalletProvider> {
    session: Arc<WalletSession<P>>,
}

impl<P: WalletProvider> Drop for InFlightSlot<P> {
    fn drop(&mut self) {
        self.session.release_slot();
    }
}

impl<P: WalletProvider> WalletSession<P> {
    /// Run the full protocol for the action produced by `build`.
    ///
    /// `build` runs after the connection check, so an invalid input on a
    /// disconnected session reports `NotReady`.
    pub(super) async fn execute<F>(&self, build: F) -> SessionResult<PendingAction>
    where
        F: FnOnce() -> SessionResult<Action> + Send,
    {
        let (action, handle, epoch) = {
            let mut inner = self.inner.lock();
            let handle = match (&inner.phase, &inner.contract) {
                (ConnectionPhase::Connected, Some(handle)) => handle.clone(),
                (phase, _) => {
                    return Err(SessionError::NotReady { phase: *phase });
                }
            };

            let action = build()?;
            let kind = action.kind();
            handle
                .prepare(kind.function_name(), action.call_args(), false)
                .map_err(|e| unsupported(kind, e))?;

            if let Some(in_flight) = inner.in_flight {
                return Err(SessionError::ActionInProgress { kind: in_flight });
            }
            inner.in_flight = Some(kind);
            (action, handle, inner.epoch)
        };

        let Some(session) = self.this.upgrade() else {
            // Only reachable while the last handle to the session is dropping
            self.release_slot();
            return Err(SessionError::NotReady {
                phase: ConnectionPhase::Disconnected,
            });
        };
        let slot = InFlightSlot {
            session: Arc::clone(&session),
        };
        let kind = action.kind();
        let lifecycle = tokio::spawn(async move {
            let _slot = slot;
            session.run_action(action, handle, epoch).await
        });

        lifecycle.await.map_err(|e| {
            error!(action = %kind, error = %e, "Action task ended abnormally");
            SessionError::NeverConfirmed {
                reason: format!("action task ended abnormally: {e}"),
            }
        })
    }

    /// Submit, await confirmation, refresh and report.
    async fn run_action(
        &self,
        action: Action,
        handle: ContractHandle<P>,
        epoch: u64,
    ) -> PendingAction {
        let kind = action.kind();
        let mut pending = PendingAction::new(action);
        self.publish(&pending);
        info!(action = %kind, id = %pending.id, "Submitting action");

        // Submit
        let tx = match handle.submit(kind.function_name(), pending.action.call_args()).await {
            Ok(tx) => tx,
            Err(e) => return self.fail(pending, SessionError::from_submission(e)),
        };
        pending.status = ActionStatus::AwaitingConfirmation { tx };
        self.publish(&pending);
        info!(action = %kind, %tx, "Awaiting confirmation");

        // Await confirmation
        let waited = timeout(
            self.config.confirmation_timeout,
            handle.wait(tx, self.config.confirmations),
        )
        .await;
        let failure = match waited {
            Ok(Ok(receipt)) => match receipt.status {
                ReceiptStatus::Success => None,
                ReceiptStatus::Reverted { reason } => Some(SessionError::CallReverted { reason }),
            },
            Ok(Err(e)) => Some(SessionError::from_confirmation(e)),
            Err(_) => Some(SessionError::NeverConfirmed {
                reason: format!(
                    "not confirmed within {}s",
                    self.config.confirmation_timeout.as_secs()
                ),
            }),
        };
        if let Some(reason) = failure {
            return self.fail(pending, reason);
        }

        // Refresh what the action can have changed before reporting success
        let fields = kind.affected_fields();
        if !fields.is_empty() {
            let report = self.refresh_fields(&handle, epoch, fields).await;
            if !report.is_complete() {
                warn!(action = %kind, fields = ?report.failed_fields(), "Action confirmed but read state is stale");
                metrics::record_stale_read();
                pending.stale_read = Some(StaleReadWarning {
                    failures: report.failures,
                });
            }
        }

        pending.status = ActionStatus::Confirmed { tx };
        self.publish(&pending);
        info!(action = %kind, %tx, "Action confirmed");
        metrics::record_action(kind.function_name(), "confirmed");
        pending
    }

    fn release_slot(&self) {
        self.inner.lock().in_flight = None;
        self.settled.notify_waiters();
    }

    fn fail(&self, mut pending: PendingAction, reason: SessionError) -> PendingAction {
        warn!(action = %pending.kind(), error = %reason, "Action failed");
        metrics::record_action(pending.kind().function_name(), "failed");
        pending.status = ActionStatus::Failed(reason);
        self.publish(&pending);
        pending
    }

    fn publish(&self, pending: &PendingAction) {
        self.pending_tx.send_replace(Some(pending.clone()));
    }
}

/// Map a shape-check failure to `InvalidInput`.
fn unsupported(kind: ActionKind, error: CallError) -> SessionError {
    match error {
        CallError::UnknownFunction(_) | CallError::WrongMutability { .. } => {
            SessionError::InvalidInput {
                field: "action",
                reason: format!("contract does not support {kind}"),
            }
        }
        other => SessionError::InvalidInput {
            field: "input",
            reason: other.to_string(),
        },
    }
}
