//! Read-state refresh
//!
//! One read-only query per requested field, issued concurrently. Results are
//! applied under the session lock in a single step, and only if the binding
//! they were read against is still current. A failed query leaves its field
//! untouched and is reported; it never affects the other fields.

use super::WalletSession;
use crate::binding::ContractHandle;
use crate::domain::{ConnectionPhase, FieldFailure, FieldValue, ReadField, RefreshReport};
use crate::error::{SessionError, SessionResult};
use crate::metrics;
use crate::ports::outbound::WalletProvider;
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl<P: WalletProvider> WalletSession<P> {
    /// Handle and binding epoch, if connected.
    pub(super) fn bound_handle(&self) -> SessionResult<(ContractHandle<P>, u64)> {
        let inner = self.inner.lock();
        match (&inner.phase, &inner.contract) {
            (ConnectionPhase::Connected, Some(handle)) => Ok((handle.clone(), inner.epoch)),
            (phase, _) => Err(SessionError::NotReady { phase: *phase }),
        }
    }

    /// Query `fields` through `handle` and apply the results.
    pub(super) async fn refresh_fields(
        &self,
        handle: &ContractHandle<P>,
        epoch: u64,
        fields: &[ReadField],
    ) -> RefreshReport {
        let fields: BTreeSet<ReadField> = fields.iter().copied().collect();

        let queries = fields.iter().map(|&field| async move {
            let result = handle.query(field.query_function(), Vec::new()).await;
            (field, result)
        });
        let results = join_all(queries).await;

        let mut values = Vec::new();
        let mut failures = Vec::new();
        for (field, result) in results {
            let reason = match result {
                Ok(value) => match FieldValue::decode(field, &value) {
                    Some(decoded) => {
                        values.push(decoded);
                        continue;
                    }
                    None => format!("unexpected value {value:?}"),
                },
                Err(e) => e.to_string(),
            };
            warn!(%field, %reason, "Read query failed");
            metrics::record_refresh_failure(&field.to_string());
            failures.push(FieldFailure { field, reason });
        }

        let inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!("Discarding refresh results for a previous binding");
            failures.extend(values.into_iter().map(|value| FieldFailure {
                field: value.field(),
                reason: "session rebound during refresh".to_string(),
            }));
            failures.sort_by_key(|f| f.field);
            return RefreshReport {
                state: self.read_tx.borrow().clone(),
                refreshed: Vec::new(),
                failures,
            };
        }

        let refreshed: Vec<ReadField> = values.iter().map(FieldValue::field).collect();
        self.read_tx.send_if_modified(|state| {
            let before = state.clone();
            for value in values {
                state.apply(value);
            }
            *state != before
        });
        let state = self.read_tx.borrow().clone();
        drop(inner);

        debug!(?refreshed, failed = failures.len(), "Read state refreshed");
        RefreshReport {
            state,
            refreshed,
            failures,
        }
    }
}
