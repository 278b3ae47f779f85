//! # Metrics Scenarios
//!
//! Counters move with real session traffic when the `metrics` feature is on.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use std::sync::Arc;
    use wallet_session::metrics::{ACTIONS, CONNECT_ATTEMPTS, REFRESH_FAILURES};
    use wallet_session::{InMemoryWallet, SessionConfig, WalletSessionApi};

    #[tokio::test]
    async fn test_session_traffic_is_counted() {
        let connected_before = CONNECT_ATTEMPTS.with_label_values(&["connected"]).get();
        let unfreezes_before = ACTIONS.with_label_values(&["unfreezeAccount", "confirmed"]).get();
        let frozen_failures_before = REFRESH_FAILURES.with_label_values(&["frozen"]).get();

        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let session = connected(SessionConfig::default(), &wallet).await;
        wallet.fail_query("frozen");
        assert!(session.unfreeze().await.unwrap().is_confirmed());

        assert!(CONNECT_ATTEMPTS.with_label_values(&["connected"]).get() > connected_before);
        assert!(
            ACTIONS.with_label_values(&["unfreezeAccount", "confirmed"]).get() > unfreezes_before
        );
        assert!(REFRESH_FAILURES.with_label_values(&["frozen"]).get() > frozen_failures_before);
    }
}
