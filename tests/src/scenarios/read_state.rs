//! # Read-State Scenarios
//!
//! Cache refresh under repeated, concurrent and partially failing queries.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use futures::future::join_all;
    use std::sync::Arc;
    use wallet_session::{
        InMemoryWallet, ReadField, SessionConfig, SessionError, WalletSessionApi,
    };

    fn wallet() -> Arc<InMemoryWallet> {
        Arc::new(
            InMemoryWallet::new(vec![addr(OWNER)])
                .with_atm_balance(ether("3.0"))
                .with_candidates(&["alice", "bob"]),
        )
    }

    #[tokio::test]
    async fn test_repeated_refresh_is_stable() {
        let wallet = wallet();
        let session = connected(full_config(), &wallet).await;
        let before = session.read_state();

        let updates = session.watch_read_state();
        let reports = join_all((0..4).map(|_| session.refresh_all())).await;

        for report in reports {
            let report = report.unwrap();
            assert!(report.is_complete());
            assert_eq!(report.state, before);
        }
        assert_eq!(session.read_state(), before);
        // Nothing changed, so watchers were not woken
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failed_field_isolated_from_the_rest() {
        let wallet = wallet();
        let session = connected(full_config(), &wallet).await;

        wallet.fail_query("getBalance");
        wallet.fail_query("votingOpen");
        let report = session.refresh_all().await.unwrap();

        assert_eq!(
            report.failed_fields(),
            vec![ReadField::Balance, ReadField::VotingOpen]
        );
        assert_eq!(report.refreshed, vec![ReadField::Frozen, ReadField::Candidates]);
        // Failed fields keep their last good value
        assert_eq!(report.state.balance, Some(ether("3.0")));
        assert_eq!(report.state.voting_open, Some(false));
        assert!(report
            .errors()
            .iter()
            .all(|e| matches!(e, SessionError::RefreshFailed { .. })));

        wallet.clear_query_failures();
        assert!(session.refresh_all().await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_stale_read_after_confirmed_action() {
        let wallet = wallet();
        let session = connected(SessionConfig::default(), &wallet).await;

        wallet.fail_query("getBalance");
        let pending = session.deposit(ether("1")).await.unwrap();
        assert!(pending.is_confirmed());
        let warning = pending.stale_read.expect("stale read warning");
        assert_eq!(warning.fields(), vec![ReadField::Balance]);
        // Chain moved on, cache did not
        assert_eq!(wallet.atm_balance(), ether("4.0"));
        assert_eq!(session.read_state().balance, Some(ether("3.0")));

        wallet.clear_query_failures();
        session.refresh(&[ReadField::Balance]).await.unwrap();
        assert_eq!(session.read_state().balance, Some(ether("4.0")));
    }

    #[tokio::test]
    async fn test_refresh_after_disconnect_is_not_ready() {
        let wallet = wallet();
        let session = connected(full_config(), &wallet).await;
        session.disconnect().await;

        assert!(matches!(
            session.refresh_all().await,
            Err(SessionError::NotReady { .. })
        ));
        assert_eq!(session.read_state().balance, None);
    }
}
