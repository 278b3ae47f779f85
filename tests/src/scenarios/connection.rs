//! # Connection Scenarios
//!
//! Wallet-driven lifecycle: connect, silent reconnect, abandonment and
//! account switches delivered through the notification loop.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use std::sync::Arc;
    use tokio::time::timeout;
    use wallet_session::{
        ConnectionPhase, InMemoryWallet, ProviderEvent, ProviderEventOutcome, ReadState,
        SessionConfig, SessionError, WalletSessionApi,
    };

    #[tokio::test]
    async fn test_connect_selects_account_and_populates_cache() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]).with_atm_balance(ether("1.0")));
        let session = session(SessionConfig::default(), &wallet);
        assert_eq!(session.session().phase, ConnectionPhase::Disconnected);
        assert_eq!(session.session().display_name(), "disconnected");

        let account = session.connect().await.unwrap();
        assert_eq!(account, addr(OWNER));

        let snapshot = session.session();
        assert_eq!(snapshot.phase, ConnectionPhase::Connected);
        assert_eq!(snapshot.display_name(), "0xabc");
        assert!(snapshot.contract.is_some());

        let state = session.read_state();
        assert_eq!(state.account, Some(addr(OWNER)));
        assert_eq!(state.balance.map(|b| b.to_string()), Some("1.0".to_string()));
        assert_eq!(state.frozen, Some(false));
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn test_page_reload_reconnects_without_prompt() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let first = connected(SessionConfig::default(), &wallet).await;
        drop(first);

        // A fresh session over the same authorised wallet
        let reloaded = session(SessionConfig::default(), &wallet);
        let snapshot = reloaded.start().await.unwrap();
        assert_eq!(snapshot.phase, ConnectionPhase::Connected);
        assert_eq!(snapshot.account, Some(addr(OWNER)));
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn test_user_declines_then_accepts() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let session = session(SessionConfig::default(), &wallet);

        wallet.reject_next_prompt();
        assert_eq!(session.connect().await, Err(SessionError::UserRejected));
        assert_eq!(session.session().phase, ConnectionPhase::ConnectionFailed);

        assert_eq!(session.connect().await, Ok(addr(OWNER)));
        assert_eq!(session.session().phase, ConnectionPhase::Connected);
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_one_prompt() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let session = session(SessionConfig::default(), &wallet);
        wallet.hold_prompts();

        let attempts: Vec<_> = (0..3)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.connect().await })
            })
            .collect();
        wait_for_phase(&session, ConnectionPhase::Connecting).await;
        wallet.release_prompts();

        for result in futures::future::join_all(attempts).await {
            assert_eq!(result.unwrap(), Ok(addr(OWNER)));
        }
        assert_eq!(wallet.prompts(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_prompt_returns_to_disconnected() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let session = session(SessionConfig::default(), &wallet);
        wallet.hold_prompts();

        let attempt = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.connect().await }
        });
        wait_for_phase(&session, ConnectionPhase::Connecting).await;
        attempt.abort();
        let _ = attempt.await;

        assert_eq!(session.session().phase, ConnectionPhase::Disconnected);
        wallet.release_prompts();
        assert_eq!(session.connect().await, Ok(addr(OWNER)));
    }

    #[tokio::test]
    async fn test_wallet_switch_rebinds_through_notification_loop() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]).with_atm_balance(ether("2.0")));
        let session = connected(SessionConfig::default(), &wallet).await;
        let contract = session.session().contract;
        let task = session.spawn_notification_loop();

        wallet.switch_account(addr(OTHER));
        wait_for_account(&session, &addr(OTHER)).await;

        let mut read = session.watch_read_state();
        timeout(GUARD, read.wait_for(|s| s.account == Some(addr(OTHER)) && s.balance.is_some()))
            .await
            .expect("cache never refreshed for new account")
            .unwrap();
        assert_eq!(session.session().contract, contract);
        assert_eq!(session.read_state().balance, Some(ether("2.0")));

        // Locking the wallet drops the binding
        wallet.lock_wallet();
        wait_for_phase(&session, ConnectionPhase::Disconnected).await;
        assert_eq!(session.read_state(), ReadState::default());

        drop(session);
        wallet.disconnect_wallet();
        timeout(GUARD, task).await.expect("loop did not stop").unwrap();
    }

    #[tokio::test]
    async fn test_switch_deferred_while_action_pending() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]).with_atm_balance(ether("1.0")));
        let session = connected(SessionConfig::default(), &wallet).await;
        wallet.hold_confirmations();

        let deposit = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.deposit(ether("0.5")).await }
        });
        wait_for_status(&session, |s| {
            matches!(s, wallet_session::ActionStatus::AwaitingConfirmation { .. })
        })
        .await;

        let switch = tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                session
                    .handle_provider_event(ProviderEvent::AccountsChanged(vec![addr(OTHER)]))
                    .await
            }
        });
        tokio::task::yield_now().await;
        assert_eq!(session.session().account, Some(addr(OWNER)));

        wallet.release_confirmations();
        let pending = deposit.await.unwrap().unwrap();
        assert!(pending.is_confirmed());
        assert_eq!(
            switch.await.unwrap(),
            ProviderEventOutcome::Switched {
                account: addr(OTHER)
            }
        );
        assert_eq!(session.read_state().account, Some(addr(OTHER)));
        assert_eq!(session.read_state().balance, Some(ether("1.5")));
    }
}
