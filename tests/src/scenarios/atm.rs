//! # ATM Scenarios
//!
//! Owner-side lifecycle of the ATM contract, checked against both the
//! session's cache and the simulated chain.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use std::sync::Arc;
    use wallet_session::{
        ActionKind, ActionStatus, ConnectionPhase, InMemoryWallet, SessionConfig, SessionError,
        WalletSessionApi,
    };

    const NEW_OWNER: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

    fn owner_wallet() -> Arc<InMemoryWallet> {
        Arc::new(InMemoryWallet::new(vec![addr(OWNER)]).with_atm_balance(ether("1.0")))
    }

    fn revert_reason(status: &ActionStatus) -> Option<&str> {
        match status {
            ActionStatus::Failed(SessionError::CallReverted { reason }) => reason.as_deref(),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_balance_lifecycle() {
        let wallet = owner_wallet();
        let session = connected(SessionConfig::default(), &wallet).await;

        let deposit = session.dispatch(ActionKind::Deposit, "0.5").await.unwrap();
        assert!(deposit.is_confirmed());
        assert_eq!(session.read_state().balance, Some(ether("1.5")));

        let withdraw = session.withdraw(ether("0.25")).await.unwrap();
        assert!(withdraw.is_confirmed());
        assert_eq!(session.read_state().balance, Some(ether("1.25")));

        let overdraw = session.withdraw(ether("5")).await.unwrap();
        assert_eq!(revert_reason(&overdraw.status), Some("Insufficient balance"));
        assert_eq!(session.read_state().balance, Some(ether("1.25")));

        session.set_balance(ether("10")).await.unwrap();
        assert_eq!(session.read_state().balance, Some(ether("10")));

        session.reset_balance().await.unwrap();
        assert_eq!(session.read_state().balance, Some(ether("0")));
        assert_eq!(wallet.atm_balance(), ether("0"));
        assert_eq!(wallet.submissions(), 5);
    }

    #[tokio::test]
    async fn test_freeze_blocks_movements_until_unfrozen() {
        let wallet = owner_wallet();
        let session = connected(SessionConfig::default(), &wallet).await;

        assert!(session.freeze().await.unwrap().is_confirmed());
        assert_eq!(session.read_state().frozen, Some(true));

        let blocked = session.deposit(ether("1")).await.unwrap();
        assert_eq!(revert_reason(&blocked.status), Some("Account is frozen"));
        assert_eq!(session.read_state().balance, Some(ether("1.0")));

        assert!(session.unfreeze().await.unwrap().is_confirmed());
        assert_eq!(session.read_state().frozen, Some(false));
        assert!(session.deposit(ether("1")).await.unwrap().is_confirmed());
        assert_eq!(session.read_state().balance, Some(ether("2.0")));
    }

    #[tokio::test]
    async fn test_unauthorised_freeze_leaves_state_untouched() {
        let wallet = Arc::new(
            InMemoryWallet::new(vec![addr(OTHER)])
                .with_atm_owner(addr(OWNER))
                .with_atm_balance(ether("1.0")),
        );
        let session = connected(SessionConfig::default(), &wallet).await;
        let queries = wallet.queries();

        let pending = session.freeze().await.unwrap();
        assert_eq!(revert_reason(&pending.status), Some("Not the owner"));
        assert_eq!(session.read_state().frozen, Some(false));
        assert!(!wallet.atm_frozen());
        // No refresh after a failed action
        assert_eq!(wallet.queries(), queries);
        assert_eq!(session.session().phase, ConnectionPhase::Connected);
    }

    #[tokio::test]
    async fn test_ownership_transfer_revokes_old_owner() {
        let wallet = owner_wallet();
        let session = connected(SessionConfig::default(), &wallet).await;

        let transfer = session
            .dispatch(ActionKind::TransferOwnership, NEW_OWNER)
            .await
            .unwrap();
        assert!(transfer.is_confirmed());
        assert_eq!(wallet.atm_owner(), addr(NEW_OWNER));

        let denied = session.deposit(ether("0.1")).await.unwrap();
        assert_eq!(revert_reason(&denied.status), Some("Not the owner"));
    }

    #[tokio::test]
    async fn test_short_owner_address_rejected_before_submission() {
        let wallet = owner_wallet();
        let session = connected(SessionConfig::default(), &wallet).await;

        assert!(matches!(
            session.dispatch(ActionKind::TransferOwnership, OTHER).await,
            Err(SessionError::InvalidInput {
                field: "newOwner",
                ..
            })
        ));
        assert!(matches!(
            session.dispatch(ActionKind::Deposit, "-1").await,
            Err(SessionError::InvalidInput { field: "amount", .. })
        ));
        assert_eq!(wallet.submissions(), 0);
        assert_eq!(wallet.atm_owner(), addr(OWNER));
    }

    #[tokio::test]
    async fn test_disconnected_session_touches_nothing() {
        let wallet = owner_wallet();
        let session = session(SessionConfig::default(), &wallet);

        for kind in ActionKind::ALL {
            assert_eq!(
                session.dispatch(kind, "garbage").await,
                Err(SessionError::NotReady {
                    phase: ConnectionPhase::Disconnected
                })
            );
        }
        assert_eq!(wallet.submissions(), 0);
        assert_eq!(wallet.queries(), 0);
        assert_eq!(wallet.prompts(), 0);
    }

    #[tokio::test]
    async fn test_one_action_at_a_time() {
        let wallet = owner_wallet();
        let session = connected(SessionConfig::default(), &wallet).await;
        wallet.hold_confirmations();

        let freeze = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.freeze().await }
        });
        wait_for_status(&session, |s| matches!(s, ActionStatus::AwaitingConfirmation { .. })).await;

        let (deposit, withdraw) =
            futures::join!(session.deposit(ether("1")), session.withdraw(ether("1")));
        assert_eq!(
            deposit,
            Err(SessionError::ActionInProgress {
                kind: ActionKind::Freeze
            })
        );
        assert_eq!(
            withdraw,
            Err(SessionError::ActionInProgress {
                kind: ActionKind::Freeze
            })
        );

        wallet.release_confirmations();
        assert!(freeze.await.unwrap().unwrap().is_confirmed());
        assert!(session.deposit(ether("1")).await.unwrap().is_confirmed());
        assert_eq!(wallet.submissions(), 2);
    }
}
