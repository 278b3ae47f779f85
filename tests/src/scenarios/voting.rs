//! # Voting Scenarios
//!
//! An election run end to end: the owner registers voters and candidates,
//! voters switch in through the wallet, the owner closes the ballot.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use std::sync::Arc;
    use wallet_session::{
        ActionKind, ActionStatus, InMemoryWallet, ProviderEvent, ProviderEventOutcome,
        SessionError, WalletSessionApi, U256,
    };

    fn election_wallet() -> Arc<InMemoryWallet> {
        Arc::new(InMemoryWallet::new(vec![addr(OWNER)]))
    }

    async fn switch_to(session: &DevSession, wallet: &InMemoryWallet, account: &str) {
        wallet.switch_account(addr(account));
        let outcome = session
            .handle_provider_event(ProviderEvent::AccountsChanged(vec![addr(account)]))
            .await;
        assert_eq!(
            outcome,
            ProviderEventOutcome::Switched {
                account: addr(account)
            }
        );
    }

    fn revert_reason(status: &ActionStatus) -> Option<&str> {
        match status {
            ActionStatus::Failed(SessionError::CallReverted { reason }) => reason.as_deref(),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_full_election() {
        let wallet = election_wallet();
        let session = connected(full_config(), &wallet).await;
        assert_eq!(session.read_state().voting_open, Some(false));
        assert_eq!(session.read_state().candidates, Some(Vec::new()));

        // Owner prepares the ballot
        assert!(session.register_voter(addr(VOTER_A)).await.unwrap().is_confirmed());
        assert!(wallet.is_registered_voter(&addr(VOTER_A)));
        for name in ["alice", "bob"] {
            let pending = session.dispatch(ActionKind::AddCandidate, name).await.unwrap();
            assert!(pending.is_confirmed());
        }
        assert_eq!(
            session.read_state().candidates,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );

        assert!(session.open_voting().await.unwrap().is_confirmed());
        assert_eq!(session.read_state().voting_open, Some(true));

        let late = session.add_candidate("carol".to_string()).await.unwrap();
        assert_eq!(revert_reason(&late.status), Some("Voting is open"));
        assert_eq!(wallet.candidates().len(), 2);

        // Registered voter casts one ballot
        switch_to(&session, &wallet, VOTER_A).await;
        assert_eq!(session.read_state().voting_open, Some(true));
        assert!(session.dispatch(ActionKind::Vote, "1").await.unwrap().is_confirmed());
        assert_eq!(wallet.votes_for(1), Some(1));

        let twice = session.vote(U256::zero()).await.unwrap();
        assert_eq!(revert_reason(&twice.status), Some("Already voted"));
        assert_eq!(wallet.votes_for(0), Some(0));

        // Unregistered account is refused by the contract
        switch_to(&session, &wallet, VOTER_B).await;
        let outsider = session.vote(U256::zero()).await.unwrap();
        assert_eq!(revert_reason(&outsider.status), Some("Not a registered voter"));

        // Owner closes the ballot
        switch_to(&session, &wallet, OWNER).await;
        assert!(session.close_voting().await.unwrap().is_confirmed());
        assert_eq!(session.read_state().voting_open, Some(false));
        assert!(!wallet.voting_open());
    }

    #[tokio::test]
    async fn test_vote_on_closed_ballot_reverts() {
        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]).with_candidates(&["alice"]));
        let session = connected(full_config(), &wallet).await;
        session.register_voter(addr(VOTER_A)).await.unwrap();

        switch_to(&session, &wallet, VOTER_A).await;
        let pending = session.vote(U256::zero()).await.unwrap();
        assert_eq!(revert_reason(&pending.status), Some("Voting is closed"));
        assert_eq!(wallet.votes_for(0), Some(0));
    }

    #[tokio::test]
    async fn test_ballot_input_validation() {
        let wallet = election_wallet();
        let session = connected(full_config(), &wallet).await;

        assert!(matches!(
            session.dispatch(ActionKind::AddCandidate, "   ").await,
            Err(SessionError::InvalidInput { field: "name", .. })
        ));
        assert!(matches!(
            session.dispatch(ActionKind::Vote, "first").await,
            Err(SessionError::InvalidInput {
                field: "candidateIndex",
                ..
            })
        ));
        assert!(matches!(
            session.dispatch(ActionKind::RegisterVoter, "0x123").await,
            Err(SessionError::InvalidInput { field: "voter", .. })
        ));
        assert_eq!(wallet.submissions(), 0);
    }

    #[tokio::test]
    async fn test_atm_only_interface_rejects_voting_actions() {
        let wallet = election_wallet();
        let session = connected(wallet_session::SessionConfig::default(), &wallet).await;

        assert!(matches!(
            session.open_voting().await,
            Err(SessionError::InvalidInput { field: "action", .. })
        ));
        assert_eq!(session.read_state().voting_open, None);
        assert_eq!(wallet.submissions(), 0);
    }
}
