//! # Telemetry Scenarios
//!
//! Subscriber bootstrap as a host binary would do it.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use session_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
    use std::collections::HashMap;
    use std::sync::Arc;
    use wallet_session::{InMemoryWallet, SessionConfig, WalletSessionApi};

    #[tokio::test]
    async fn test_session_runs_under_installed_subscriber() {
        let env: HashMap<&str, &str> = [
            ("ATM_LOG_LEVEL", "wallet_session=debug"),
            ("ATM_JSON_LOGS", "true"),
        ]
        .into_iter()
        .collect();
        let config = TelemetryConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.json_logs);

        // Tests share one process; only the first install can succeed
        match init_telemetry(config.clone()) {
            Ok(()) | Err(TelemetryError::AlreadyInitialized(_)) => {}
            Err(other) => panic!("unexpected telemetry error: {other}"),
        }
        assert!(matches!(
            init_telemetry(config),
            Err(TelemetryError::AlreadyInitialized(_))
        ));

        let wallet = Arc::new(InMemoryWallet::new(vec![addr(OWNER)]));
        let session = connected(SessionConfig::default(), &wallet).await;
        tracing::info!(account = %session.session().display_name(), "Scenario connected");
        assert!(session.deposit(ether("1")).await.unwrap().is_confirmed());
    }
}
