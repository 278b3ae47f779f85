//! In-memory devnet wallet
//!
//! Implements `WalletProvider` over a simulated chain hosting one deployment
//! that answers both the ATM and the voting interface. Transactions are
//! executed when their receipt is awaited, so a test can hold confirmations
//! and observe the session while an action is `AwaitingConfirmation`.
//!
//! Scripted faults:
//! - decline the next account prompt or the next signature prompt
//! - drop the next transaction before it is mined
//! - fail queries to a named function
//! - hold account prompts or confirmations until released

use crate::domain::AbiValue;
use crate::error::ProviderError;
use crate::ports::outbound::{ContractCall, ProviderEvent, ReceiptStatus, TxReceipt, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha3::{Digest, Keccak256};
use shared_types::{Address, Amount, TxHash, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::debug;

const EVENT_CAPACITY: usize = 16;

/// JSON-RPC internal error, used for injected query failures
const INTERNAL_ERROR: i64 = -32603;

// =============================================================================
// SIMULATED CONTRACTS
// =============================================================================

struct Atm {
    owner: Address,
    balance: U256,
    frozen: bool,
}

impl Atm {
    fn only_owner(&self, from: &Address) -> Result<(), String> {
        if *from != self.owner {
            return Err("Not the owner".into());
        }
        Ok(())
    }

    fn not_frozen(&self) -> Result<(), String> {
        if self.frozen {
            return Err("Account is frozen".into());
        }
        Ok(())
    }
}

#[derive(Default)]
struct Voting {
    open: bool,
    candidates: Vec<(String, u64)>,
    /// Registered voters and whether they have voted
    voters: HashMap<Address, bool>,
}

struct SubmittedTx {
    from: Address,
    function: String,
    args: Vec<AbiValue>,
    dropped: bool,
}

#[derive(Default)]
struct Faults {
    reject_next_prompt: bool,
    reject_next_signature: bool,
    drop_next_transaction: bool,
    failing_queries: HashSet<String>,
}

struct DevChain {
    accounts: Vec<Address>,
    selected: usize,
    authorized: bool,
    connected: bool,
    atm: Atm,
    voting_owner: Address,
    voting: Voting,
    pending: HashMap<TxHash, SubmittedTx>,
    nonce: u64,
    block_number: u64,
    faults: Faults,
}

impl DevChain {
    fn selected(&self) -> Option<Address> {
        self.accounts.get(self.selected).cloned()
    }

    fn query(&self, function: &str) -> Option<AbiValue> {
        Some(match function {
            "owner" => AbiValue::Address(self.atm.owner.clone()),
            "getBalance" => AbiValue::Uint(self.atm.balance),
            "frozen" => AbiValue::Bool(self.atm.frozen),
            "votingOpen" => AbiValue::Bool(self.voting.open),
            "getCandidates" => AbiValue::Array(
                self.voting
                    .candidates
                    .iter()
                    .map(|(name, _)| AbiValue::String(name.clone()))
                    .collect(),
            ),
            _ => return None,
        })
    }

    fn execute(&mut self, tx: &SubmittedTx) -> Result<(), String> {
        let from = &tx.from;
        match tx.function.as_str() {
            "deposit" => {
                self.atm.only_owner(from)?;
                self.atm.not_frozen()?;
                let amount = uint_arg(&tx.args)?;
                self.atm.balance = self
                    .atm
                    .balance
                    .checked_add(amount)
                    .ok_or_else(|| "Balance overflow".to_string())?;
            }
            "withdraw" => {
                self.atm.only_owner(from)?;
                self.atm.not_frozen()?;
                let amount = uint_arg(&tx.args)?;
                if amount > self.atm.balance {
                    return Err("Insufficient balance".into());
                }
                self.atm.balance -= amount;
            }
            "setBalance" => {
                self.atm.only_owner(from)?;
                self.atm.balance = uint_arg(&tx.args)?;
            }
            "resetBalance" => {
                self.atm.only_owner(from)?;
                self.atm.balance = U256::zero();
            }
            "transferOwnership" => {
                self.atm.only_owner(from)?;
                self.atm.owner = address_arg(&tx.args)?;
            }
            "freezeAccount" => {
                self.atm.only_owner(from)?;
                self.atm.frozen = true;
            }
            "unfreezeAccount" => {
                self.atm.only_owner(from)?;
                self.atm.frozen = false;
            }
            "registerVoter" => {
                self.only_voting_owner(from)?;
                let voter = address_arg(&tx.args)?;
                if self.voting.voters.contains_key(&voter) {
                    return Err("Voter already registered".into());
                }
                self.voting.voters.insert(voter, false);
            }
            "addCandidate" => {
                self.only_voting_owner(from)?;
                if self.voting.open {
                    return Err("Voting is open".into());
                }
                let name = match tx.args.first() {
                    Some(AbiValue::String(name)) => name.clone(),
                    _ => return Err("Invalid candidate name".into()),
                };
                self.voting.candidates.push((name, 0));
            }
            "openVoting" => {
                self.only_voting_owner(from)?;
                self.voting.open = true;
            }
            "closeVoting" => {
                self.only_voting_owner(from)?;
                self.voting.open = false;
            }
            "vote" => {
                if !self.voting.open {
                    return Err("Voting is closed".into());
                }
                match self.voting.voters.get(from) {
                    None => return Err("Not a registered voter".into()),
                    Some(true) => return Err("Already voted".into()),
                    Some(false) => {}
                }
                let index = uint_arg(&tx.args)?;
                let candidate = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.voting.candidates.get_mut(i))
                    .ok_or_else(|| "Invalid candidate".to_string())?;
                candidate.1 += 1;
                self.voting.voters.insert(from.clone(), true);
            }
            other => return Err(format!("Unknown function {other}")),
        }
        Ok(())
    }

    fn only_voting_owner(&self, from: &Address) -> Result<(), String> {
        if *from != self.voting_owner {
            return Err("Not the owner".into());
        }
        Ok(())
    }
}

fn uint_arg(args: &[AbiValue]) -> Result<U256, String> {
    args.first()
        .and_then(AbiValue::as_uint)
        .ok_or_else(|| "Invalid uint256 argument".to_string())
}

fn address_arg(args: &[AbiValue]) -> Result<Address, String> {
    args.first()
        .and_then(AbiValue::as_address)
        .cloned()
        .ok_or_else(|| "Invalid address argument".to_string())
}

// =============================================================================
// WALLET
// =============================================================================

/// Devnet wallet with a simulated chain
pub struct InMemoryWallet {
    installed: bool,
    chain: Mutex<DevChain>,
    events: broadcast::Sender<ProviderEvent>,
    prompts_held: watch::Sender<bool>,
    confirmations_held: watch::Sender<bool>,
    prompts: AtomicUsize,
    queries: AtomicUsize,
    submissions: AtomicUsize,
}

impl InMemoryWallet {
    /// Wallet holding `accounts`; the first is selected and owns both contracts.
    pub fn new(accounts: Vec<Address>) -> Self {
        let owner = accounts
            .first()
            .cloned()
            .unwrap_or_else(|| Address::from_bytes([0; 20]));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            installed: true,
            chain: Mutex::new(DevChain {
                accounts,
                selected: 0,
                authorized: false,
                connected: true,
                atm: Atm {
                    owner: owner.clone(),
                    balance: U256::zero(),
                    frozen: false,
                },
                voting_owner: owner,
                voting: Voting::default(),
                pending: HashMap::new(),
                nonce: 0,
                block_number: 0,
                faults: Faults::default(),
            }),
            events,
            prompts_held: watch::Sender::new(false),
            confirmations_held: watch::Sender::new(false),
            prompts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    /// Environment without a wallet extension.
    pub fn not_installed() -> Self {
        let mut wallet = Self::new(Vec::new());
        wallet.installed = false;
        wallet
    }

    /// Site already authorised, so `current_accounts` answers without a prompt.
    pub fn authorized(self) -> Self {
        self.chain.lock().authorized = true;
        self
    }

    pub fn with_atm_balance(self, balance: Amount) -> Self {
        self.chain.lock().atm.balance = balance.wei();
        self
    }

    pub fn with_atm_owner(self, owner: Address) -> Self {
        self.chain.lock().atm.owner = owner;
        self
    }

    pub fn with_voting_owner(self, owner: Address) -> Self {
        self.chain.lock().voting_owner = owner;
        self
    }

    pub fn with_candidates(self, names: &[&str]) -> Self {
        self.chain.lock().voting.candidates = names.iter().map(|n| (n.to_string(), 0)).collect();
        self
    }

    // -------------------------------------------------------------------------
    // Fault injection
    // -------------------------------------------------------------------------

    pub fn reject_next_prompt(&self) {
        self.chain.lock().faults.reject_next_prompt = true;
    }

    pub fn reject_next_signature(&self) {
        self.chain.lock().faults.reject_next_signature = true;
    }

    pub fn drop_next_transaction(&self) {
        self.chain.lock().faults.drop_next_transaction = true;
    }

    /// Fail every query to `function` until cleared.
    pub fn fail_query(&self, function: &str) {
        self.chain.lock().faults.failing_queries.insert(function.to_string());
    }

    pub fn clear_query_failures(&self) {
        self.chain.lock().faults.failing_queries.clear();
    }

    /// Keep account prompts open until `release_prompts`.
    pub fn hold_prompts(&self) {
        self.prompts_held.send_replace(true);
    }

    pub fn release_prompts(&self) {
        self.prompts_held.send_replace(false);
    }

    /// Keep transactions unmined until `release_confirmations`.
    pub fn hold_confirmations(&self) {
        self.confirmations_held.send_replace(true);
    }

    pub fn release_confirmations(&self) {
        self.confirmations_held.send_replace(false);
    }

    // -------------------------------------------------------------------------
    // Wallet-side events
    // -------------------------------------------------------------------------

    /// Select a different account in the wallet and notify the site.
    pub fn switch_account(&self, account: Address) {
        let authorized = {
            let mut chain = self.chain.lock();
            let index = match chain.accounts.iter().position(|a| *a == account) {
                Some(index) => index,
                None => {
                    chain.accounts.push(account.clone());
                    chain.accounts.len() - 1
                }
            };
            chain.selected = index;
            chain.authorized
        };
        if authorized {
            self.emit(ProviderEvent::AccountsChanged(vec![account]));
        }
    }

    /// Lock the wallet: revokes access and reports an empty account list.
    pub fn lock_wallet(&self) {
        self.chain.lock().authorized = false;
        self.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }

    /// Drop the provider's chain connection.
    pub fn disconnect_wallet(&self) {
        self.chain.lock().connected = false;
        self.emit(ProviderEvent::Disconnected);
    }

    pub fn reconnect_wallet(&self) {
        self.chain.lock().connected = true;
    }

    fn emit(&self, event: ProviderEvent) {
        // No subscribers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn atm_balance(&self) -> Amount {
        Amount::from_wei(self.chain.lock().atm.balance)
    }

    pub fn atm_frozen(&self) -> bool {
        self.chain.lock().atm.frozen
    }

    pub fn atm_owner(&self) -> Address {
        self.chain.lock().atm.owner.clone()
    }

    pub fn voting_open(&self) -> bool {
        self.chain.lock().voting.open
    }

    pub fn candidates(&self) -> Vec<String> {
        let chain = self.chain.lock();
        chain.voting.candidates.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn votes_for(&self, index: usize) -> Option<u64> {
        self.chain.lock().voting.candidates.get(index).map(|(_, votes)| *votes)
    }

    pub fn is_registered_voter(&self, voter: &Address) -> bool {
        self.chain.lock().voting.voters.contains_key(voter)
    }

    /// Transactions submitted but not yet mined.
    pub fn unmined(&self) -> usize {
        self.chain.lock().pending.len()
    }

    fn ensure_reachable(&self) -> Result<(), ProviderError> {
        if !self.installed {
            return Err(ProviderError::NotInstalled);
        }
        if !self.chain.lock().connected {
            return Err(ProviderError::Disconnected);
        }
        Ok(())
    }
}

async fn wait_released(gate: &watch::Sender<bool>) {
    let mut held = gate.subscribe();
    // The sender lives in `self`, so the channel cannot close while waiting.
    let _ = held.wait_for(|held| !*held).await;
}

#[async_trait]
impl WalletProvider for InMemoryWallet {
    fn detect(&self) -> bool {
        self.installed
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.ensure_reachable()?;
        self.prompts.fetch_add(1, Ordering::SeqCst);
        wait_released(&self.prompts_held).await;

        let mut chain = self.chain.lock();
        if std::mem::take(&mut chain.faults.reject_next_prompt) {
            debug!("Account prompt declined");
            return Err(ProviderError::UserRejected);
        }
        chain.authorized = true;
        Ok(chain.selected().into_iter().collect())
    }

    async fn current_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.ensure_reachable()?;
        let chain = self.chain.lock();
        if !chain.authorized {
            return Ok(Vec::new());
        }
        Ok(chain.selected().into_iter().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn call(&self, call: ContractCall) -> Result<AbiValue, ProviderError> {
        self.ensure_reachable()?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        let chain = self.chain.lock();
        if chain.faults.failing_queries.contains(&call.function) {
            return Err(ProviderError::Rpc {
                code: INTERNAL_ERROR,
                message: format!("query {} failed", call.function),
            });
        }
        chain.query(&call.function).ok_or(ProviderError::Reverted { reason: None })
    }

    async fn send_transaction(&self, call: ContractCall) -> Result<TxHash, ProviderError> {
        self.ensure_reachable()?;
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let mut chain = self.chain.lock();
        if std::mem::take(&mut chain.faults.reject_next_signature) {
            debug!(function = %call.function, "Signature prompt declined");
            return Err(ProviderError::UserRejected);
        }

        chain.nonce += 1;
        let mut hasher = Keccak256::new();
        hasher.update(call.from.as_str().as_bytes());
        hasher.update(chain.nonce.to_be_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        let tx = TxHash::new(bytes);

        let dropped = std::mem::take(&mut chain.faults.drop_next_transaction);
        chain.pending.insert(
            tx,
            SubmittedTx {
                from: call.from,
                function: call.function,
                args: call.args,
                dropped,
            },
        );
        Ok(tx)
    }

    async fn wait_for_receipt(
        &self,
        tx: TxHash,
        confirmations: u64,
    ) -> Result<TxReceipt, ProviderError> {
        wait_released(&self.confirmations_held).await;

        let mut chain = self.chain.lock();
        let submitted = chain.pending.remove(&tx).ok_or_else(|| ProviderError::Dropped {
            reason: format!("unknown transaction {tx}"),
        })?;
        if submitted.dropped {
            return Err(ProviderError::Dropped {
                reason: "transaction replaced before inclusion".into(),
            });
        }

        let status = match chain.execute(&submitted) {
            Ok(()) => ReceiptStatus::Success,
            Err(reason) => {
                debug!(%tx, %reason, "Transaction reverted");
                ReceiptStatus::Reverted {
                    reason: Some(reason),
                }
            }
        };
        chain.block_number += confirmations.max(1);

        Ok(TxReceipt {
            tx,
            status,
            block_number: chain.block_number,
        })
    }
}
