//! In-process wallet and insurance chain for development and testing. The
//! whole workspace can run connect/refresh/command flows end-to-end against
//! this crate without a browser wallet or a local node.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

use client_core::contract::{ContractConnector, ContractError, InsuranceContract};
use shared::{
    domain::{Address, ChainId, ClaimId, PolicyId, TxHash},
    projection::{Claim, ClaimStatus, Policy, PolicyStatus, PolicyType},
    protocol::{NetworkDescriptor, ProviderEvent},
    units::Wei,
};
use wallet::{Provider, ProviderError, ProviderInfo};

/// A scriptable wallet provider. Authorization, the account list and the set
/// of recognized chains are all adjustable from the outside so tests and
/// demos can drive every path the real wallet exposes.
pub struct DevWallet {
    accounts: RwLock<Vec<Address>>,
    /// Whether the user would approve an authorization prompt.
    approve_requests: AtomicBool,
    /// Set once an authorization prompt succeeded; gates the silent query.
    authorized: AtomicBool,
    current_chain: RwLock<ChainId>,
    known_chains: RwLock<HashSet<ChainId>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl DevWallet {
    /// A wallet holding `account`, already sitting on `network`.
    pub fn new(account: Address, network: &NetworkDescriptor) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            accounts: RwLock::new(vec![account]),
            approve_requests: AtomicBool::new(true),
            authorized: AtomicBool::new(false),
            current_chain: RwLock::new(network.chain_id),
            known_chains: RwLock::new(HashSet::from([network.chain_id])),
            events,
        })
    }

    /// A wallet that does not recognize any chain yet. Switching to the
    /// target network has to go through the register-then-retry path.
    pub fn without_known_chains(account: Address) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            accounts: RwLock::new(vec![account]),
            approve_requests: AtomicBool::new(true),
            authorized: AtomicBool::new(false),
            current_chain: RwLock::new(ChainId(0)),
            known_chains: RwLock::new(HashSet::new()),
            events,
        })
    }

    pub fn deny_authorization(&self) {
        self.approve_requests.store(false, Ordering::SeqCst);
    }

    /// Replaces the account list and notifies subscribers, as a user
    /// switching accounts in the wallet UI would.
    pub async fn switch_account(&self, account: Address) {
        *self.accounts.write().await = vec![account.clone()];
        let _ = self
            .events
            .send(ProviderEvent::AccountsChanged(vec![account]));
    }

    /// Drops all accounts, as a user disconnecting the site would.
    pub async fn disconnect_all(&self) {
        self.accounts.write().await.clear();
        self.authorized.store(false, Ordering::SeqCst);
        let _ = self.events.send(ProviderEvent::AccountsChanged(Vec::new()));
    }
}

#[async_trait]
impl Provider for DevWallet {
    fn info(&self) -> ProviderInfo {
        ProviderInfo::new("DevWallet")
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.accounts.read().await.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if !self.approve_requests.load(Ordering::SeqCst) {
            return Err(ProviderError::user_rejected());
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(self.accounts.read().await.clone())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        if !self.known_chains.read().await.contains(&chain_id) {
            return Err(ProviderError::unrecognized_chain(chain_id));
        }
        let mut current = self.current_chain.write().await;
        if *current != chain_id {
            *current = chain_id;
            let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        debug!(chain = %network.chain_id.as_hex(), name = %network.chain_name, "chain registered");
        self.known_chains.write().await.insert(network.chain_id);
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

// Statuses are stored as raw integers, as the chain would, and converted to
// typed projections only when they cross the read boundary.
struct PolicyRecord {
    holder: Address,
    holder_name: String,
    policy_type: u8,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: u8,
    claims_made: u64,
    total_claims_paid: Wei,
}

struct ClaimRecord {
    policy_id: PolicyId,
    claimant: Address,
    amount: Wei,
    description: String,
    medical_provider: String,
    date_submitted: DateTime<Utc>,
    date_processed: Option<DateTime<Utc>>,
    status: u8,
    rejection_reason: Option<String>,
}

#[derive(Default)]
struct LedgerState {
    policies: BTreeMap<u64, PolicyRecord>,
    claims: BTreeMap<u64, ClaimRecord>,
    holder_policies: HashMap<Address, Vec<PolicyId>>,
    claimant_claims: HashMap<Address, Vec<ClaimId>>,
    balance: Wei,
    tx_counter: u64,
}

/// The insurance chain state, shared by every bound contract handle.
pub struct Ledger {
    insurer: Address,
    state: Mutex<LedgerState>,
}

impl Ledger {
    pub fn new(insurer: Address) -> Arc<Self> {
        Arc::new(Self {
            insurer,
            state: Mutex::new(LedgerState::default()),
        })
    }

    pub fn insurer(&self) -> &Address {
        &self.insurer
    }
}

fn revert(reason: &str) -> ContractError {
    ContractError::reverted(reason)
}

fn decode_error(err: shared::projection::UnknownDiscriminant) -> ContractError {
    ContractError::transport(err.to_string())
}

impl LedgerState {
    fn next_tx(&mut self) -> TxHash {
        self.tx_counter += 1;
        TxHash(format!("0xdev{:06x}", self.tx_counter))
    }

    fn policy_record(&self, id: PolicyId) -> Result<&PolicyRecord, ContractError> {
        self.policies
            .get(&id.0)
            .ok_or_else(|| revert("Policy does not exist"))
    }

    fn policy_record_mut(&mut self, id: PolicyId) -> Result<&mut PolicyRecord, ContractError> {
        self.policies
            .get_mut(&id.0)
            .ok_or_else(|| revert("Policy does not exist"))
    }

    fn claim_record(&self, id: ClaimId) -> Result<&ClaimRecord, ContractError> {
        self.claims
            .get(&id.0)
            .ok_or_else(|| revert("Claim does not exist"))
    }

    fn claim_record_mut(&mut self, id: ClaimId) -> Result<&mut ClaimRecord, ContractError> {
        self.claims
            .get_mut(&id.0)
            .ok_or_else(|| revert("Claim does not exist"))
    }
}

fn project_policy(id: PolicyId, record: &PolicyRecord) -> Result<Policy, ContractError> {
    let policy_type = PolicyType::try_from(record.policy_type).map_err(decode_error)?;
    Ok(Policy {
        id,
        holder: record.holder.clone(),
        holder_name: record.holder_name.clone(),
        coverage_amount: policy_type.coverage(),
        premium: policy_type.premium(),
        start_date: record.start_date,
        end_date: record.end_date,
        status: PolicyStatus::try_from(record.status).map_err(decode_error)?,
        policy_type,
        claims_made: record.claims_made,
        total_claims_paid: record.total_claims_paid,
    })
}

fn project_claim(id: ClaimId, record: &ClaimRecord) -> Result<Claim, ContractError> {
    Ok(Claim {
        id,
        policy_id: record.policy_id,
        claimant: record.claimant.clone(),
        amount: record.amount,
        description: record.description.clone(),
        medical_provider: record.medical_provider.clone(),
        date_submitted: record.date_submitted,
        date_processed: record.date_processed,
        status: ClaimStatus::try_from(record.status).map_err(decode_error)?,
        rejection_reason: record.rejection_reason.clone(),
    })
}

/// A contract handle bound to one signing account.
pub struct DevChain {
    ledger: Arc<Ledger>,
    signer: Address,
}

impl DevChain {
    fn require_insurer(&self) -> Result<(), ContractError> {
        if self.signer != self.ledger.insurer {
            return Err(revert("Only insurer can perform this action"));
        }
        Ok(())
    }
}

#[async_trait]
impl InsuranceContract for DevChain {
    async fn insurer(&self) -> Result<Address, ContractError> {
        Ok(self.ledger.insurer.clone())
    }

    async fn policy_counter(&self) -> Result<u64, ContractError> {
        Ok(self.ledger.state.lock().await.policies.len() as u64)
    }

    async fn claim_counter(&self) -> Result<u64, ContractError> {
        Ok(self.ledger.state.lock().await.claims.len() as u64)
    }

    async fn policy(&self, id: PolicyId) -> Result<Policy, ContractError> {
        let state = self.ledger.state.lock().await;
        project_policy(id, state.policy_record(id)?)
    }

    async fn claim(&self, id: ClaimId) -> Result<Claim, ContractError> {
        let state = self.ledger.state.lock().await;
        project_claim(id, state.claim_record(id)?)
    }

    async fn user_policies(&self, user: &Address) -> Result<Vec<PolicyId>, ContractError> {
        let state = self.ledger.state.lock().await;
        Ok(state.holder_policies.get(user).cloned().unwrap_or_default())
    }

    async fn user_claims(&self, user: &Address) -> Result<Vec<ClaimId>, ContractError> {
        let state = self.ledger.state.lock().await;
        Ok(state.claimant_claims.get(user).cloned().unwrap_or_default())
    }

    async fn contract_balance(&self) -> Result<Wei, ContractError> {
        Ok(self.ledger.state.lock().await.balance)
    }

    async fn pending_claims_count(&self) -> Result<u64, ContractError> {
        let state = self.ledger.state.lock().await;
        Ok(state
            .claims
            .values()
            .filter(|c| c.status == ClaimStatus::Pending.code())
            .count() as u64)
    }

    async fn create_policy(
        &self,
        holder_name: &str,
        policy_type: PolicyType,
        value: Wei,
    ) -> Result<TxHash, ContractError> {
        if holder_name.trim().is_empty() {
            return Err(revert("Name cannot be empty"));
        }
        if value != policy_type.premium() {
            return Err(revert("Incorrect premium amount"));
        }

        let mut state = self.ledger.state.lock().await;
        let now = Utc::now();
        let id = PolicyId(state.policies.len() as u64 + 1);
        state.policies.insert(
            id.0,
            PolicyRecord {
                holder: self.signer.clone(),
                holder_name: holder_name.trim().to_string(),
                policy_type: policy_type.code(),
                start_date: now,
                end_date: now + TimeDelta::days(365),
                status: PolicyStatus::Active.code(),
                claims_made: 0,
                total_claims_paid: Wei::zero(),
            },
        );
        state
            .holder_policies
            .entry(self.signer.clone())
            .or_default()
            .push(id);
        state.balance = state
            .balance
            .checked_add(value)
            .ok_or_else(|| revert("Balance overflow"))?;
        Ok(state.next_tx())
    }

    async fn cancel_policy(&self, id: PolicyId) -> Result<TxHash, ContractError> {
        let mut state = self.ledger.state.lock().await;
        let record = state.policy_record_mut(id)?;
        if record.holder != self.signer {
            return Err(revert("Only policy holder can cancel"));
        }
        if record.status != PolicyStatus::Active.code() {
            return Err(revert("Policy is not active"));
        }
        record.status = PolicyStatus::Cancelled.code();
        Ok(state.next_tx())
    }

    async fn submit_claim(
        &self,
        policy_id: PolicyId,
        amount: Wei,
        description: &str,
        medical_provider: &str,
    ) -> Result<TxHash, ContractError> {
        let mut state = self.ledger.state.lock().await;

        let (coverage, claims_paid) = {
            let record = state.policy_record(policy_id)?;
            if record.holder != self.signer {
                return Err(revert("Only policy holder can submit claims"));
            }
            if record.status != PolicyStatus::Active.code() {
                return Err(revert("Policy is not active"));
            }
            let policy_type =
                PolicyType::try_from(record.policy_type).map_err(decode_error)?;
            (policy_type.coverage(), record.total_claims_paid)
        };
        if amount.is_zero() {
            return Err(revert("Claim amount must be greater than zero"));
        }
        let remaining = coverage
            .checked_sub(claims_paid)
            .unwrap_or_else(Wei::zero);
        if amount > remaining {
            return Err(revert("Claim amount exceeds coverage"));
        }

        let id = ClaimId(state.claims.len() as u64 + 1);
        state.claims.insert(
            id.0,
            ClaimRecord {
                policy_id,
                claimant: self.signer.clone(),
                amount,
                description: description.to_string(),
                medical_provider: medical_provider.to_string(),
                date_submitted: Utc::now(),
                date_processed: None,
                status: ClaimStatus::Pending.code(),
                rejection_reason: None,
            },
        );
        state
            .claimant_claims
            .entry(self.signer.clone())
            .or_default()
            .push(id);
        state.policy_record_mut(policy_id)?.claims_made += 1;
        Ok(state.next_tx())
    }

    async fn approve_claim(&self, id: ClaimId) -> Result<TxHash, ContractError> {
        self.require_insurer()?;
        let mut state = self.ledger.state.lock().await;
        let record = state.claim_record_mut(id)?;
        if record.status != ClaimStatus::Pending.code() {
            return Err(revert("Claim is not pending"));
        }
        record.status = ClaimStatus::Approved.code();
        record.date_processed = Some(Utc::now());
        Ok(state.next_tx())
    }

    async fn reject_claim(&self, id: ClaimId, reason: &str) -> Result<TxHash, ContractError> {
        self.require_insurer()?;
        let mut state = self.ledger.state.lock().await;
        let record = state.claim_record_mut(id)?;
        if record.status != ClaimStatus::Pending.code() {
            return Err(revert("Claim is not pending"));
        }
        record.status = ClaimStatus::Rejected.code();
        record.date_processed = Some(Utc::now());
        record.rejection_reason = Some(reason.to_string());
        Ok(state.next_tx())
    }

    async fn pay_claim(&self, id: ClaimId) -> Result<TxHash, ContractError> {
        self.require_insurer()?;
        let mut state = self.ledger.state.lock().await;

        let (policy_id, amount) = {
            let record = state.claim_record(id)?;
            if record.status != ClaimStatus::Approved.code() {
                return Err(revert("Claim is not approved"));
            }
            (record.policy_id, record.amount)
        };
        state.balance = state
            .balance
            .checked_sub(amount)
            .ok_or_else(|| revert("Insufficient contract balance"))?;

        let claim = state.claim_record_mut(id)?;
        claim.status = ClaimStatus::Paid.code();
        claim.date_processed = Some(Utc::now());

        let policy = state.policy_record_mut(policy_id)?;
        policy.total_claims_paid = policy
            .total_claims_paid
            .checked_add(amount)
            .ok_or_else(|| revert("Balance overflow"))?;
        Ok(state.next_tx())
    }

    async fn deposit_funds(&self, value: Wei) -> Result<TxHash, ContractError> {
        self.require_insurer()?;
        if value.is_zero() {
            return Err(revert("Deposit must be greater than zero"));
        }
        let mut state = self.ledger.state.lock().await;
        state.balance = state
            .balance
            .checked_add(value)
            .ok_or_else(|| revert("Balance overflow"))?;
        Ok(state.next_tx())
    }

    async fn withdraw_funds(&self, amount: Wei) -> Result<TxHash, ContractError> {
        self.require_insurer()?;
        let mut state = self.ledger.state.lock().await;
        state.balance = state
            .balance
            .checked_sub(amount)
            .ok_or_else(|| revert("Insufficient contract balance"))?;
        Ok(state.next_tx())
    }

    async fn wait_for_inclusion(&self, _tx: &TxHash) -> Result<(), ContractError> {
        // Dev transactions are mined instantly.
        Ok(())
    }
}

/// Binds `DevChain` handles against one shared ledger.
pub struct DevConnector {
    ledger: Arc<Ledger>,
}

impl DevConnector {
    pub fn new(ledger: Arc<Ledger>) -> Arc<Self> {
        Arc::new(Self { ledger })
    }
}

#[async_trait]
impl ContractConnector for DevConnector {
    async fn bind(
        &self,
        _provider: Arc<dyn Provider>,
        account: &Address,
    ) -> Result<Arc<dyn InsuranceContract>, ContractError> {
        Ok(Arc::new(DevChain {
            ledger: Arc::clone(&self.ledger),
            signer: account.clone(),
        }))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
