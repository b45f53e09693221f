//! The consumed contract interface. One trait method per authoritative read
//! or state transition; implementations own transport, signing and ABI
//! concerns. Reads return typed projections — raw status integers never
//! cross this boundary.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use shared::{
    domain::{Address, ClaimId, PolicyId, TxHash},
    projection::{Claim, Policy, PolicyType},
    units::Wei,
};
use wallet::{Provider, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The user declined to sign in the wallet.
    #[error("signature rejected by the wallet")]
    SignatureRejected,
    /// Authoritative rejection. The reason string is surfaced verbatim and
    /// never interpreted here.
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ContractError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        ContractError::Reverted(reason.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ContractError::Transport(message.into())
    }
}

impl From<ProviderError> for ContractError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            ContractError::SignatureRejected
        } else {
            ContractError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait InsuranceContract: Send + Sync {
    async fn insurer(&self) -> Result<Address, ContractError>;
    async fn policy_counter(&self) -> Result<u64, ContractError>;
    async fn claim_counter(&self) -> Result<u64, ContractError>;
    async fn policy(&self, id: PolicyId) -> Result<Policy, ContractError>;
    async fn claim(&self, id: ClaimId) -> Result<Claim, ContractError>;
    async fn user_policies(&self, user: &Address) -> Result<Vec<PolicyId>, ContractError>;
    async fn user_claims(&self, user: &Address) -> Result<Vec<ClaimId>, ContractError>;
    async fn contract_balance(&self) -> Result<Wei, ContractError>;
    async fn pending_claims_count(&self) -> Result<u64, ContractError>;

    async fn create_policy(
        &self,
        holder_name: &str,
        policy_type: PolicyType,
        value: Wei,
    ) -> Result<TxHash, ContractError>;
    async fn cancel_policy(&self, id: PolicyId) -> Result<TxHash, ContractError>;
    async fn submit_claim(
        &self,
        policy_id: PolicyId,
        amount: Wei,
        description: &str,
        medical_provider: &str,
    ) -> Result<TxHash, ContractError>;
    async fn approve_claim(&self, id: ClaimId) -> Result<TxHash, ContractError>;
    async fn reject_claim(&self, id: ClaimId, reason: &str) -> Result<TxHash, ContractError>;
    async fn pay_claim(&self, id: ClaimId) -> Result<TxHash, ContractError>;
    async fn deposit_funds(&self, value: Wei) -> Result<TxHash, ContractError>;
    async fn withdraw_funds(&self, amount: Wei) -> Result<TxHash, ContractError>;

    /// Blocks until the transaction is included. There is deliberately no
    /// cancellation path once a transaction is sent.
    async fn wait_for_inclusion(&self, tx: &TxHash) -> Result<(), ContractError>;
}

/// Produces a contract handle bound to a provider and signing account.
#[async_trait]
pub trait ContractConnector: Send + Sync {
    async fn bind(
        &self,
        provider: Arc<dyn Provider>,
        account: &Address,
    ) -> Result<Arc<dyn InsuranceContract>, ContractError>;
}

pub struct MissingContractConnector;

#[async_trait]
impl ContractConnector for MissingContractConnector {
    async fn bind(
        &self,
        _provider: Arc<dyn Provider>,
        account: &Address,
    ) -> Result<Arc<dyn InsuranceContract>, ContractError> {
        Err(ContractError::transport(format!(
            "no contract backend configured for account {account}"
        )))
    }
}
