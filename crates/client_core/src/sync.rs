//! Read-model synchronization. Every quantity is re-derived from scratch on
//! each call from authoritative contract reads; there is no incremental
//! diffing. This is a low-frequency, human-triggered path where reflecting
//! on-chain truth matters more than saving round trips.

use serde::{Deserialize, Serialize};

use shared::{
    projection::{Claim, ClaimStatus, Policy},
    units::Wei,
};

use crate::{contract::ContractError, session::Session};

/// Immutable snapshot consumed by any rendering technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub contract_balance: Wei,
    pub total_policies: u64,
    pub pending_claims: u64,
    /// All of the caller's policies, any status.
    pub policies: Vec<Policy>,
    /// The subset a new claim may be filed against (active status only).
    pub claim_eligible: Vec<Policy>,
    pub claims: Vec<Claim>,
    /// Claims accepted by the insurer, whether paid out yet or not.
    pub approved_claims: u64,
}

/// Operator review buckets, derived by walking the full claim id space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminViewState {
    pub pending: Vec<Claim>,
    pub approved_awaiting_payment: Vec<Claim>,
}

pub async fn refresh(session: &Session) -> Result<ViewState, ContractError> {
    let contract = session.contract.as_ref();

    let contract_balance = contract.contract_balance().await?;
    let total_policies = contract.policy_counter().await?;
    let pending_claims = contract.pending_claims_count().await?;

    let mut policies = Vec::new();
    for id in contract.user_policies(&session.account).await? {
        policies.push(contract.policy(id).await?);
    }
    let claim_eligible = policies
        .iter()
        .filter(|policy| policy.is_claim_eligible())
        .cloned()
        .collect();

    let mut claims = Vec::new();
    for id in contract.user_claims(&session.account).await? {
        claims.push(contract.claim(id).await?);
    }
    let approved_claims = claims
        .iter()
        .filter(|claim| claim.status.is_accepted())
        .count() as u64;

    Ok(ViewState {
        contract_balance,
        total_policies,
        pending_claims,
        policies,
        claim_eligible,
        claims,
        approved_claims,
    })
}

/// Partitions every claim on record for operator review. Ordinary sessions
/// get an empty view without issuing a single read.
pub async fn refresh_admin(session: &Session) -> Result<AdminViewState, ContractError> {
    if !session.is_admin {
        return Ok(AdminViewState::default());
    }

    let contract = session.contract.as_ref();
    let claim_count = contract.claim_counter().await?;

    let mut view = AdminViewState::default();
    // Claim ids are assigned from 1.
    for raw_id in 1..=claim_count {
        let claim = contract.claim(shared::domain::ClaimId(raw_id)).await?;
        match claim.status {
            ClaimStatus::Pending => view.pending.push(claim),
            ClaimStatus::Approved => view.approved_awaiting_payment.push(claim),
            ClaimStatus::Rejected | ClaimStatus::Paid => {}
        }
    }
    Ok(view)
}
