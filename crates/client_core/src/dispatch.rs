//! Command dispatch. A command maps 1:1 to one contract state transition.
//! The dispatcher validates selections, converts human decimal amounts to
//! base units, guards against overlapping operations on the same entity,
//! sends, and waits for inclusion. It never interprets revert reasons.

use std::fmt;

use shared::{
    domain::{Address, ClaimId, PolicyId, TxHash},
    error::DappError,
    projection::PolicyType,
    units::Wei,
};

use crate::{contract::ContractError, session::Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreatePolicy {
        holder_name: String,
        policy_type: PolicyType,
    },
    CancelPolicy {
        policy_id: PolicyId,
    },
    SubmitClaim {
        /// `None` when the user has not picked a policy yet; rejected before
        /// any network call.
        policy_id: Option<PolicyId>,
        amount_ether: String,
        description: String,
        medical_provider: String,
    },
    ApproveClaim {
        claim_id: ClaimId,
    },
    RejectClaim {
        claim_id: ClaimId,
        reason: String,
    },
    PayClaim {
        claim_id: ClaimId,
    },
    Deposit {
        amount_ether: String,
    },
    Withdraw {
        amount_ether: String,
    },
}

/// The conceptual resource a command mutates. Two commands with the same key
/// must not be in flight at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandKey {
    NewPolicy(Address),
    Policy(PolicyId),
    Claim(ClaimId),
    Treasury,
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKey::NewPolicy(account) => write!(f, "a new policy for {}", account.short()),
            CommandKey::Policy(id) => write!(f, "policy #{id}"),
            CommandKey::Claim(id) => write!(f, "claim #{id}"),
            CommandKey::Treasury => write!(f, "the contract treasury"),
        }
    }
}

/// A validated command with amounts already converted to base units.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PreparedCommand {
    CreatePolicy {
        holder_name: String,
        policy_type: PolicyType,
        value: Wei,
    },
    CancelPolicy {
        policy_id: PolicyId,
    },
    SubmitClaim {
        policy_id: PolicyId,
        amount: Wei,
        description: String,
        medical_provider: String,
    },
    ApproveClaim {
        claim_id: ClaimId,
    },
    RejectClaim {
        claim_id: ClaimId,
        reason: String,
    },
    PayClaim {
        claim_id: ClaimId,
    },
    Deposit {
        value: Wei,
    },
    Withdraw {
        amount: Wei,
    },
}

impl PreparedCommand {
    pub(crate) fn key(&self, account: &Address) -> CommandKey {
        match self {
            PreparedCommand::CreatePolicy { .. } => CommandKey::NewPolicy(account.clone()),
            PreparedCommand::CancelPolicy { policy_id } => CommandKey::Policy(*policy_id),
            PreparedCommand::SubmitClaim { policy_id, .. } => CommandKey::Policy(*policy_id),
            PreparedCommand::ApproveClaim { claim_id }
            | PreparedCommand::RejectClaim { claim_id, .. }
            | PreparedCommand::PayClaim { claim_id } => CommandKey::Claim(*claim_id),
            PreparedCommand::Deposit { .. } | PreparedCommand::Withdraw { .. } => {
                CommandKey::Treasury
            }
        }
    }

    pub(crate) fn success_message(&self) -> &'static str {
        match self {
            PreparedCommand::CreatePolicy { .. } => "Policy created successfully!",
            PreparedCommand::CancelPolicy { .. } => "Policy cancelled.",
            PreparedCommand::SubmitClaim { .. } => "Claim submitted successfully!",
            PreparedCommand::ApproveClaim { .. } => "Claim approved!",
            PreparedCommand::RejectClaim { .. } => "Claim rejected!",
            PreparedCommand::PayClaim { .. } => "Claim paid successfully!",
            PreparedCommand::Deposit { .. } => "Funds deposited successfully!",
            PreparedCommand::Withdraw { .. } => "Funds withdrawn successfully!",
        }
    }
}

/// Pure validation and unit conversion. Fails fast with `InvalidInput`
/// before anything touches the network.
pub(crate) fn prepare(command: &Command) -> Result<PreparedCommand, DappError> {
    match command {
        Command::CreatePolicy {
            holder_name,
            policy_type,
        } => {
            let holder_name = required(holder_name, "holder name")?;
            Ok(PreparedCommand::CreatePolicy {
                holder_name,
                policy_type: *policy_type,
                value: policy_type.premium(),
            })
        }
        Command::CancelPolicy { policy_id } => Ok(PreparedCommand::CancelPolicy {
            policy_id: *policy_id,
        }),
        Command::SubmitClaim {
            policy_id,
            amount_ether,
            description,
            medical_provider,
        } => {
            let policy_id = policy_id.ok_or_else(|| {
                DappError::InvalidInput("select a policy before submitting a claim".into())
            })?;
            Ok(PreparedCommand::SubmitClaim {
                policy_id,
                amount: positive_amount(amount_ether)?,
                description: required(description, "claim description")?,
                medical_provider: required(medical_provider, "medical provider")?,
            })
        }
        Command::ApproveClaim { claim_id } => Ok(PreparedCommand::ApproveClaim {
            claim_id: *claim_id,
        }),
        Command::RejectClaim { claim_id, reason } => Ok(PreparedCommand::RejectClaim {
            claim_id: *claim_id,
            reason: required(reason, "rejection reason")?,
        }),
        Command::PayClaim { claim_id } => Ok(PreparedCommand::PayClaim {
            claim_id: *claim_id,
        }),
        Command::Deposit { amount_ether } => Ok(PreparedCommand::Deposit {
            value: positive_amount(amount_ether)?,
        }),
        Command::Withdraw { amount_ether } => Ok(PreparedCommand::Withdraw {
            amount: positive_amount(amount_ether)?,
        }),
    }
}

/// Sends the prepared transition and returns its transaction hash. Inclusion
/// is awaited separately by the caller.
pub(crate) async fn send(
    session: &Session,
    prepared: &PreparedCommand,
) -> Result<TxHash, DappError> {
    let contract = session.contract.as_ref();
    let sent = match prepared {
        PreparedCommand::CreatePolicy {
            holder_name,
            policy_type,
            value,
        } => {
            contract
                .create_policy(holder_name, *policy_type, *value)
                .await
        }
        PreparedCommand::CancelPolicy { policy_id } => contract.cancel_policy(*policy_id).await,
        PreparedCommand::SubmitClaim {
            policy_id,
            amount,
            description,
            medical_provider,
        } => {
            contract
                .submit_claim(*policy_id, *amount, description, medical_provider)
                .await
        }
        PreparedCommand::ApproveClaim { claim_id } => contract.approve_claim(*claim_id).await,
        PreparedCommand::RejectClaim { claim_id, reason } => {
            contract.reject_claim(*claim_id, reason).await
        }
        PreparedCommand::PayClaim { claim_id } => contract.pay_claim(*claim_id).await,
        PreparedCommand::Deposit { value } => contract.deposit_funds(*value).await,
        PreparedCommand::Withdraw { amount } => contract.withdraw_funds(*amount).await,
    };
    sent.map_err(map_contract_error)
}

pub(crate) fn map_contract_error(err: ContractError) -> DappError {
    match err {
        ContractError::SignatureRejected => DappError::UserRejected,
        ContractError::Reverted(reason) => DappError::ContractReverted { reason },
        ContractError::Transport(message) => DappError::Transport(message),
    }
}

fn required(raw: &str, field: &str) -> Result<String, DappError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DappError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn positive_amount(raw: &str) -> Result<Wei, DappError> {
    let amount =
        Wei::from_ether_str(raw).map_err(|err| DappError::InvalidInput(err.to_string()))?;
    if amount.is_zero() {
        return Err(DappError::InvalidInput(
            "amount must be greater than zero".into(),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
