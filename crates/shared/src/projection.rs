//! Read projections of the contract's authoritative state. The contract
//! reports statuses as bare integers; they are converted to tagged variants
//! here, at the read boundary, so nothing downstream compares raw numbers.
//! Projections are caches of on-chain truth, never a second source of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{Address, ClaimId, PolicyId},
    units::Wei,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} discriminant {value}")]
pub struct UnknownDiscriminant {
    pub kind: &'static str,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            PolicyStatus::Active => "Active",
            PolicyStatus::Expired => "Expired",
            PolicyStatus::Cancelled => "Cancelled",
        }
    }
}

impl TryFrom<u8> for PolicyStatus {
    type Error = UnknownDiscriminant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PolicyStatus::Active),
            1 => Ok(PolicyStatus::Expired),
            2 => Ok(PolicyStatus::Cancelled),
            _ => Err(UnknownDiscriminant {
                kind: "policy status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl ClaimStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Paid => "Paid",
        }
    }

    /// A claim counts toward the "approved" tally once accepted, whether or
    /// not the payout has gone through yet.
    pub fn is_accepted(self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Paid)
    }
}

impl TryFrom<u8> for ClaimStatus {
    type Error = UnknownDiscriminant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClaimStatus::Pending),
            1 => Ok(ClaimStatus::Approved),
            2 => Ok(ClaimStatus::Rejected),
            3 => Ok(ClaimStatus::Paid),
            _ => Err(UnknownDiscriminant {
                kind: "claim status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Basic,
    Standard,
    Premium,
    Enterprise,
}

impl PolicyType {
    pub const ALL: [PolicyType; 4] = [
        PolicyType::Basic,
        PolicyType::Standard,
        PolicyType::Premium,
        PolicyType::Enterprise,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            PolicyType::Basic => "Basic",
            PolicyType::Standard => "Standard",
            PolicyType::Premium => "Premium",
            PolicyType::Enterprise => "Enterprise",
        }
    }

    /// Premium attached as transaction value when the policy is created.
    pub fn premium(self) -> Wei {
        match self {
            PolicyType::Basic => Wei(10_000_000_000_000_000),       // 0.01 ETH
            PolicyType::Standard => Wei(50_000_000_000_000_000),    // 0.05 ETH
            PolicyType::Premium => Wei(100_000_000_000_000_000),    // 0.1 ETH
            PolicyType::Enterprise => Wei(500_000_000_000_000_000), // 0.5 ETH
        }
    }

    pub fn coverage(self) -> Wei {
        match self {
            PolicyType::Basic => Wei(1_000_000_000_000_000_000),       // 1 ETH
            PolicyType::Standard => Wei(5_000_000_000_000_000_000),    // 5 ETH
            PolicyType::Premium => Wei(10_000_000_000_000_000_000),    // 10 ETH
            PolicyType::Enterprise => Wei(50_000_000_000_000_000_000), // 50 ETH
        }
    }
}

impl TryFrom<u8> for PolicyType {
    type Error = UnknownDiscriminant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PolicyType::Basic),
            1 => Ok(PolicyType::Standard),
            2 => Ok(PolicyType::Premium),
            3 => Ok(PolicyType::Enterprise),
            _ => Err(UnknownDiscriminant {
                kind: "policy type",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub holder: Address,
    pub holder_name: String,
    pub coverage_amount: Wei,
    pub premium: Wei,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PolicyStatus,
    pub policy_type: PolicyType,
    pub claims_made: u64,
    pub total_claims_paid: Wei,
}

impl Policy {
    /// Whether the holder may submit a claim against this policy.
    pub fn is_claim_eligible(&self) -> bool {
        self.status == PolicyStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub policy_id: PolicyId,
    pub claimant: Address,
    pub amount: Wei,
    pub description: String,
    pub medical_provider: String,
    pub date_submitted: DateTime<Utc>,
    pub date_processed: Option<DateTime<Utc>>,
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
}
