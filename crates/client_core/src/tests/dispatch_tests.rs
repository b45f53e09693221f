use super::*;
use shared::{domain::PolicyId, projection::PolicyType};

fn claim_command(policy_id: Option<PolicyId>, amount: &str) -> Command {
    Command::SubmitClaim {
        policy_id,
        amount_ether: amount.to_string(),
        description: "Broken arm treatment".to_string(),
        medical_provider: "City Hospital".to_string(),
    }
}

#[test]
fn claim_without_selected_policy_is_invalid() {
    let err = prepare(&claim_command(None, "0.5")).expect_err("must fail");
    assert!(matches!(err, DappError::InvalidInput(_)));
}

#[test]
fn claim_amount_is_converted_to_base_units() {
    let prepared = prepare(&claim_command(Some(PolicyId(1)), "0.05")).expect("valid");
    match prepared {
        PreparedCommand::SubmitClaim { amount, .. } => {
            assert_eq!(amount, Wei(50_000_000_000_000_000));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn unparseable_or_zero_amounts_are_invalid() {
    for raw in ["abc", "", "-1", "0", "0.0", "0.0000000000000000001"] {
        let err = prepare(&claim_command(Some(PolicyId(1)), raw)).expect_err(raw);
        assert!(matches!(err, DappError::InvalidInput(_)), "{raw}");
    }
}

#[test]
fn create_policy_attaches_the_plan_premium() {
    let prepared = prepare(&Command::CreatePolicy {
        holder_name: "Ada".to_string(),
        policy_type: PolicyType::Standard,
    })
    .expect("valid");
    match prepared {
        PreparedCommand::CreatePolicy { value, .. } => {
            assert_eq!(value, PolicyType::Standard.premium());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn blank_holder_name_is_invalid() {
    let err = prepare(&Command::CreatePolicy {
        holder_name: "   ".to_string(),
        policy_type: PolicyType::Basic,
    })
    .expect_err("must fail");
    assert!(matches!(err, DappError::InvalidInput(_)));
}

#[test]
fn blank_rejection_reason_is_invalid() {
    let err = prepare(&Command::RejectClaim {
        claim_id: ClaimId(3),
        reason: String::new(),
    })
    .expect_err("must fail");
    assert!(matches!(err, DappError::InvalidInput(_)));
}

#[test]
fn commands_on_the_same_claim_share_a_key() {
    let account = Address::new("0xabc");
    let approve = prepare(&Command::ApproveClaim { claim_id: ClaimId(7) }).expect("valid");
    let pay = prepare(&Command::PayClaim { claim_id: ClaimId(7) }).expect("valid");
    assert_eq!(approve.key(&account), pay.key(&account));
}

#[test]
fn treasury_commands_share_a_key() {
    let account = Address::new("0xabc");
    let deposit = prepare(&Command::Deposit {
        amount_ether: "1".to_string(),
    })
    .expect("valid");
    let withdraw = prepare(&Command::Withdraw {
        amount_ether: "0.5".to_string(),
    })
    .expect("valid");
    assert_eq!(deposit.key(&account), CommandKey::Treasury);
    assert_eq!(deposit.key(&account), withdraw.key(&account));
}
