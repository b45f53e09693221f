//! Demo console: runs the full client flow against the in-process devnet.
//! A holder connects, buys a policy and files a claim; the wallet then
//! switches to the insurer account, which funds the pool and settles the
//! claim.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use client_core::{ClientEvent, Command, ConnectConfig, DappClient, ViewState};
use devnet::{DevConnector, DevWallet, Ledger};
use shared::{
    domain::{Address, ClaimId, PolicyId},
    projection::PolicyType,
    protocol::NetworkDescriptor,
};
use wallet::{Provider, ProviderRegistry};

mod config;

#[derive(Parser, Debug)]
#[command(about = "Health insurance client demo against an in-process devnet")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    /// Print view snapshots as JSON instead of summaries.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = config::load_settings(&args.config);

    let insurer = Address::new(&settings.insurer);
    let holder = Address::new(&settings.holder);
    let network = NetworkDescriptor::hardhat_local();

    let ledger = Ledger::new(insurer.clone());
    let dev_wallet = DevWallet::new(holder.clone(), &network);
    let registry = ProviderRegistry::new();
    registry
        .set_injected(dev_wallet.clone() as Arc<dyn Provider>)
        .await;

    let client = DappClient::new(
        registry,
        DevConnector::new(ledger),
        ConnectConfig {
            network,
            resolve_attempts: settings.resolve_attempts,
            resolve_delay: settings.resolve_delay(),
        },
    );
    spawn_event_logger(&client);

    info!(account = %holder, "connecting as policy holder");
    client.connect().await?;

    client
        .submit(Command::CreatePolicy {
            holder_name: "Console User".into(),
            policy_type: PolicyType::Standard,
        })
        .await?;
    client
        .submit(Command::SubmitClaim {
            policy_id: Some(PolicyId(1)),
            amount_ether: "0.5".into(),
            description: "Annual checkup".into(),
            medical_provider: "City Hospital".into(),
        })
        .await?;
    print_view(&client.view().await, args.json)?;

    info!(account = %insurer, "switching wallet to the insurer account");
    dev_wallet.switch_account(insurer.clone()).await;
    wait_for_account(&client, &insurer).await?;

    client
        .submit(Command::Deposit {
            amount_ether: "5".into(),
        })
        .await?;
    client
        .submit(Command::ApproveClaim {
            claim_id: ClaimId(1),
        })
        .await?;
    client
        .submit(Command::PayClaim {
            claim_id: ClaimId(1),
        })
        .await?;

    let admin_view = client.admin_view().await;
    info!(
        pending = admin_view.pending.len(),
        awaiting_payment = admin_view.approved_awaiting_payment.len(),
        "claim review queue after settlement"
    );
    print_view(&client.view().await, args.json)?;

    client.disconnect().await;
    Ok(())
}

fn spawn_event_logger(client: &Arc<DappClient>) {
    let mut events = BroadcastStream::new(client.subscribe_events());
    tokio::spawn(async move {
        while let Some(Ok(event)) = events.next().await {
            match event {
                ClientEvent::Connected { account, is_admin } => {
                    info!(%account, is_admin, "session established");
                }
                ClientEvent::Disconnected => info!("session ended"),
                ClientEvent::ViewUpdated(view) => {
                    info!(
                        balance = %view.contract_balance,
                        policies = view.policies.len(),
                        claims = view.claims.len(),
                        "view refreshed"
                    );
                }
                ClientEvent::AdminViewUpdated(view) => {
                    info!(
                        pending = view.pending.len(),
                        awaiting_payment = view.approved_awaiting_payment.len(),
                        "admin view refreshed"
                    );
                }
                ClientEvent::ReloadRequired => info!("network changed; restart required"),
                ClientEvent::Notification { severity, message } => {
                    info!(?severity, %message, "notification");
                }
            }
        }
    });
}

/// The rebind after an account change happens on the listener task; poll the
/// session until it lands.
async fn wait_for_account(client: &Arc<DappClient>, account: &Address) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let bound = client
                .session()
                .await
                .is_some_and(|session| session.account == *account);
            if bound {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("account switch was not observed")
}

fn print_view(view: &ViewState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!(
        "balance {} | policies {} | pending claims {} | approved claims {}",
        view.contract_balance,
        view.total_policies,
        view.pending_claims,
        view.approved_claims
    );
    for policy in &view.policies {
        println!(
            "  policy #{} {} {} coverage {} ({:?})",
            policy.id,
            policy.holder.short(),
            policy.policy_type.label(),
            policy.coverage_amount,
            policy.status
        );
    }
    for claim in &view.claims {
        println!(
            "  claim #{} on policy #{} for {} ({:?})",
            claim.id, claim.policy_id, claim.amount, claim.status
        );
    }
    Ok(())
}
