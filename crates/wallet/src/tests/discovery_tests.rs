use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::Instant;

use shared::{
    domain::{Address, ChainId},
    protocol::{NetworkDescriptor, ProviderEvent},
};

use super::*;
use crate::{ProviderError, ProviderInfo};

struct StubProvider {
    info: ProviderInfo,
    events: broadcast::Sender<ProviderEvent>,
}

impl StubProvider {
    fn named(name: &str) -> Arc<Self> {
        let (events, _) = broadcast::channel(4);
        Arc::new(Self {
            info: ProviderInfo::new(name),
            events,
        })
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn info(&self) -> ProviderInfo {
        self.info.clone()
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(Vec::new())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(Vec::new())
    }

    async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn add_chain(&self, _network: &NetworkDescriptor) -> Result<(), ProviderError> {
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[tokio::test(start_paused = true)]
async fn absence_costs_exactly_max_attempts_minus_one_delays() {
    let registry = ProviderRegistry::new();
    let delay = Duration::from_millis(200);

    let started = Instant::now();
    let found = resolve(&registry, 5, delay).await;

    assert!(found.is_none());
    assert_eq!(started.elapsed(), delay * 4);
}

#[tokio::test]
async fn preferred_brand_wins_regardless_of_announcement_order() {
    for names in [["Rabby Wallet", "MetaMask"], ["MetaMask", "Rabby Wallet"]] {
        let registry = ProviderRegistry::new();
        for name in names {
            registry.announce(StubProvider::named(name)).await;
        }

        let found = resolve(&registry, 1, Duration::from_millis(1))
            .await
            .expect("provider");
        assert_eq!(found.info().name, "MetaMask");
    }
}

#[tokio::test]
async fn first_announced_wins_without_a_brand_match() {
    let registry = ProviderRegistry::new();
    registry.announce(StubProvider::named("Rabby Wallet")).await;
    registry.announce(StubProvider::named("Frame")).await;

    let found = resolve(&registry, 1, Duration::from_millis(1))
        .await
        .expect("provider");
    assert_eq!(found.info().name, "Rabby Wallet");
}

#[tokio::test]
async fn injected_slot_wins_over_announced_providers() {
    let registry = ProviderRegistry::new();
    registry.announce(StubProvider::named("MetaMask")).await;
    registry.set_injected(StubProvider::named("Injected")).await;

    let found = resolve(&registry, 1, Duration::from_millis(1))
        .await
        .expect("provider");
    assert_eq!(found.info().name, "Injected");
}

#[tokio::test(start_paused = true)]
async fn late_announcement_is_picked_up_on_a_later_attempt() {
    let registry = ProviderRegistry::new();

    let announcer = Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        announcer.announce(StubProvider::named("MetaMask")).await;
    });

    let found = resolve(&registry, 5, Duration::from_millis(200)).await;
    assert_eq!(found.expect("provider").info().name, "MetaMask");
}

#[tokio::test(start_paused = true)]
async fn cancelled_discovery_resolves_to_absence() {
    let registry = ProviderRegistry::new();
    let task = DiscoveryTask::spawn(Arc::clone(&registry), 1_000, Duration::from_millis(100));

    task.cancel();
    assert!(task.into_result().await.is_none());
}

#[tokio::test]
async fn discovery_request_reaches_wallet_subscribers() {
    let registry = ProviderRegistry::new();
    let mut requests = registry.subscribe_requests();

    registry.request_announcements();
    assert!(requests.recv().await.is_ok());
}
