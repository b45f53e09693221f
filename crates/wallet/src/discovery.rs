use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::Provider;

/// Brand preferred when several providers announce themselves.
pub const DEFAULT_PREFERRED_BRAND: &str = "metamask";

/// Registry of wallet providers visible to this process: the well-known
/// injected slot, plus providers that announce themselves in response to a
/// broadcast discovery request (the announce/request event pair).
pub struct ProviderRegistry {
    injected: RwLock<Option<Arc<dyn Provider>>>,
    announced: RwLock<Vec<Arc<dyn Provider>>>,
    announce_requests: broadcast::Sender<()>,
}

impl ProviderRegistry {
    pub fn new() -> Arc<Self> {
        let (announce_requests, _) = broadcast::channel(16);
        Arc::new(Self {
            injected: RwLock::new(None),
            announced: RwLock::new(Vec::new()),
            announce_requests,
        })
    }

    /// Host-environment side: install the well-known injected provider.
    pub async fn set_injected(&self, provider: Arc<dyn Provider>) {
        *self.injected.write().await = Some(provider);
    }

    /// Wallet side: announce a provider. Announcement order is preserved.
    pub async fn announce(&self, provider: Arc<dyn Provider>) {
        debug!(name = %provider.info().name, "provider announced");
        self.announced.write().await.push(provider);
    }

    /// Wallet side: listen for discovery requests and re-announce on each.
    pub fn subscribe_requests(&self) -> broadcast::Receiver<()> {
        self.announce_requests.subscribe()
    }

    /// Broadcast a discovery request so lazily-registering wallets announce.
    pub fn request_announcements(&self) {
        let _ = self.announce_requests.send(());
    }

    /// One discovery pass: the injected slot wins, then an announced provider
    /// carrying the preferred brand in its name, then the first announced.
    pub async fn pick(&self, preferred_brand: &str) -> Option<Arc<dyn Provider>> {
        if let Some(provider) = self.injected.read().await.clone() {
            return Some(provider);
        }

        let announced = self.announced.read().await;
        let brand = preferred_brand.to_ascii_lowercase();
        if let Some(provider) = announced
            .iter()
            .find(|p| p.info().name.to_ascii_lowercase().contains(&brand))
        {
            return Some(Arc::clone(provider));
        }
        announced.first().cloned()
    }
}

/// Polls the registry up to `max_attempts` times, `delay` apart. Returns
/// `None` when no provider ever appears; absence is a normal, user-actionable
/// state, not a fault. Performs exactly `max_attempts - 1` delays in that
/// case: there is no point sleeping after the final check.
pub async fn resolve(
    registry: &ProviderRegistry,
    max_attempts: u32,
    delay: Duration,
) -> Option<Arc<dyn Provider>> {
    registry.request_announcements();

    for attempt in 1..=max_attempts {
        if let Some(provider) = registry.pick(DEFAULT_PREFERRED_BRAND).await {
            info!(
                name = %provider.info().name,
                attempt,
                "wallet provider resolved"
            );
            return Some(provider);
        }

        if attempt < max_attempts {
            debug!(attempt, max_attempts, "waiting for wallet provider");
            tokio::time::sleep(delay).await;
        }
    }

    info!(max_attempts, "no wallet provider appeared");
    None
}

/// A discovery poll running as its own task so a navigated-away caller can
/// cancel it instead of leaking the pending poll.
pub struct DiscoveryTask {
    handle: Option<JoinHandle<Option<Arc<dyn Provider>>>>,
}

impl DiscoveryTask {
    pub fn spawn(registry: Arc<ProviderRegistry>, max_attempts: u32, delay: Duration) -> Self {
        let handle = tokio::spawn(async move { resolve(&registry, max_attempts, delay).await });
        Self {
            handle: Some(handle),
        }
    }

    /// Stops the poll. A cancelled task resolves to absence.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub async fn into_result(mut self) -> Option<Arc<dyn Provider>> {
        let Some(handle) = self.handle.take() else {
            return None;
        };
        match handle.await {
            Ok(found) => found,
            Err(_) => None,
        }
    }
}

impl Drop for DiscoveryTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/discovery_tests.rs"]
mod tests;
