//! Consumed wallet-provider interface and provider discovery.
//!
//! A provider is an externally injected capability: it may be absent, it may
//! appear late, and several may be present at once. Discovery tolerates all
//! three without treating any of them as an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use shared::{
    domain::{Address, ChainId},
    protocol::{NetworkDescriptor, ProviderEvent},
};

mod discovery;
pub use discovery::{resolve, DiscoveryTask, ProviderRegistry, DEFAULT_PREFERRED_BRAND};

/// Wallet error code for a user declining an authorization or signature
/// request (EIP-1193).
pub const CODE_USER_REJECTED: i64 = 4001;
/// Wallet error code for a chain the wallet does not know about yet.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(CODE_USER_REJECTED, "user rejected the request")
    }

    pub fn unrecognized_chain(chain_id: ChainId) -> Self {
        Self::new(
            CODE_UNRECOGNIZED_CHAIN,
            format!("unrecognized chain {}", chain_id.as_hex()),
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == CODE_USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == CODE_UNRECOGNIZED_CHAIN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A connected wallet/network endpoint. `accounts` is the silent query used
/// for session restore; `request_accounts` prompts the user and is the only
/// authorization point.
#[async_trait]
pub trait Provider: Send + Sync {
    fn info(&self) -> ProviderInfo;

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError>;

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent>;
}
