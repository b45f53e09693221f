//! Types consumed from the wallet provider interface: the target network
//! descriptor and the change notifications a provider emits.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{Address, ChainId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The single network this client targets. Carried to the provider when the
/// wallet does not recognize the chain and it has to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_urls: Vec<Url>,
    pub native_currency: NativeCurrency,
}

impl NetworkDescriptor {
    /// The local development chain the original deployment targets.
    pub fn hardhat_local() -> Self {
        Self {
            chain_id: ChainId(31337),
            chain_name: "Hardhat Local".to_string(),
            rpc_urls: vec![Url::parse("http://127.0.0.1:8545").expect("static url")],
            native_currency: NativeCurrency {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        }
    }
}

/// Change notifications emitted by a provider. An empty account list means
/// the wallet disconnected from this origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardhat_descriptor_matches_deployment_defaults() {
        let network = NetworkDescriptor::hardhat_local();
        assert_eq!(network.chain_id.as_hex(), "0x7a69");
        assert_eq!(network.native_currency.decimals, 18);
    }

    #[test]
    fn provider_events_serialize_tagged() {
        let event = ProviderEvent::ChainChanged(ChainId(1));
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"chain_changed\""));
    }
}
