use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use shared::{domain::Address, error::DappError, protocol::NetworkDescriptor};
use wallet::{resolve, Provider, ProviderError, ProviderRegistry};

use crate::contract::{ContractConnector, InsuranceContract};

/// An authenticated contract binding. Created on connect, replaced wholesale
/// on account change, torn down on disconnect or network change; there is no
/// process-wide mutable session.
#[derive(Clone)]
pub struct Session {
    pub account: Address,
    pub is_admin: bool,
    pub provider: Arc<dyn Provider>,
    pub contract: Arc<dyn InsuranceContract>,
}

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub network: NetworkDescriptor,
    pub resolve_attempts: u32,
    pub resolve_delay: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            network: NetworkDescriptor::hardhat_local(),
            resolve_attempts: 20,
            resolve_delay: Duration::from_millis(250),
        }
    }
}

pub struct SessionManager {
    registry: Arc<ProviderRegistry>,
    connector: Arc<dyn ContractConnector>,
    config: ConnectConfig,
}

impl SessionManager {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        connector: Arc<dyn ContractConnector>,
        config: ConnectConfig,
    ) -> Self {
        Self {
            registry,
            connector,
            config,
        }
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.config.network
    }

    /// Full connect flow: resolve a provider, line up the network, request
    /// authorization, bind the contract and evaluate the privilege flag.
    pub async fn connect(&self) -> Result<Session, DappError> {
        let provider = resolve(
            &self.registry,
            self.config.resolve_attempts,
            self.config.resolve_delay,
        )
        .await
        .ok_or(DappError::NoProvider)?;

        // Some wallets already sit on the right network; a failed switch is
        // degraded, not fatal.
        if let Err(err) = self.ensure_target_network(provider.as_ref()).await {
            warn!(%err, "continuing on the wallet's current network");
        }

        let accounts = provider
            .request_accounts()
            .await
            .map_err(authorization_error)?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or(DappError::ConnectionDenied)?;

        self.bind(provider, account).await
    }

    /// Silent session restore: succeeds only if a provider is present and an
    /// account is already authorized. Never prompts.
    pub async fn restore(&self) -> Result<Option<Session>, DappError> {
        let Some(provider) = resolve(
            &self.registry,
            self.config.resolve_attempts,
            self.config.resolve_delay,
        )
        .await
        else {
            return Ok(None);
        };

        let accounts = match provider.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(%err, "no previous session found");
                return Ok(None);
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            return Ok(None);
        };

        info!(account = %account, "restoring previous session");
        self.bind(provider, account).await.map(Some)
    }

    /// Steps 4–5 of the connect flow, also re-run when the wallet reports an
    /// account change: bind the contract handle and evaluate the admin flag.
    pub async fn bind(
        &self,
        provider: Arc<dyn Provider>,
        account: Address,
    ) -> Result<Session, DappError> {
        let contract = self
            .connector
            .bind(Arc::clone(&provider), &account)
            .await
            .map_err(|err| DappError::Transport(err.to_string()))?;

        // Privilege check is case-insensitive; Address normalizes on
        // construction. A failed read degrades to a non-admin session.
        let is_admin = match contract.insurer().await {
            Ok(insurer) => insurer == account,
            Err(err) => {
                warn!(%err, "could not check privileged address; assuming ordinary user");
                false
            }
        };

        info!(account = %account, is_admin, "session established");
        Ok(Session {
            account,
            is_admin,
            provider,
            contract,
        })
    }

    /// Switch to the target network, registering it first if the wallet does
    /// not recognize the chain, then retrying the switch once.
    async fn ensure_target_network(&self, provider: &dyn Provider) -> Result<(), DappError> {
        let chain_id = self.config.network.chain_id;
        match provider.switch_chain(chain_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unrecognized_chain() => {
                info!(chain = %chain_id.as_hex(), "registering target network with wallet");
                provider
                    .add_chain(&self.config.network)
                    .await
                    .map_err(|err| DappError::NetworkMismatch(err.to_string()))?;
                provider
                    .switch_chain(chain_id)
                    .await
                    .map_err(|err| DappError::NetworkMismatch(err.to_string()))
            }
            Err(err) => Err(DappError::NetworkMismatch(err.to_string())),
        }
    }
}

fn authorization_error(err: ProviderError) -> DappError {
    if err.is_user_rejection() {
        DappError::ConnectionDenied
    } else {
        DappError::Transport(err.to_string())
    }
}
