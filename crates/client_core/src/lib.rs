//! Session/controller core for the insurance DApp frontend: provider
//! resolution, session management, read-model synchronization and command
//! dispatch. Rendering is out of scope; consumers subscribe to the event
//! stream and read immutable view snapshots.

use std::{collections::HashSet, sync::Arc};

use tokio::{
    sync::{broadcast, Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{info, warn};

use shared::{
    domain::Address,
    error::{DappError, Severity},
    protocol::ProviderEvent,
};
use wallet::{Provider, ProviderRegistry};

pub mod contract;
pub mod dispatch;
pub mod session;
pub mod sync;

pub use contract::{ContractConnector, ContractError, InsuranceContract, MissingContractConnector};
pub use dispatch::{Command, CommandKey};
pub use session::{ConnectConfig, Session, SessionManager};
pub use sync::{AdminViewState, ViewState};

/// Events surfaced to the presentation layer. View snapshots are carried in
/// the event so renderers never reach into shared mutable state.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Connected { account: Address, is_admin: bool },
    Disconnected,
    ViewUpdated(ViewState),
    AdminViewUpdated(AdminViewState),
    /// The wallet moved to another network; every cached projection is
    /// invalid and the embedding surface must start over.
    ReloadRequired,
    Notification { severity: Severity, message: String },
}

pub struct DappClient {
    sessions: SessionManager,
    session: RwLock<Option<Session>>,
    view: RwLock<ViewState>,
    admin_view: RwLock<AdminViewState>,
    inflight: Mutex<HashSet<CommandKey>>,
    events: broadcast::Sender<ClientEvent>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl DappClient {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        connector: Arc<dyn ContractConnector>,
        config: ConnectConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            sessions: SessionManager::new(registry, connector, config),
            session: RwLock::new(None),
            view: RwLock::new(ViewState::default()),
            admin_view: RwLock::new(AdminViewState::default()),
            inflight: Mutex::new(HashSet::new()),
            events,
            listener: Mutex::new(None),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn view(&self) -> ViewState {
        self.view.read().await.clone()
    }

    pub async fn admin_view(&self) -> AdminViewState {
        self.admin_view.read().await.clone()
    }

    /// Interactive connect. Every failure resolves to a notification and the
    /// client returns to idle.
    pub async fn connect(self: &Arc<Self>) -> Result<(), DappError> {
        match self.sessions.connect().await {
            Ok(session) => {
                self.install_session(session).await;
                self.refresh().await;
                self.notify(Severity::Info, "Wallet connected successfully!");
                Ok(())
            }
            Err(err) => {
                self.notify(err.severity(), err.to_string());
                Err(err)
            }
        }
    }

    /// Non-interactive restore on startup: binds a session only when the
    /// wallet already authorized this origin. Returns whether it did.
    pub async fn try_restore(self: &Arc<Self>) -> Result<bool, DappError> {
        match self.sessions.restore().await? {
            Some(session) => {
                self.install_session(session).await;
                self.refresh().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn disconnect(&self) {
        self.clear_session(true).await;
        let _ = self.events.send(ClientEvent::Disconnected);
    }

    /// Re-derives the view from authoritative reads. On failure the previous
    /// view is retained: stale-but-consistent beats crashing here.
    pub async fn refresh(&self) {
        let Some(session) = self.session().await else {
            return;
        };

        match sync::refresh(&session).await {
            Ok(view) => {
                *self.view.write().await = view.clone();
                let _ = self.events.send(ClientEvent::ViewUpdated(view));
            }
            Err(err) => {
                warn!(%err, "view refresh failed; keeping previous view state");
            }
        }

        if session.is_admin {
            match sync::refresh_admin(&session).await {
                Ok(view) => {
                    *self.admin_view.write().await = view.clone();
                    let _ = self.events.send(ClientEvent::AdminViewUpdated(view));
                }
                Err(err) => {
                    warn!(%err, "admin view refresh failed; keeping previous view state");
                }
            }
        }
    }

    /// Validates, guards, sends, waits for inclusion, then refreshes. The
    /// post-settlement refresh is guaranteed to observe the transaction's
    /// effects because inclusion is awaited first.
    pub async fn submit(&self, command: Command) -> Result<(), DappError> {
        match self.submit_inner(&command).await {
            Ok(message) => {
                self.notify(Severity::Info, message);
                Ok(())
            }
            Err(err) => {
                self.notify(err.severity(), err.to_string());
                Err(err)
            }
        }
    }

    async fn submit_inner(&self, command: &Command) -> Result<&'static str, DappError> {
        let session = self
            .session()
            .await
            .ok_or_else(|| DappError::InvalidInput("connect a wallet first".into()))?;

        let prepared = dispatch::prepare(command)?;
        let key = prepared.key(&session.account);
        {
            let mut inflight = self.inflight.lock().await;
            if !inflight.insert(key.clone()) {
                return Err(DappError::AlreadyPending(key.to_string()));
            }
        }

        let settled = async {
            let tx = dispatch::send(&session, &prepared).await?;
            info!(tx = %tx, "transaction submitted; waiting for inclusion");
            session
                .contract
                .wait_for_inclusion(&tx)
                .await
                .map_err(dispatch::map_contract_error)
        }
        .await;

        // Release on success and failure alike.
        self.inflight.lock().await.remove(&key);
        settled?;

        self.refresh().await;
        Ok(prepared.success_message())
    }

    async fn install_session(self: &Arc<Self>, session: Session) {
        if let Some(old) = self.listener.lock().await.take() {
            old.abort();
        }

        let account = session.account.clone();
        let is_admin = session.is_admin;
        let provider = Arc::clone(&session.provider);
        *self.session.write().await = Some(session);

        let handle = self.spawn_provider_listener(provider);
        *self.listener.lock().await = Some(handle);

        let _ = self
            .events
            .send(ClientEvent::Connected { account, is_admin });
    }

    /// `abort_listener` must be false when called from the listener task
    /// itself; the task ends by returning instead.
    async fn clear_session(&self, abort_listener: bool) {
        let handle = self.listener.lock().await.take();
        if abort_listener {
            if let Some(handle) = handle {
                handle.abort();
            }
        }
        *self.session.write().await = None;
        *self.view.write().await = ViewState::default();
        *self.admin_view.write().await = AdminViewState::default();
    }

    fn spawn_provider_listener(self: &Arc<Self>, provider: Arc<dyn Provider>) -> JoinHandle<()> {
        let mut events = provider.subscribe_events();
        let client = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ProviderEvent::AccountsChanged(accounts)) => {
                        match accounts.into_iter().next() {
                            Some(account) => {
                                client.handle_account_switch(account).await;
                            }
                            None => {
                                info!("wallet disconnected all accounts");
                                client.clear_session(false).await;
                                let _ = client.events.send(ClientEvent::Disconnected);
                                break;
                            }
                        }
                    }
                    Ok(ProviderEvent::ChainChanged(chain_id)) => {
                        info!(chain = %chain_id.as_hex(), "network changed; cached projections invalid");
                        client.clear_session(false).await;
                        let _ = client.events.send(ClientEvent::ReloadRequired);
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "provider event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn handle_account_switch(&self, account: Address) {
        let Some(current) = self.session().await else {
            return;
        };
        if current.account == account {
            return;
        }

        info!(account = %account, "wallet switched accounts; rebinding session");
        match self.sessions.bind(current.provider, account).await {
            Ok(session) => {
                let account = session.account.clone();
                let is_admin = session.is_admin;
                *self.session.write().await = Some(session);
                // Refresh only rebuilds the admin view for admin sessions, so
                // an admin-to-ordinary switch must drop the old buckets here.
                if !is_admin {
                    *self.admin_view.write().await = AdminViewState::default();
                    let _ = self
                        .events
                        .send(ClientEvent::AdminViewUpdated(AdminViewState::default()));
                }
                let _ = self
                    .events
                    .send(ClientEvent::Connected { account, is_admin });
                self.refresh().await;
            }
            Err(err) => {
                warn!(%err, "failed to rebind session after account change");
                self.notify(err.severity(), err.to_string());
            }
        }
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        let _ = self.events.send(ClientEvent::Notification {
            severity,
            message: message.into(),
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
