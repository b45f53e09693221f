use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a failure should be presented. Nothing in this layer is fatal to the
/// process; every variant resolves to a dismissable notification and the
/// client returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DappError {
    #[error("no wallet provider detected; install or enable a wallet extension and reconnect")]
    NoProvider,
    #[error("wallet connection request was denied")]
    ConnectionDenied,
    #[error("could not switch to the target network: {0}")]
    NetworkMismatch(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transaction signature was rejected in the wallet")]
    UserRejected,
    #[error("contract reverted: {reason}")]
    ContractReverted { reason: String },
    #[error("an operation is already pending for {0}")]
    AlreadyPending(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DappError {
    /// Network mismatch is degraded-but-working; everything else is an error
    /// the user can act on and retry.
    pub fn severity(&self) -> Severity {
        match self {
            DappError::NetworkMismatch(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Every failure in this layer returns control to the idle state.
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
