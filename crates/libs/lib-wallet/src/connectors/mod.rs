//! # Backend Connectors
//!
//! Two interchangeable backends sit behind the unified facade:
//!
//! - [`injected::InjectedConnector`] - standalone browser, extension / injected provider wallet
//! - [`host_frame::HostFrameConnector`] - embedded host frame, paired with the host identity
//!
//! Each wraps a distinct low-level wallet-connection library, abstracted here as
//! [`WalletLibrary`]. Connectors never own [`ConnectionState`](crate::state::ConnectionState);
//! they report what happened through an [`EventSink`] and the facade folds the events.

use alloy_primitives::Address;
use async_trait::async_trait;
use lib_core::{Result, WalletError};
use shared::BackendKind;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::types::{TransactionRequest, TxHash};

pub mod host_frame;
pub mod injected;

pub use host_frame::HostFrameConnector;
pub use injected::InjectedConnector;

/// A connector entry offered by a wallet library (MetaMask, Coinbase Wallet, the host frame...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
    /// Whether the connector can be used right now (extension installed, frame ready)
    pub ready: bool,
}

/// What the core needs from a low-level wallet-connection library.
#[async_trait]
pub trait WalletLibrary: Send + Sync {
    /// Library name, for logs
    fn name(&self) -> &str;

    /// Connectors the library can use
    fn connectors(&self) -> Vec<ConnectorInfo>;

    /// Run the library's connect action; resolves with the live account
    async fn connect(&self, connector_id: &str) -> Result<Address>;

    /// Currently observed account, if the library holds a live session
    fn current_account(&self) -> Option<Address>;

    /// Submit a transaction from `from` on `chain_id`; resolves with the transaction hash
    async fn send_transaction(&self, from: Address, chain_id: u64, request: &TransactionRequest) -> Result<TxHash>;

    /// Tear down the library session. May return [`WalletError::Unsupported`].
    async fn disconnect(&self) -> Result<()>;
}

/// Why a connect was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectTrigger {
    /// Explicit user gesture (Connect button)
    User,
    /// Gate in front of a mutating call (`requireConnection`)
    Implicit,
}

/// State changes a connector reports to the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorEvent {
    Connecting,
    Connected(Address),
    /// Attempt failed; `identity` is the host-verified address still known, if any
    ConnectFailed {
        error: WalletError,
        identity: Option<Address>,
    },
    /// Automatic attempts used up
    Exhausted { attempts: u32 },
    IdentityChanged(Option<Address>),
    Disconnected,
}

/// Callback through which connectors report events.
pub type EventSink = Arc<dyn Fn(ConnectorEvent) + Send + Sync>;

/// Sink that drops every event.
pub fn noop_sink() -> EventSink {
    Arc::new(|_| {})
}

/// Backend-specific connection and transaction primitives.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Live signing account
    fn account(&self) -> Option<Address>;

    /// Identity evidence that does not imply a signer (host-verified address)
    fn identity(&self) -> Option<Address>;

    /// Establish a signing session
    async fn connect(&self, trigger: ConnectTrigger) -> Result<Address>;

    /// One automatic attempt. `Ok(None)` when there is nothing to connect to.
    async fn auto_connect(&self) -> Result<Option<Address>>;

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash>;

    /// Clear the local view of the session. Remote teardown is best-effort.
    async fn disconnect(&self);
}

/// Bound a connect call; a timeout is reported as a rejection.
pub(crate) async fn connect_with_timeout<F>(limit: Duration, library: &str, fut: F) -> Result<Address>
where
    F: Future<Output = Result<Address>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(|e| match e {
            WalletError::ConnectionRejected(_) | WalletError::UserActionRequired(_) => e,
            other => WalletError::ConnectionRejected(other.to_string()),
        }),
        Err(_) => {
            warn!(library, timeout_ms = limit.as_millis() as u64, "Wallet connect timed out");
            Err(WalletError::ConnectionRejected(format!(
                "{library} did not respond within {}s",
                limit.as_secs_f32()
            )))
        }
    }
}

/// Bound a transaction submission; library errors pass through as rejections.
pub(crate) async fn send_with_timeout<F>(limit: Duration, library: &str, fut: F) -> Result<TxHash>
where
    F: Future<Output = Result<TxHash>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(|e| match e {
            WalletError::TransactionRejected(_) | WalletError::NotConnected => e,
            other => WalletError::TransactionRejected(other.to_string()),
        }),
        Err(_) => {
            warn!(library, timeout_ms = limit.as_millis() as u64, "Transaction submission timed out");
            Err(WalletError::TransactionRejected(format!(
                "{library} did not confirm submission within {}s",
                limit.as_secs_f32()
            )))
        }
    }
}
