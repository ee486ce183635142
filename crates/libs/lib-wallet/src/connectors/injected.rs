//! Injected-wallet connector (standalone browser).
//!
//! Never connects on its own: opening the wallet's connection UI needs a user gesture,
//! so implicit connect requests come back as an instruction for the user.

use alloy_primitives::Address;
use async_trait::async_trait;
use lib_core::{Result, WalletError, WalletConfig};
use parking_lot::RwLock;
use shared::BackendKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    connect_with_timeout, send_with_timeout, BackendConnector, ConnectTrigger, ConnectorEvent,
    EventSink, WalletLibrary,
};
use crate::types::{TransactionRequest, TxHash};

pub const CONNECT_BUTTON_INSTRUCTION: &str = "Please connect your wallet using the Connect button";
pub const NO_WALLET_INSTRUCTION: &str =
    "No browser wallet detected. Install a wallet extension such as MetaMask or Coinbase Wallet, then connect.";

pub struct InjectedConnector {
    library: Arc<dyn WalletLibrary>,
    events: EventSink,
    account: RwLock<Option<Address>>,
    /// Bumped by `disconnect`; a connect that resolves afterwards is discarded
    generation: AtomicU64,
    chain_id: u64,
    connect_timeout: Duration,
    transaction_timeout: Duration,
}

impl InjectedConnector {
    pub fn new(library: Arc<dyn WalletLibrary>, events: EventSink, config: &WalletConfig) -> Self {
        Self {
            library,
            events,
            account: RwLock::new(None),
            generation: AtomicU64::new(0),
            chain_id: config.chain_id,
            connect_timeout: config.connect_timeout,
            transaction_timeout: config.transaction_timeout,
        }
    }

    fn set_account(&self, account: Option<Address>) {
        *self.account.write() = account;
    }
}

#[async_trait]
impl BackendConnector for InjectedConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::Injected
    }

    fn account(&self) -> Option<Address> {
        *self.account.read()
    }

    fn identity(&self) -> Option<Address> {
        self.account()
    }

    #[instrument(skip(self), fields(library = self.library.name()))]
    async fn connect(&self, trigger: ConnectTrigger) -> Result<Address> {
        if let Some(account) = self.account() {
            return Ok(account);
        }

        if trigger == ConnectTrigger::Implicit {
            debug!("Injected wallet requires a user gesture; not opening connection UI");
            return Err(WalletError::UserActionRequired(CONNECT_BUTTON_INSTRUCTION.to_string()));
        }

        let connectors = self.library.connectors();
        let Some(connector) = connectors.iter().find(|c| c.ready) else {
            warn!(available = connectors.len(), "No ready injected wallet connector");
            return Err(WalletError::UserActionRequired(NO_WALLET_INSTRUCTION.to_string()));
        };

        let generation = self.generation.load(Ordering::SeqCst);
        (self.events)(ConnectorEvent::Connecting);
        let outcome =
            connect_with_timeout(self.connect_timeout, self.library.name(), self.library.connect(&connector.id)).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Injected connect superseded by disconnect; discarding outcome");
            return Err(WalletError::ConnectionCancelled);
        }

        match outcome {
            Ok(account) => {
                info!(%account, connector = %connector.name, "Injected wallet connected");
                self.set_account(Some(account));
                (self.events)(ConnectorEvent::Connected(account));
                Ok(account)
            }
            Err(error) => {
                warn!(error = %error, connector = %connector.name, "Injected wallet connection failed");
                (self.events)(ConnectorEvent::ConnectFailed { error: error.clone(), identity: None });
                Err(error)
            }
        }
    }

    /// Syncs with the account the wallet currently exposes; never opens the wallet UI.
    ///
    /// Picks up a session the user already authorised, follows account switches and
    /// drops the local session when the wallet no longer exposes an account.
    async fn auto_connect(&self) -> Result<Option<Address>> {
        let observed = self.library.current_account();
        let cached = self.account();
        if observed == cached {
            return Ok(observed);
        }

        self.set_account(observed);
        match observed {
            Some(account) => {
                match cached {
                    Some(previous) => info!(%previous, %account, "Injected wallet switched account"),
                    None => info!(%account, "Resuming existing injected wallet session"),
                }
                (self.events)(ConnectorEvent::Connected(account));
            }
            None => {
                info!("Injected wallet no longer exposes an account; clearing session");
                (self.events)(ConnectorEvent::Disconnected);
            }
        }
        Ok(observed)
    }

    #[instrument(skip(self, request), fields(to = %request.to, chain_id = self.chain_id))]
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash> {
        let from = self.account().ok_or(WalletError::NotConnected)?;

        let hash = send_with_timeout(
            self.transaction_timeout,
            self.library.name(),
            self.library.send_transaction(from, self.chain_id, request),
        )
        .await?;

        debug!(%hash, "Injected wallet submitted transaction");
        Ok(hash)
    }

    async fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.library.disconnect().await {
            Ok(()) => debug!("Injected wallet session closed"),
            Err(WalletError::Unsupported(reason)) => {
                debug!(%reason, "Library cannot disconnect programmatically; clearing local state only")
            }
            Err(e) => warn!(error = %e, "Injected wallet disconnect failed; clearing local state"),
        }
        self.set_account(None);
        (self.events)(ConnectorEvent::Disconnected);
    }
}
