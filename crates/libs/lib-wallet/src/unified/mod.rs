//! # Unified Wallet Connection
//!
//! The only wallet surface consumers use. One facade, two interchangeable backends:
//! the environment verdict picks the connector once at construction and every call
//! is routed to it.
//!
//! ## Boundary
//!
//! Internally everything returns [`lib_core::Result`]. At this boundary errors become
//! `success: false` values ([`ConnectResult`], [`TransactionResult`]) carrying the
//! user-facing message; nothing here returns `Err`.
//!
//! ## State Ownership
//!
//! [`ConnectionState`] lives behind the facade's lock. Connectors only report
//! [`ConnectorEvent`]s through the sink handed to them at construction; the sink folds
//! each event with [`ConnectionState::apply`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_wallet::unified::{UnifiedWalletConnection, WalletBackends};
//! use lib_wallet::environment::EnvironmentDetector;
//! use lib_core::WalletConfig;
//!
//! # async fn example(detector: EnvironmentDetector, backends: WalletBackends) {
//! let wallet = UnifiedWalletConnection::from_detector(&detector, backends, WalletConfig::default());
//! wallet.initialize().await;
//!
//! let gate = wallet.require_connection().await;
//! if !gate.success {
//!     eprintln!("{}", gate.error.unwrap_or_default());
//! }
//! # }
//! ```

use alloy_primitives::{Address, U256};
use lib_core::{Result, WalletConfig, WalletError};
use parking_lot::RwLock;
use shared::{BackendKind, ConnectResult, TransactionResult, WalletSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::connectors::{
    BackendConnector, ConnectTrigger, ConnectorEvent, EventSink, HostFrameConnector,
    InjectedConnector, WalletLibrary,
};
use crate::credentials::{ContextRead, CredentialSource, HostContext, HostContextProvider};
use crate::environment::{EnvironmentDetector, EnvironmentVerdict};
use crate::erc20;
use crate::rpc::ContractReader;
use crate::state::ConnectionState;
use crate::types::TransactionRequest;

#[cfg(test)]
mod tests;

/// Everything the facade needs from the outside world.
pub struct WalletBackends {
    /// Standalone-browser wallet library
    pub injected: Arc<dyn WalletLibrary>,
    /// Embedded host frame wallet library
    pub host_frame: Arc<dyn WalletLibrary>,
    pub credentials: Arc<CredentialSource>,
    /// Host context API; `None` outside a host or when the host glue pushes context itself
    pub host_context: Option<Arc<dyn HostContextProvider>>,
    pub reader: Arc<dyn ContractReader>,
}

/// Resets the re-entrancy flag when a connect attempt ends, however it ends.
struct ConnectGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a RwLock<ConnectionState>,
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        self.state.write().connecting = false;
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct UnifiedWalletConnection {
    verdict: EnvironmentVerdict,
    config: WalletConfig,
    connector: Arc<dyn BackendConnector>,
    credentials: Arc<CredentialSource>,
    host_context: Option<Arc<dyn HostContextProvider>>,
    reader: Arc<dyn ContractReader>,
    state: Arc<RwLock<ConnectionState>>,
    in_flight: AtomicBool,
}

impl UnifiedWalletConnection {
    /// Instantiate the connector the verdict selects. The other library is dropped.
    pub fn new(verdict: EnvironmentVerdict, backends: WalletBackends, config: WalletConfig) -> Self {
        let kind = if verdict.use_host_backend {
            BackendKind::HostFrame
        } else {
            BackendKind::Injected
        };
        let state = Arc::new(RwLock::new(ConnectionState::new(kind)));

        let sink_state = Arc::clone(&state);
        let events: EventSink = Arc::new(move |event: ConnectorEvent| {
            debug!(?event, "Connector event");
            sink_state.write().apply(&event);
        });

        let connector: Arc<dyn BackendConnector> = match kind {
            BackendKind::HostFrame => Arc::new(HostFrameConnector::new(
                backends.host_frame,
                Arc::clone(&backends.credentials),
                events,
                &config,
            )),
            _ => Arc::new(InjectedConnector::new(backends.injected, events, &config)),
        };

        info!(
            backend = kind.as_str(),
            confidence = ?verdict.confidence,
            signals = ?verdict.signal_names(),
            "Wallet backend selected"
        );

        Self {
            verdict,
            config,
            connector,
            credentials: backends.credentials,
            host_context: backends.host_context,
            reader: backends.reader,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_detector(detector: &EnvironmentDetector, backends: WalletBackends, config: WalletConfig) -> Self {
        Self::new(detector.detect().clone(), backends, config)
    }

    // ---- projections ----

    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected
    }

    pub fn address(&self) -> Option<Address> {
        self.state.read().address
    }

    pub fn can_interact(&self) -> bool {
        self.state.read().can_transact
    }

    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.state.read().snapshot()
    }

    pub fn verdict(&self) -> &EnvironmentVerdict {
        &self.verdict
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.connector.kind()
    }

    pub fn credentials(&self) -> &CredentialSource {
        &self.credentials
    }

    // ---- lifecycle ----

    /// Load host context (bounded), then make one automatic connect attempt.
    #[instrument(skip(self), fields(backend = self.connector.kind().as_str()))]
    pub async fn initialize(&self) -> Option<Address> {
        if self.connector.kind() == BackendKind::HostFrame {
            if let Some(provider) = &self.host_context {
                let read = self
                    .credentials
                    .refresh(provider.as_ref(), self.config.host_context_timeout)
                    .await;
                if read != ContextRead::Loaded {
                    info!(?read, "Continuing without host context");
                }
            }
            self.sync_identity();
        }

        self.auto_connect().await
    }

    /// Host glue pushes fresh context (e.g. after the user signs in).
    ///
    /// A newly present identity triggers an automatic connect with a fresh attempt budget.
    pub async fn apply_host_context(&self, context: Option<HostContext>) -> Option<Address> {
        let appeared = self.credentials.update(context);
        if self.connector.kind() != BackendKind::HostFrame {
            return self.address();
        }

        self.sync_identity();
        if appeared {
            self.auto_connect().await
        } else {
            self.connector.account()
        }
    }

    /// One automatic connect attempt. Failures are soft and land on the state.
    pub async fn auto_connect(&self) -> Option<Address> {
        let Some(_guard) = self.begin_connect() else {
            debug!("Connect already in flight; skipping automatic attempt");
            return None;
        };

        match self.connector.auto_connect().await {
            Ok(account) => account,
            Err(WalletError::ConnectionExhausted { attempts }) => {
                debug!(attempts, "Automatic connect suppressed");
                None
            }
            Err(e) => {
                debug!(error = %e, "Automatic connect did not produce a session");
                None
            }
        }
    }

    // ---- connection ----

    /// Explicit, user-initiated connect.
    pub async fn connect_wallet(&self) -> ConnectResult {
        match self.connect_with(ConnectTrigger::User).await {
            Ok(()) => ConnectResult::ok(),
            Err(e) => ConnectResult::failure(e.user_message()),
        }
    }

    /// Gate in front of every mutating call. Free when a signer is already live.
    pub async fn require_connection(&self) -> ConnectResult {
        match self.ensure_signer().await {
            Ok(()) => ConnectResult::ok(),
            Err(e) => ConnectResult::failure(e.user_message()),
        }
    }

    async fn ensure_signer(&self) -> Result<()> {
        if self.can_interact() {
            return Ok(());
        }
        self.connect_with(ConnectTrigger::Implicit).await
    }

    #[instrument(skip(self), fields(backend = self.connector.kind().as_str()))]
    async fn connect_with(&self, trigger: ConnectTrigger) -> Result<()> {
        let Some(_guard) = self.begin_connect() else {
            return Err(WalletError::ConnectionInProgress);
        };

        match self.connector.connect(trigger).await {
            Ok(account) => {
                self.state.write().clear_error();
                info!(%account, "Wallet ready to transact");
                Ok(())
            }
            Err(WalletError::ConnectionCancelled) => {
                info!("Wallet connect abandoned by disconnect");
                Err(WalletError::ConnectionCancelled)
            }
            Err(e) => {
                let mut state = self.state.write();
                // Identity-only sessions keep the soft warning instead of a hard error.
                if !state.is_connected {
                    state.record_error(&e);
                }
                warn!(error = %e, "Wallet connect failed");
                Err(e)
            }
        }
    }

    /// Clear the local view of the session. Remote teardown is best-effort.
    ///
    /// A connect still in flight is abandoned; its outcome never reaches the state.
    pub async fn disconnect(&self) {
        self.connector.disconnect().await;
        info!("Wallet disconnected");
    }

    // ---- transactions ----

    #[instrument(skip(self, request), fields(to = %request.to))]
    pub async fn send_transaction(&self, request: &TransactionRequest) -> TransactionResult {
        if let Err(e) = self.ensure_signer().await {
            if e != WalletError::ConnectionCancelled {
                self.state.write().record_error(&e);
            }
            return TransactionResult::failure(e.user_message());
        }

        match self.connector.send_transaction(request).await {
            Ok(hash) => {
                self.state.write().clear_error();
                info!(%hash, "Transaction submitted");
                TransactionResult::confirmed(hash.to_string())
            }
            Err(e) => {
                self.state.write().record_error(&e);
                warn!(error = %e, "Transaction failed");
                TransactionResult::failure(e.user_message())
            }
        }
    }

    /// `approve(spender, amount)` on `token`, routed through [`send_transaction`](Self::send_transaction).
    ///
    /// Balance is not checked here; an insufficient balance surfaces as the call's error.
    pub async fn approve_erc20(&self, token: Address, spender: Address, amount: U256) -> TransactionResult {
        debug!(%token, %spender, %amount, "Approving ERC-20 allowance");
        self.send_transaction(&erc20::approve_request(token, spender, amount)).await
    }

    /// Current allowance, or zero when the read fails.
    ///
    /// Zero therefore means "unknown or zero", never a confirmed on-chain value.
    pub async fn check_allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        let output = self.reader.call(token, erc20::encode_allowance(owner, spender)).await;
        match output.and_then(|bytes| erc20::decode_allowance(&bytes)) {
            Ok(allowance) => allowance,
            Err(e) => {
                warn!(%token, %owner, %spender, error = %e, "Allowance read failed; reporting zero");
                U256::ZERO
            }
        }
    }

    /// Submit `requests` one after another with a fixed pause between them.
    ///
    /// Stops at the first failure: the returned trace is as long as the number of
    /// attempts made, so a trace shorter than `requests` means early termination.
    #[instrument(skip(self, requests), fields(total = requests.len()))]
    pub async fn batch_transactions(&self, requests: &[TransactionRequest]) -> Vec<TransactionResult> {
        let mut results = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            if index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let result = self.send_transaction(request).await;
            let failed = !result.success;
            results.push(result);

            if failed {
                warn!(
                    step = index + 1,
                    skipped = requests.len() - index - 1,
                    "Batch stopped at first failure"
                );
                break;
            }
        }

        results
    }

    // ---- internals ----

    fn begin_connect(&self) -> Option<ConnectGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.state.write().connecting = true;
        Some(ConnectGuard {
            flag: &self.in_flight,
            state: &self.state,
        })
    }

    fn sync_identity(&self) {
        let identity = self.connector.identity();
        self.state.write().apply(&ConnectorEvent::IdentityChanged(identity));
    }
}
