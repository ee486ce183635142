//! # Host-Frame Connector
//!
//! Wallet backend used inside the host's embedded Mini App frame.
//!
//! ## State Machine
//!
//! ```text
//!            auto_connect (identity && attempts < max)
//!   Idle ───────────────────────────────────────────▶ Connecting
//!    ▲                                                  │    │
//!    │          library threw / timed out               │    │ library reported an account
//!    └──────────────────────────────────────────────────┘    ▼
//!                                                         Connected
//! ```
//!
//! Alongside it runs the identity dimension from [`CredentialSource`]: the host may
//! vouch for an address while the machine is still `Idle`. A failed attempt with
//! identity present is therefore soft (identity available, cannot transact).
//!
//! ## Attempt Accounting
//!
//! Each automatic attempt increments [`AutoConnectAttempt::attempts`]. Once it reaches
//! `max_attempts` automatic triggers stop calling the library until the identity goes
//! from absent to present again. A manual connect resets the counter and runs its own
//! bounded sequence of up to `max_attempts` tries.

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lib_core::{Result, WalletConfig, WalletError};
use lib_utils::time::now_utc;
use parking_lot::Mutex;
use shared::BackendKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

use super::{
    connect_with_timeout, send_with_timeout, BackendConnector, ConnectTrigger, ConnectorEvent,
    EventSink, WalletLibrary,
};
use crate::credentials::CredentialSource;
use crate::types::{TransactionRequest, TxHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Connecting,
    Connected(Address),
}

/// Automatic connect bookkeeping.
///
/// `last_attempt_at` is kept for diagnostics only; attempts are not spaced in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoConnectAttempt {
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl AutoConnectAttempt {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            last_attempt_at: None,
        }
    }

    pub fn can_attempt(&self) -> bool {
        self.attempts < self.max_attempts
    }

    fn record(&mut self) {
        self.attempts += 1;
        self.last_attempt_at = Some(now_utc());
    }

    fn reset(&mut self) {
        self.attempts = 0;
        self.last_attempt_at = None;
    }

    fn exhaust(&mut self) {
        self.attempts = self.max_attempts;
    }
}

struct FrameInner {
    state: FrameState,
    auto: AutoConnectAttempt,
    /// Identity epoch the counter was last reset for
    seen_epoch: u64,
    /// Bumped by `disconnect`; attempts started under an older value are discarded
    generation: u64,
}

pub struct HostFrameConnector {
    library: Arc<dyn WalletLibrary>,
    credentials: Arc<CredentialSource>,
    events: EventSink,
    inner: Mutex<FrameInner>,
    cancelled: Notify,
    chain_id: u64,
    connect_timeout: Duration,
    retry_delay: Duration,
    transaction_timeout: Duration,
}

impl HostFrameConnector {
    pub fn new(
        library: Arc<dyn WalletLibrary>,
        credentials: Arc<CredentialSource>,
        events: EventSink,
        config: &WalletConfig,
    ) -> Self {
        let seen_epoch = credentials.identity_epoch();
        Self {
            library,
            credentials,
            events,
            inner: Mutex::new(FrameInner {
                state: FrameState::Idle,
                auto: AutoConnectAttempt::new(config.max_auto_connect_attempts),
                seen_epoch,
                generation: 0,
            }),
            cancelled: Notify::new(),
            chain_id: config.chain_id,
            connect_timeout: config.connect_timeout,
            retry_delay: config.connect_retry_delay,
            transaction_timeout: config.transaction_timeout,
        }
    }

    pub fn state(&self) -> FrameState {
        self.inner.lock().state
    }

    pub fn attempts(&self) -> AutoConnectAttempt {
        self.inner.lock().auto.clone()
    }

    /// One library connect call, time-bounded and abandoned on disconnect.
    async fn try_connect(&self, generation: u64) -> Result<Address> {
        let cancelled = self.cancelled.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();
        if self.inner.lock().generation != generation {
            return Err(WalletError::ConnectionCancelled);
        }

        let connectors = self.library.connectors();
        let connector = connectors.first().ok_or_else(|| {
            WalletError::ConnectionRejected("Host frame wallet connector unavailable".to_string())
        })?;

        tokio::select! {
            outcome = connect_with_timeout(
                self.connect_timeout,
                self.library.name(),
                self.library.connect(&connector.id),
            ) => outcome,
            _ = &mut cancelled => Err(WalletError::ConnectionCancelled),
        }
    }

    /// Leave `Connecting` and report the outcome, unless a disconnect superseded the attempt.
    fn finish(&self, outcome: Result<Address>, generation: u64) -> Result<Address> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!("Connect attempt superseded by disconnect; discarding outcome");
            return Err(WalletError::ConnectionCancelled);
        }

        match outcome {
            Ok(account) => {
                inner.state = FrameState::Connected(account);
                drop(inner);
                info!(%account, "Host frame wallet connected");
                (self.events)(ConnectorEvent::Connected(account));
                Ok(account)
            }
            Err(error) => {
                inner.state = FrameState::Idle;
                drop(inner);
                let identity = self.credentials.get_primary_address();
                if identity.is_some() {
                    warn!(error = %error, "Host frame connect failed; identity available without signer");
                } else {
                    warn!(error = %error, "Host frame connect failed");
                }
                (self.events)(ConnectorEvent::ConnectFailed { error: error.clone(), identity });
                Err(error)
            }
        }
    }
}

#[async_trait]
impl BackendConnector for HostFrameConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::HostFrame
    }

    fn account(&self) -> Option<Address> {
        match self.state() {
            FrameState::Connected(account) => Some(account),
            _ => None,
        }
    }

    fn identity(&self) -> Option<Address> {
        self.credentials.get_primary_address()
    }

    /// Manual (or gate-triggered) connect: resets the automatic counter, then tries up
    /// to `max_attempts` times, stopping at the first success.
    #[instrument(skip(self))]
    async fn connect(&self, trigger: ConnectTrigger) -> Result<Address> {
        let (max_attempts, generation) = {
            let mut inner = self.inner.lock();
            match inner.state {
                FrameState::Connected(account) => return Ok(account),
                FrameState::Connecting => return Err(WalletError::ConnectionInProgress),
                FrameState::Idle => {}
            }
            inner.auto.reset();
            inner.state = FrameState::Connecting;
            (inner.auto.max_attempts, inner.generation)
        };
        (self.events)(ConnectorEvent::Connecting);

        let mut outcome = Err(WalletError::ConnectionRejected(String::new()));
        for attempt in 1..=max_attempts {
            outcome = self.try_connect(generation).await;
            match &outcome {
                Ok(_) | Err(WalletError::ConnectionCancelled) => break,
                Err(e) => {
                    debug!(attempt, max_attempts, error = %e, "Host frame connect attempt failed");
                    if attempt < max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        self.finish(outcome, generation)
    }

    #[instrument(skip(self))]
    async fn auto_connect(&self) -> Result<Option<Address>> {
        if !self.credentials.has_identity() {
            debug!("No host identity yet; skipping automatic connect");
            return Ok(None);
        }

        let generation = {
            let mut inner = self.inner.lock();

            let epoch = self.credentials.identity_epoch();
            if epoch != inner.seen_epoch {
                debug!(epoch, "Host identity changed; resetting automatic connect counter");
                inner.seen_epoch = epoch;
                inner.auto.reset();
            }

            match inner.state {
                FrameState::Connected(account) => return Ok(Some(account)),
                FrameState::Connecting => return Err(WalletError::ConnectionInProgress),
                FrameState::Idle => {}
            }

            if !inner.auto.can_attempt() {
                debug!(attempts = inner.auto.attempts, "Automatic connect suppressed");
                return Err(WalletError::ConnectionExhausted { attempts: inner.auto.attempts });
            }

            inner.auto.record();
            inner.state = FrameState::Connecting;
            info!(
                attempt = inner.auto.attempts,
                max_attempts = inner.auto.max_attempts,
                "Automatic host frame connect"
            );
            inner.generation
        };
        (self.events)(ConnectorEvent::Connecting);

        let outcome = self.try_connect(generation).await;
        let result = self.finish(outcome, generation).map(Some);

        if matches!(&result, Err(e) if *e != WalletError::ConnectionCancelled) {
            let auto = self.attempts();
            if !auto.can_attempt() {
                warn!(attempts = auto.attempts, "Automatic host frame connect exhausted");
                (self.events)(ConnectorEvent::Exhausted { attempts: auto.attempts });
            }
        }

        result
    }

    #[instrument(skip(self, request), fields(to = %request.to, chain_id = self.chain_id))]
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<TxHash> {
        let from = match self.account() {
            Some(account) => account,
            None => {
                debug!("Host frame not connected; running one connect sequence before sending");
                self.connect(ConnectTrigger::Implicit)
                    .await
                    .map_err(|e| WalletError::ConnectionRequired(e.user_message()))?
            }
        };

        let hash = send_with_timeout(
            self.transaction_timeout,
            self.library.name(),
            self.library.send_transaction(from, self.chain_id, request),
        )
        .await?;

        debug!(%hash, "Host frame submitted transaction");
        Ok(hash)
    }

    /// Local reset only. The host session may outlive this call; automatic connect
    /// stays suppressed until identity changes or the user connects manually.
    ///
    /// A connect still in flight is abandoned and its outcome discarded.
    async fn disconnect(&self) {
        {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state = FrameState::Idle;
            inner.auto.exhaust();
        }
        self.cancelled.notify_waiters();

        if let Err(e) = self.library.disconnect().await {
            debug!(error = %e, "Host frame session not torn down remotely");
        }
        (self.events)(ConnectorEvent::Disconnected);
    }
}
