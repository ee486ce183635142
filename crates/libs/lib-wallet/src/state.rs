//! # Connection State
//!
//! The facade's single source of truth about the wallet session.
//!
//! Identity and transaction capability are separate facts: in a host frame the user's
//! verified address is known (`is_connected`) long before a signer exists
//! (`can_transact`). [`ConnectionState::apply`] is the only place connector events
//! change the state, and it keeps `can_transact => is_connected` true.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use lib_core::WalletError;
use lib_utils::time::now_utc;
use shared::{short_address, BackendKind, WalletSnapshot};

use crate::connectors::ConnectorEvent;

/// Soft warning shown when the host vouches for an address but no signer is live.
pub const IDENTITY_WITHOUT_SIGNER: &str =
    "Wallet identity verified but not connected for transactions. Read-only features remain available.";

/// Last failure recorded by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn from_error(err: &WalletError) -> Self {
        Self {
            code: err.code(),
            message: err.user_message(),
            at: now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    /// Identity known (live account or host-verified address)
    pub is_connected: bool,
    /// Live signing session available
    pub can_transact: bool,
    pub address: Option<Address>,
    pub backend_kind: BackendKind,
    pub connecting: bool,
    pub last_error: Option<ErrorInfo>,
    /// Soft, non-blocking condition (identity without signer, exhausted auto-connect)
    pub warning: Option<String>,
}

impl ConnectionState {
    pub fn new(backend_kind: BackendKind) -> Self {
        Self {
            backend_kind,
            ..Self::default()
        }
    }

    /// Fold one connector event into the state.
    pub fn apply(&mut self, event: &ConnectorEvent) {
        match event {
            ConnectorEvent::Connecting => {
                self.connecting = true;
            }
            ConnectorEvent::Connected(account) => {
                self.connecting = false;
                self.is_connected = true;
                self.can_transact = true;
                self.address = Some(*account);
                self.last_error = None;
                self.warning = None;
            }
            ConnectorEvent::ConnectFailed { error, identity } => {
                self.connecting = false;
                self.can_transact = false;
                match identity {
                    // The user's holdings can still be shown without a signer.
                    Some(address) => {
                        self.is_connected = true;
                        self.address = Some(*address);
                        self.warning = Some(IDENTITY_WITHOUT_SIGNER.to_string());
                    }
                    None => {
                        self.is_connected = false;
                        self.address = None;
                        self.last_error = Some(ErrorInfo::from_error(error));
                    }
                }
            }
            ConnectorEvent::Exhausted { attempts } => {
                self.connecting = false;
                self.warning = Some(format!(
                    "Automatic wallet connection paused after {attempts} attempts. Use Connect to retry."
                ));
            }
            ConnectorEvent::IdentityChanged(identity) => {
                if self.can_transact {
                    return;
                }
                self.is_connected = identity.is_some();
                self.address = *identity;
                self.warning = identity.map(|_| IDENTITY_WITHOUT_SIGNER.to_string());
            }
            ConnectorEvent::Disconnected => {
                *self = Self::new(self.backend_kind);
            }
        }
    }

    pub fn record_error(&mut self, err: &WalletError) {
        self.last_error = Some(ErrorInfo::from_error(err));
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        let address = self.address.map(|a| a.to_string());
        WalletSnapshot {
            is_connected: self.is_connected,
            can_interact: self.can_transact,
            short_address: address.as_deref().map(short_address),
            address,
            backend: self.backend_kind,
            connecting: self.connecting,
            warning: self.warning.clone(),
            last_error: self.last_error.as_ref().map(|e| e.message.clone()),
        }
    }
}
