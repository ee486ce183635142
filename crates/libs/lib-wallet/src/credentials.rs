//! # Host Identity Credentials
//!
//! Read-only view of what the host frame claims about the current user: whether they
//! are authenticated and which blockchain addresses the host has verified for them.
//!
//! This is identity evidence, never transaction capability. Nothing in this module
//! connects a wallet or signs anything.
//!
//! ## Loading
//!
//! The host context API is asynchronous and may never resolve, so reads are raced
//! against a timer. A timeout is a soft outcome: the snapshot stays empty and the
//! application carries on as "context unknown".
//!
//! ```rust,no_run
//! use lib_wallet::credentials::{CredentialSource, HostContextProvider};
//! use std::time::Duration;
//!
//! # async fn example(provider: &dyn HostContextProvider) {
//! let credentials = CredentialSource::new();
//! credentials.refresh(provider, Duration::from_secs(3)).await;
//! if let Some(address) = credentials.get_primary_address() {
//!     println!("host-verified address: {address}");
//! }
//! # }
//! ```

use alloy_primitives::Address;
use async_trait::async_trait;
use lib_core::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Authenticated host user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostUser {
    /// Farcaster id
    pub fid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Context object as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    #[serde(default)]
    pub user: Option<HostUser>,
    /// Raw addresses as the host reports them; any case, possibly malformed
    #[serde(default)]
    pub verified_addresses: Vec<String>,
}

/// Asynchronous source of the host context.
#[async_trait]
pub trait HostContextProvider: Send + Sync {
    /// `Ok(None)` when the host has no context to share (not running in a frame).
    async fn context(&self) -> Result<Option<HostContext>>;
}

/// Parsed identity snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostIdentity {
    pub user: Option<HostUser>,
    pub verified_addresses: Vec<Address>,
}

impl HostIdentity {
    fn from_context(context: HostContext) -> Self {
        let mut verified_addresses = Vec::with_capacity(context.verified_addresses.len());
        for raw in &context.verified_addresses {
            match Address::from_str(raw.trim()) {
                Ok(address) if !verified_addresses.contains(&address) => verified_addresses.push(address),
                Ok(_) => {}
                Err(e) => warn!(address = %raw, error = %e, "Dropping unparseable verified address"),
            }
        }

        Self {
            user: context.user,
            verified_addresses,
        }
    }

    /// Authenticated user with at least one verified address.
    pub fn has_identity(&self) -> bool {
        self.user.is_some() && !self.verified_addresses.is_empty()
    }
}

/// Outcome of one bounded host context read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextRead {
    Loaded,
    /// Host answered with no context
    Unavailable,
    TimedOut,
    Failed(String),
}

/// Host identity adapter.
#[derive(Debug, Default)]
pub struct CredentialSource {
    identity: RwLock<HostIdentity>,
    /// Incremented on every absent-to-present identity transition
    epoch: AtomicU64,
}

impl CredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source already holding `context`.
    pub fn from_context(context: HostContext) -> Self {
        let source = Self::new();
        source.update(Some(context));
        source
    }

    /// Read the host context, waiting at most `limit`.
    ///
    /// Timeouts and provider errors keep the current snapshot and are logged as
    /// warnings; they are never surfaced as errors.
    pub async fn refresh(&self, provider: &dyn HostContextProvider, limit: Duration) -> ContextRead {
        match tokio::time::timeout(limit, provider.context()).await {
            Ok(Ok(Some(context))) => {
                self.update(Some(context));
                ContextRead::Loaded
            }
            Ok(Ok(None)) => {
                debug!("Host returned no context");
                ContextRead::Unavailable
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Host context read failed");
                ContextRead::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "Host context read timed out; continuing without it");
                ContextRead::TimedOut
            }
        }
    }

    /// Replace the snapshot with host-pushed data.
    ///
    /// Returns `true` when identity went from absent to present.
    pub fn update(&self, context: Option<HostContext>) -> bool {
        let next = context.map(HostIdentity::from_context).unwrap_or_default();
        let mut identity = self.identity.write();

        let appeared = !identity.has_identity() && next.has_identity();
        if appeared {
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            info!(
                fid = next.user.as_ref().map(|u| u.fid),
                addresses = next.verified_addresses.len(),
                epoch,
                "Host identity available"
            );
        }

        *identity = next;
        appeared
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.read().user.is_some()
    }

    pub fn get_verified_addresses(&self) -> Vec<Address> {
        self.identity.read().verified_addresses.clone()
    }

    /// First verified address.
    pub fn get_primary_address(&self) -> Option<Address> {
        self.identity.read().verified_addresses.first().copied()
    }

    /// Identity usable for auto-connect: authenticated with a verified address.
    pub fn has_identity(&self) -> bool {
        self.identity.read().has_identity()
    }

    pub fn identity(&self) -> HostIdentity {
        self.identity.read().clone()
    }

    /// Number of absent-to-present identity transitions so far.
    pub fn identity_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}
