//! # Wallet Error Taxonomy
//!
//! This module defines [`WalletError`], the single error type used inside the wallet
//! connection layer. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Boundary Policy
//!
//! Errors are values *inside* the core. The unified facade converts every one of them
//! into a `success: false` result carrying [`WalletError::user_message`]; nothing is
//! raised to the UI layer.
//!
//! ## Error Categories
//!
//! 1. **Connection** - establishing a signing session
//!    - [`ConnectionRejected`](WalletError::ConnectionRejected) - user declined, library threw or timed out
//!    - [`ConnectionExhausted`](WalletError::ConnectionExhausted) - automatic retries used up
//!    - [`ConnectionInProgress`](WalletError::ConnectionInProgress) - re-entrant connect attempt
//!    - [`ConnectionCancelled`](WalletError::ConnectionCancelled) - explicit disconnect while connecting
//!    - [`UserActionRequired`](WalletError::UserActionRequired) - the backend needs a user gesture
//!
//! 2. **Transaction** - submitting calls
//!    - [`ConnectionRequired`](WalletError::ConnectionRequired) - no transact capability after one implicit connect
//!    - [`NotConnected`](WalletError::NotConnected) - connector has no live account
//!    - [`TransactionRejected`](WalletError::TransactionRejected) - revert / rejection, library message passed through
//!
//! 3. **Reads and plumbing**
//!    - [`ReadFailure`](WalletError::ReadFailure), [`Rpc`](WalletError::Rpc)
//!    - [`InvalidInput`](WalletError::InvalidInput), [`Config`](WalletError::Config), [`Unsupported`](WalletError::Unsupported)
//!
//! Two conditions are *not* errors: an environment with no host
//! signals (resolved to the standalone backend) and a host identity without a live
//! signer (a warning on the connection state).
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{WalletError, Result};
//!
//! fn require_account(account: Option<&str>) -> Result<&str> {
//!     account.ok_or(WalletError::NotConnected)
//! }
//!
//! assert_eq!(require_account(None).unwrap_err().code(), "NotConnected");
//! ```

use thiserror::Error;

/// Convenience type alias for `Result<T, WalletError>`.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Generic fallback shown when a connection failure carries no useful message.
pub const CONNECT_FALLBACK_MESSAGE: &str = "Failed to connect wallet";

/// Wallet connection and transaction routing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// User declined, the connector threw, or the connect call timed out.
    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    /// Automatic connect attempts exhausted until identity state changes again.
    #[error("Automatic wallet connection stopped after {attempts} attempts")]
    ConnectionExhausted { attempts: u32 },

    /// A connect attempt is already running.
    #[error("Wallet connection already in progress")]
    ConnectionInProgress,

    /// An explicit disconnect abandoned the attempt.
    #[error("Wallet connection cancelled by disconnect")]
    ConnectionCancelled,

    /// Transaction attempted without transact capability, after one implicit connect.
    #[error("Wallet connection required: {0}")]
    ConnectionRequired(String),

    /// The backend cannot connect without an explicit user gesture.
    #[error("{0}")]
    UserActionRequired(String),

    /// Connector has no live account.
    #[error("Wallet not connected")]
    NotConnected,

    /// Transaction rejected by the user or reverted; library message passed through.
    #[error("Transaction failed: {0}")]
    TransactionRejected(String),

    /// Read-only contract call failed.
    #[error("Read failed: {0}")]
    ReadFailure(String),

    /// JSON-RPC transport or node error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Invalid caller input (address, amount, empty batch).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not supported by the underlying wallet library.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl WalletError {
    /// Stable variant name, used as the error code on `ErrorInfo`.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::ConnectionRejected(_) => "ConnectionRejected",
            WalletError::ConnectionExhausted { .. } => "ConnectionExhausted",
            WalletError::ConnectionInProgress => "ConnectionInProgress",
            WalletError::ConnectionCancelled => "ConnectionCancelled",
            WalletError::ConnectionRequired(_) => "ConnectionRequired",
            WalletError::UserActionRequired(_) => "UserActionRequired",
            WalletError::NotConnected => "NotConnected",
            WalletError::TransactionRejected(_) => "TransactionRejected",
            WalletError::ReadFailure(_) => "ReadFailure",
            WalletError::Rpc(_) => "Rpc",
            WalletError::InvalidInput(_) => "InvalidInput",
            WalletError::Config(_) => "Config",
            WalletError::Unsupported(_) => "Unsupported",
        }
    }

    /// Human-readable message for the UI.
    ///
    /// Connection rejections keep the library message and add the generic fallback,
    /// so the user sees both "what the wallet said" and "what failed".
    pub fn user_message(&self) -> String {
        match self {
            WalletError::ConnectionRejected(msg) if msg.trim().is_empty() => {
                CONNECT_FALLBACK_MESSAGE.to_string()
            }
            WalletError::ConnectionRejected(msg) => format!("{CONNECT_FALLBACK_MESSAGE}: {msg}"),
            WalletError::ConnectionExhausted { .. } => {
                "Automatic wallet connection failed. Please connect your wallet manually.".to_string()
            }
            WalletError::ConnectionInProgress => {
                "Wallet connection already in progress. Please wait.".to_string()
            }
            WalletError::ConnectionCancelled => "Wallet connection cancelled".to_string(),
            WalletError::ConnectionRequired(msg) => format!("Please connect your wallet: {msg}"),
            WalletError::UserActionRequired(msg) => msg.clone(),
            WalletError::NotConnected => "Please connect your wallet to continue".to_string(),
            WalletError::TransactionRejected(msg) => msg.clone(),
            WalletError::Rpc(_) | WalletError::ReadFailure(_) => {
                "Network temporarily unavailable".to_string()
            }
            WalletError::InvalidInput(msg) => msg.clone(),
            WalletError::Config(_) | WalletError::Unsupported(_) => self.to_string(),
        }
    }

    /// True for failures that mean "no signing session" rather than a failed call.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            WalletError::ConnectionRejected(_)
                | WalletError::ConnectionExhausted { .. }
                | WalletError::ConnectionInProgress
                | WalletError::ConnectionCancelled
                | WalletError::ConnectionRequired(_)
                | WalletError::UserActionRequired(_)
                | WalletError::NotConnected
        )
    }
}
