//! # Wallet Configuration
//!
//! Settings for the wallet connection layer, loaded from environment variables.
//! Every value has a default, so an empty environment yields a working
//! configuration pointed at Base mainnet; contract addresses are the exception
//! and stay unset until configured.
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance:
//!
//! ```rust,no_run
//! use lib_core::config::{core_config, init_config};
//!
//! init_config().expect("wallet configuration");
//! let timeout = core_config().connect_timeout;
//! ```
//!
//! The config must be initialized once at application startup using [`init_config()`].
//! Embedders that manage their own settings can skip the global and pass a
//! [`WalletConfig`] around directly.

use alloy_primitives::Address;
use lib_utils::envs::{self, get_env_opt, get_env_or, get_env_parse_or};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use crate::error::WalletError;

/// Default JSON-RPC endpoint used for read calls.
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
/// Base mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 8453;
/// Automatic host-frame connect attempts before suppression.
pub const DEFAULT_MAX_AUTO_CONNECT_ATTEMPTS: u32 = 3;

/// Wallet layer configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletConfig {
    /// JSON-RPC endpoint used for `eth_call` reads (allowance checks)
    pub rpc_url: String,

    /// Chain the application transacts on
    pub chain_id: u64,

    /// Upper bound on automatic connect attempts between identity resets
    pub max_auto_connect_attempts: u32,

    /// Pause between tries inside one manual host-frame connect sequence
    pub connect_retry_delay: Duration,

    /// Bound on every connector `connect` call
    pub connect_timeout: Duration,

    /// Bound on every connector `send_transaction` call (includes user signing time)
    pub transaction_timeout: Duration,

    /// Bound on the host context read before falling back to "context unknown"
    pub host_context_timeout: Duration,

    /// Fixed delay between sequential batch transactions
    pub batch_delay: Duration,

    /// Contract targets used by the Evermarks actions
    pub contracts: ContractAddresses,
}

/// On-chain targets the action consumers route transactions to.
///
/// All optional: the wallet layer works without them, only the actions that
/// need a missing address fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    /// EMARK governance token (ERC-20)
    pub emark_token: Option<Address>,
    /// WEMARK wrapper (wrap / unbonding)
    pub wemark: Option<Address>,
    /// Evermark voting contract
    pub voting: Option<Address>,
    /// Dual-token rewards contract
    pub rewards: Option<Address>,
}

impl ContractAddresses {
    /// Load contract addresses from environment variables.
    pub fn from_env() -> Result<Self, WalletError> {
        Ok(Self {
            emark_token: parse_address_env("EMARK_TOKEN_ADDRESS")?,
            wemark: parse_address_env("WEMARK_ADDRESS")?,
            voting: parse_address_env("EVERMARK_VOTING_ADDRESS")?,
            rewards: parse_address_env("EVERMARK_REWARDS_ADDRESS")?,
        })
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            max_auto_connect_attempts: DEFAULT_MAX_AUTO_CONNECT_ATTEMPTS,
            connect_retry_delay: Duration::from_millis(1_000),
            connect_timeout: Duration::from_millis(15_000),
            transaction_timeout: Duration::from_millis(120_000),
            host_context_timeout: Duration::from_millis(3_000),
            batch_delay: Duration::from_millis(1_000),
            contracts: ContractAddresses::default(),
        }
    }
}

impl WalletConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, WalletError> {
        let defaults = Self::default();

        Ok(Self {
            rpc_url: get_env_or("EVERMARKS_RPC_URL", &defaults.rpc_url),
            chain_id: get_env_parse_or("EVERMARKS_CHAIN_ID", defaults.chain_id).map_err(env_error)?,
            max_auto_connect_attempts: get_env_parse_or(
                "WALLET_MAX_AUTO_CONNECT_ATTEMPTS",
                defaults.max_auto_connect_attempts,
            )
            .map_err(env_error)?,
            connect_retry_delay: millis_env("WALLET_CONNECT_RETRY_DELAY_MS", defaults.connect_retry_delay)?,
            connect_timeout: millis_env("WALLET_CONNECT_TIMEOUT_MS", defaults.connect_timeout)?,
            transaction_timeout: millis_env("WALLET_TRANSACTION_TIMEOUT_MS", defaults.transaction_timeout)?,
            host_context_timeout: millis_env("WALLET_HOST_CONTEXT_TIMEOUT_MS", defaults.host_context_timeout)?,
            batch_delay: millis_env("WALLET_BATCH_DELAY_MS", defaults.batch_delay)?,
            contracts: ContractAddresses::from_env()?,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.rpc_url.trim().is_empty() {
            return Err(WalletError::Config("EVERMARKS_RPC_URL cannot be empty".to_string()));
        }

        let rpc_url = Url::parse(&self.rpc_url)
            .map_err(|e| WalletError::Config(format!("EVERMARKS_RPC_URL is not a valid URL: {e}")))?;
        if !matches!(rpc_url.scheme(), "http" | "https") || rpc_url.host_str().is_none() {
            return Err(WalletError::Config(format!(
                "EVERMARKS_RPC_URL must be an http(s) URL with a host, got {}",
                self.rpc_url
            )));
        }

        if self.chain_id == 0 {
            return Err(WalletError::Config("EVERMARKS_CHAIN_ID must be non-zero".to_string()));
        }

        if self.max_auto_connect_attempts == 0 {
            return Err(WalletError::Config(
                "WALLET_MAX_AUTO_CONNECT_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("WALLET_CONNECT_TIMEOUT_MS", self.connect_timeout),
            ("WALLET_TRANSACTION_TIMEOUT_MS", self.transaction_timeout),
            ("WALLET_HOST_CONTEXT_TIMEOUT_MS", self.host_context_timeout),
        ] {
            if value.is_zero() {
                return Err(WalletError::Config(format!("{name} must be greater than 0")));
            }
        }

        Ok(())
    }
}

fn millis_env(name: &'static str, default: Duration) -> Result<Duration, WalletError> {
    let millis = get_env_parse_or(name, default.as_millis() as u64).map_err(env_error)?;
    Ok(Duration::from_millis(millis))
}

fn parse_address_env(name: &'static str) -> Result<Option<Address>, WalletError> {
    get_env_opt(name)
        .map(|raw| {
            Address::from_str(&raw)
                .map_err(|e| WalletError::Config(format!("{name} is not a valid address: {e}")))
        })
        .transpose()
}

fn env_error(err: envs::Error) -> WalletError {
    WalletError::Config(err.to_string())
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<WalletConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Loads `.env` if present, reads the environment and validates the result.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are malformed
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<(), WalletError> {
    dotenvy::dotenv().ok();

    let config = WalletConfig::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| WalletError::Config("Config has already been initialized".to_string()))
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet.
pub fn core_config() -> &'static WalletConfig {
    CONFIG
        .get()
        .expect("Config must be initialized with init_config() before use")
}

/// Global configuration if it has been initialized.
pub fn try_core_config() -> Option<&'static WalletConfig> {
    CONFIG.get()
}
