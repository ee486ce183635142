//! # Core Library
//!
//! Configuration, the wallet error taxonomy and logging setup shared by every
//! crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{ContractAddresses, WalletConfig};
pub use error::{Result, WalletError};
