//! # Wallet Library
//!
//! Unified wallet connection and transaction routing for Evermarks: environment
//! detection, host identity, the injected and host-frame backends, ERC-20 calls and
//! the facade every consumer goes through.

pub mod actions;
pub mod connectors;
pub mod credentials;
pub mod environment;
pub mod erc20;
pub mod rpc;
pub mod state;
pub mod types;
pub mod unified;

#[cfg(test)]
mod testing;

// Re-export commonly used types from root for convenience
pub use actions::{ActionReport, EvermarkActions};
pub use connectors::{BackendConnector, ConnectTrigger, ConnectorEvent, ConnectorInfo, WalletLibrary};
pub use credentials::{CredentialSource, HostContext, HostContextProvider, HostUser};
pub use environment::{EnvironmentDetector, EnvironmentSignals, EnvironmentVerdict, FrameRelation, SignalSource};
pub use rpc::{ContractReader, JsonRpcReader};
pub use state::ConnectionState;
pub use types::{TransactionRequest, TxHash};
pub use unified::{UnifiedWalletConnection, WalletBackends};
