//! # Contract Reads
//!
//! Read-only contract calls used by allowance checks. Reads never need a wallet
//! session, so they go straight to a JSON-RPC node instead of through a connector.

use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use lib_core::{Result, WalletError};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Bound on a single `eth_call`.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only `eth_call` against a contract.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// `eth_call` through an alloy HTTP provider.
pub struct JsonRpcReader {
    provider: DynProvider,
    url: Url,
}

impl JsonRpcReader {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| WalletError::Rpc(format!("Invalid RPC URL `{url}`: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WalletError::Rpc(format!("RPC URL must be http(s), got {}", url.scheme())));
        }

        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        Ok(Self { provider, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Call request for `data` against `to` at the latest block.
fn call_request(to: Address, data: Bytes) -> TransactionRequest {
    TransactionRequest::default()
        .to(to)
        .input(TransactionInput::new(data))
}

#[async_trait]
impl ContractReader for JsonRpcReader {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        debug!(%to, url = %self.url, "eth_call");

        match tokio::time::timeout(CALL_TIMEOUT, self.provider.call(call_request(to, data))).await {
            Ok(result) => result.map_err(|e| WalletError::Rpc(format!("eth_call failed: {e}"))),
            Err(_) => Err(WalletError::Rpc(format!(
                "node did not answer within {}s",
                CALL_TIMEOUT.as_secs()
            ))),
        }
    }
}
