//! Scripted stand-ins for the wallet libraries, the host context API and the node.

use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use lib_core::{Result, WalletError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::connectors::{ConnectorInfo, WalletLibrary};
use crate::credentials::{HostContext, HostContextProvider, HostUser};
use crate::rpc::ContractReader;
use crate::types::{TransactionRequest, TxHash};

pub(crate) const VERIFIED: Address = address!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
pub(crate) const LIVE: Address = address!("fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
pub(crate) const TOKEN: Address = address!("dbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB");
pub(crate) const SPENDER: Address = address!("D1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb");

pub(crate) fn host_context() -> HostContext {
    HostContext {
        user: Some(HostUser {
            fid: 42,
            username: Some("alice".to_string()),
            display_name: Some("Alice".to_string()),
        }),
        verified_addresses: vec![VERIFIED.to_string().to_lowercase()],
    }
}

pub(crate) fn approve_request() -> TransactionRequest {
    crate::erc20::approve_request(TOKEN, SPENDER, U256::from(100u64))
}

pub(crate) fn tx_hash(n: u8) -> TxHash {
    B256::with_last_byte(n)
}

enum ConnectFallback {
    Reject(String),
    Hang,
}

pub(crate) struct MockWalletLibrary {
    name: &'static str,
    connectors: Vec<ConnectorInfo>,
    connect_script: Mutex<VecDeque<Result<Address>>>,
    connect_fallback: ConnectFallback,
    connect_calls: AtomicUsize,
    connected_with: Mutex<Vec<String>>,
    current_account: Mutex<Option<Address>>,
    send_script: Mutex<VecDeque<Result<TxHash>>>,
    sent: Mutex<Vec<(Address, TransactionRequest)>>,
    sent_chain_ids: Mutex<Vec<u64>>,
    unsupported_disconnect: bool,
}

impl MockWalletLibrary {
    /// Browser-extension style library with one ready "injected" connector.
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            connectors: vec![ConnectorInfo {
                id: "injected".to_string(),
                name: "Browser Wallet".to_string(),
                ready: true,
            }],
            connect_script: Mutex::new(VecDeque::new()),
            connect_fallback: ConnectFallback::Reject("no scripted connect result".to_string()),
            connect_calls: AtomicUsize::new(0),
            connected_with: Mutex::new(Vec::new()),
            current_account: Mutex::new(None),
            send_script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            sent_chain_ids: Mutex::new(Vec::new()),
            unsupported_disconnect: false,
        }
    }

    /// Host frame library with its single frame connector.
    pub(crate) fn frame() -> Self {
        Self {
            connectors: vec![ConnectorInfo {
                id: "farcasterFrame".to_string(),
                name: "Farcaster Frame".to_string(),
                ready: true,
            }],
            ..Self::new("farcaster-frame")
        }
    }

    pub(crate) fn with_connect_results(self, results: Vec<Result<Address>>) -> Self {
        *self.connect_script.lock() = results.into();
        self
    }

    pub(crate) fn always_failing_connect(mut self, message: &str) -> Self {
        self.connect_fallback = ConnectFallback::Reject(message.to_string());
        self
    }

    pub(crate) fn with_hanging_connect(mut self) -> Self {
        self.connect_fallback = ConnectFallback::Hang;
        self
    }

    pub(crate) fn without_connectors(mut self) -> Self {
        self.connectors.clear();
        self
    }

    pub(crate) fn with_current_account(self, account: Address) -> Self {
        *self.current_account.lock() = Some(account);
        self
    }

    /// Account switch or lock performed inside the wallet itself.
    pub(crate) fn set_current_account(&self, account: Option<Address>) {
        *self.current_account.lock() = account;
    }

    /// Scripted send outcomes; once exhausted every send succeeds.
    pub(crate) fn with_send_results(self, results: Vec<Result<TxHash>>) -> Self {
        *self.send_script.lock() = results.into();
        self
    }

    pub(crate) fn with_unsupported_disconnect(mut self) -> Self {
        self.unsupported_disconnect = true;
        self
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn connected_with(&self) -> Vec<String> {
        self.connected_with.lock().clone()
    }

    pub(crate) fn sent(&self) -> Vec<(Address, TransactionRequest)> {
        self.sent.lock().clone()
    }

    pub(crate) fn sent_chain_ids(&self) -> Vec<u64> {
        self.sent_chain_ids.lock().clone()
    }
}

#[async_trait]
impl WalletLibrary for MockWalletLibrary {
    fn name(&self) -> &str {
        self.name
    }

    fn connectors(&self) -> Vec<ConnectorInfo> {
        self.connectors.clone()
    }

    async fn connect(&self, connector_id: &str) -> Result<Address> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected_with.lock().push(connector_id.to_string());

        let scripted = self.connect_script.lock().pop_front();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None => match &self.connect_fallback {
                ConnectFallback::Reject(message) => Err(WalletError::ConnectionRejected(message.clone())),
                ConnectFallback::Hang => std::future::pending().await,
            },
        };

        if let Ok(account) = &outcome {
            *self.current_account.lock() = Some(*account);
        }
        outcome
    }

    fn current_account(&self) -> Option<Address> {
        *self.current_account.lock()
    }

    async fn send_transaction(&self, from: Address, chain_id: u64, request: &TransactionRequest) -> Result<TxHash> {
        self.sent_chain_ids.lock().push(chain_id);
        let n = {
            let mut sent = self.sent.lock();
            sent.push((from, request.clone()));
            sent.len()
        };
        let scripted = self.send_script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(tx_hash(n as u8)))
    }

    async fn disconnect(&self) -> Result<()> {
        if self.unsupported_disconnect {
            return Err(WalletError::Unsupported("programmatic disconnect".to_string()));
        }
        *self.current_account.lock() = None;
        Ok(())
    }
}

pub(crate) enum StaticContextProvider {
    Ready(HostContext),
    Never,
    Failing(String),
}

impl StaticContextProvider {
    pub(crate) fn ready(context: HostContext) -> Self {
        Self::Ready(context)
    }

    pub(crate) fn never() -> Self {
        Self::Never
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::Failing(message.to_string())
    }
}

#[async_trait]
impl HostContextProvider for StaticContextProvider {
    async fn context(&self) -> Result<Option<HostContext>> {
        match self {
            Self::Ready(context) => Ok(Some(context.clone())),
            Self::Never => std::future::pending().await,
            Self::Failing(message) => Err(WalletError::Unsupported(message.clone())),
        }
    }
}

/// Node stand-in answering every `eth_call` the same way.
pub(crate) struct MockReader {
    response: Result<Bytes>,
    calls: Mutex<Vec<(Address, Bytes)>>,
}

impl MockReader {
    pub(crate) fn returning(value: U256) -> Self {
        Self {
            response: Ok(Bytes::from(value.to_be_bytes::<32>().to_vec())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            response: Err(WalletError::Rpc(message.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Well-formed RPC answer that is not an ABI word.
    pub(crate) fn garbage() -> Self {
        Self {
            response: Ok(Bytes::from(vec![0x01])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Address, Bytes)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.lock().push((to, data));
        self.response.clone()
    }
}
