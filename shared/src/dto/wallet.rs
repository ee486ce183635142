use serde::{Deserialize, Serialize};

/// Which wallet backend the facade is routing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Browser extension / injected provider wallet
    Injected,
    /// Host frame (Farcaster Mini App) wallet
    HostFrame,
    /// No backend selected yet
    #[default]
    None,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Injected => "injected",
            BackendKind::HostFrame => "hostFrame",
            BackendKind::None => "none",
        }
    }
}

/// Outcome of `connectWallet()` / `requireConnection()`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectResult {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a single submitted transaction.
///
/// Immutable once returned. `transaction_hash` is the 0x-prefixed hash reported by
/// the wallet library; it is only present on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn confirmed(transaction_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            error: Some(error.into()),
        }
    }
}

/// Read-only view of the wallet connection for UI layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub is_connected: bool,
    pub can_interact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,
    pub backend: BackendKind,
    pub connecting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_result_wire_shape() {
        let ok = TransactionResult::confirmed("0xabc");
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"success":true,"transactionHash":"0xabc"}"#
        );
    }

    #[test]
    fn test_connect_result_omits_empty_error() {
        assert_eq!(serde_json::to_string(&ConnectResult::ok()).unwrap(), r#"{"success":true}"#);
    }

    #[test]
    fn test_backend_kind_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&BackendKind::HostFrame).unwrap(), r#""hostFrame""#);
        assert_eq!(BackendKind::default(), BackendKind::None);
    }
}
