use super::*;
use crate::credentials::CredentialSource;
use crate::environment::{evaluate, EnvironmentSignals};
use crate::erc20;
use crate::state::IDENTITY_WITHOUT_SIGNER;
use crate::testing::{
    approve_request, host_context, tx_hash, MockReader, MockWalletLibrary, StaticContextProvider, LIVE,
    SPENDER, TOKEN, VERIFIED,
};
use crate::types::TransactionRequest;
use alloy_primitives::Bytes;
use std::time::Duration;

struct Harness {
    wallet: UnifiedWalletConnection,
    injected: Arc<MockWalletLibrary>,
    frame: Arc<MockWalletLibrary>,
    reader: Arc<MockReader>,
}

fn host_verdict() -> EnvironmentVerdict {
    evaluate(&EnvironmentSignals {
        injected_host_flag: true,
        ..Default::default()
    })
}

fn build(
    verdict: EnvironmentVerdict,
    injected: MockWalletLibrary,
    frame: MockWalletLibrary,
    credentials: CredentialSource,
    host_context: Option<StaticContextProvider>,
    reader: MockReader,
) -> Harness {
    let injected = Arc::new(injected);
    let frame = Arc::new(frame);
    let reader = Arc::new(reader);

    let backends = WalletBackends {
        injected: injected.clone(),
        host_frame: frame.clone(),
        credentials: Arc::new(credentials),
        host_context: host_context.map(|p| Arc::new(p) as Arc<dyn HostContextProvider>),
        reader: reader.clone(),
    };

    Harness {
        wallet: UnifiedWalletConnection::new(verdict, backends, WalletConfig::default()),
        injected,
        frame,
        reader,
    }
}

fn standalone(injected: MockWalletLibrary) -> Harness {
    build(
        EnvironmentVerdict::standalone(),
        injected,
        MockWalletLibrary::frame(),
        CredentialSource::new(),
        None,
        MockReader::returning(U256::ZERO),
    )
}

fn hosted(frame: MockWalletLibrary, credentials: CredentialSource) -> Harness {
    build(
        host_verdict(),
        MockWalletLibrary::new("wagmi"),
        frame,
        credentials,
        None,
        MockReader::returning(U256::ZERO),
    )
}

fn reading(reader: MockReader) -> Harness {
    build(
        EnvironmentVerdict::standalone(),
        MockWalletLibrary::new("wagmi"),
        MockWalletLibrary::frame(),
        CredentialSource::new(),
        None,
        reader,
    )
}

fn wrap_request() -> TransactionRequest {
    TransactionRequest::new(SPENDER, Bytes::from(vec![0xea, 0x59, 0x8c, 0xb0]))
}

// ---- backend selection ----

#[test]
fn test_verdict_selects_single_backend() {
    assert_eq!(standalone(MockWalletLibrary::new("wagmi")).wallet.backend_kind(), BackendKind::Injected);

    let host = hosted(MockWalletLibrary::frame(), CredentialSource::new());
    assert_eq!(host.wallet.backend_kind(), BackendKind::HostFrame);
    assert_eq!(host.wallet.state().backend_kind, BackendKind::HostFrame);
}

// ---- capability split ----

#[tokio::test]
async fn test_identity_without_signer() {
    let h = hosted(
        MockWalletLibrary::frame().always_failing_connect("signer unavailable"),
        CredentialSource::from_context(host_context()),
    );

    h.wallet.initialize().await;

    assert!(h.wallet.is_connected());
    assert!(!h.wallet.can_interact());
    assert_eq!(h.wallet.address(), Some(VERIFIED));

    let state = h.wallet.state();
    assert_eq!(state.warning.as_deref(), Some(IDENTITY_WITHOUT_SIGNER));
    assert!(state.last_error.is_none());
    assert!(!state.connecting);
}

#[tokio::test]
async fn test_host_auto_connect_becomes_interactive() {
    let h = hosted(
        MockWalletLibrary::frame().with_connect_results(vec![Ok(LIVE)]),
        CredentialSource::from_context(host_context()),
    );

    assert_eq!(h.wallet.initialize().await, Some(LIVE));

    assert!(h.wallet.can_interact());
    assert_eq!(h.wallet.address(), Some(LIVE));
    assert!(h.wallet.state().warning.is_none());
}

// ---- auto-connect bound ----

#[tokio::test]
async fn test_fourth_automatic_trigger_does_not_reach_library() {
    let h = hosted(
        MockWalletLibrary::frame().always_failing_connect("frame not ready"),
        CredentialSource::from_context(host_context()),
    );

    for _ in 0..4 {
        assert_eq!(h.wallet.auto_connect().await, None);
    }

    assert_eq!(h.frame.connect_calls(), 3);
    let warning = h.wallet.state().warning.unwrap_or_default();
    assert!(warning.contains("3 attempts"), "{warning}");
}

#[tokio::test]
async fn test_pushed_identity_triggers_auto_connect() {
    let h = hosted(
        MockWalletLibrary::frame().with_connect_results(vec![Ok(LIVE)]),
        CredentialSource::new(),
    );

    assert_eq!(h.wallet.initialize().await, None);
    assert_eq!(h.frame.connect_calls(), 0);

    assert_eq!(h.wallet.apply_host_context(Some(host_context())).await, Some(LIVE));
    assert!(h.wallet.can_interact());
}

#[tokio::test(start_paused = true)]
async fn test_host_context_timeout_is_soft() {
    let h = build(
        host_verdict(),
        MockWalletLibrary::new("wagmi"),
        MockWalletLibrary::frame().with_connect_results(vec![Ok(LIVE)]),
        CredentialSource::new(),
        Some(StaticContextProvider::never()),
        MockReader::returning(U256::ZERO),
    );

    assert_eq!(h.wallet.initialize().await, None);

    assert!(!h.wallet.is_connected());
    assert!(h.wallet.state().last_error.is_none());
    assert_eq!(h.frame.connect_calls(), 0);
}

#[tokio::test]
async fn test_initialize_loads_host_context() {
    let h = build(
        host_verdict(),
        MockWalletLibrary::new("wagmi"),
        MockWalletLibrary::frame().with_connect_results(vec![Ok(LIVE)]),
        CredentialSource::new(),
        Some(StaticContextProvider::ready(host_context())),
        MockReader::returning(U256::ZERO),
    );

    assert_eq!(h.wallet.initialize().await, Some(LIVE));
    assert_eq!(h.wallet.credentials().get_primary_address(), Some(VERIFIED));
}

#[tokio::test]
async fn test_injected_initialize_resumes_session() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_current_account(LIVE));

    assert_eq!(h.wallet.initialize().await, Some(LIVE));
    assert!(h.wallet.can_interact());
    assert_eq!(h.injected.connect_calls(), 0);
}

#[tokio::test]
async fn test_wallet_lock_drops_transact_capability() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_current_account(LIVE));
    h.wallet.initialize().await;
    assert!(h.wallet.can_interact());

    h.injected.set_current_account(None);
    assert_eq!(h.wallet.auto_connect().await, None);

    assert!(!h.wallet.can_interact());
    assert_eq!(h.wallet.address(), None);
    let result = h.wallet.send_transaction(&approve_request()).await;
    assert!(!result.success);
    assert!(h.injected.sent().is_empty());
}

#[tokio::test]
async fn test_wallet_account_switch_is_followed() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_current_account(LIVE));
    h.wallet.initialize().await;

    h.injected.set_current_account(Some(VERIFIED));
    h.wallet.auto_connect().await;
    h.wallet.send_transaction(&approve_request()).await;

    assert_eq!(h.wallet.address(), Some(VERIFIED));
    assert_eq!(h.injected.sent()[0].0, VERIFIED);
}

// ---- connection gate ----

#[tokio::test]
async fn test_require_connection_is_free_when_interactive() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));
    assert!(h.wallet.connect_wallet().await.success);

    let gate = h.wallet.require_connection().await;

    assert!(gate.success);
    assert_eq!(gate.error, None);
    assert_eq!(h.injected.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_host_require_connection_retries_once_more() {
    let h = hosted(
        MockWalletLibrary::frame().with_connect_results(vec![
            Err(WalletError::ConnectionRejected("frame still loading".into())),
            Ok(LIVE),
        ]),
        CredentialSource::from_context(host_context()),
    );

    let gate = h.wallet.require_connection().await;

    assert!(gate.success);
    assert_eq!(h.frame.connect_calls(), 2);
    assert!(h.wallet.can_interact());
}

#[tokio::test]
async fn test_rejected_connect_passes_library_message() {
    let h = standalone(
        MockWalletLibrary::new("wagmi")
            .with_connect_results(vec![Err(WalletError::ConnectionRejected("User rejected the request.".into()))]),
    );

    let result = h.wallet.connect_wallet().await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Failed to connect wallet: User rejected the request."));
    let state = h.wallet.state();
    assert!(!state.connecting);
    assert_eq!(state.last_error.map(|e| e.code), Some("ConnectionRejected"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_connect_is_rejected() {
    let h = hosted(
        MockWalletLibrary::frame().with_hanging_connect(),
        CredentialSource::from_context(host_context()),
    );

    let (first, second) = tokio::join!(h.wallet.connect_wallet(), h.wallet.connect_wallet());

    assert!(!first.success);
    assert!(first.error.unwrap_or_default().contains("did not respond"));
    assert_eq!(second.error, Some(WalletError::ConnectionInProgress.user_message()));
    assert_eq!(h.frame.connect_calls(), 3);
    assert!(!h.wallet.state().connecting);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_abandons_pending_connect() {
    let h = hosted(
        MockWalletLibrary::frame().with_hanging_connect(),
        CredentialSource::from_context(host_context()),
    );

    let (result, ()) = tokio::join!(h.wallet.connect_wallet(), h.wallet.disconnect());

    assert!(!result.success);
    assert_eq!(result.error, Some(WalletError::ConnectionCancelled.user_message()));
    assert_eq!(h.frame.connect_calls(), 1);
    assert_eq!(h.wallet.state(), ConnectionState::new(BackendKind::HostFrame));
}

// ---- transactions ----

#[tokio::test]
async fn test_send_carries_configured_chain_id() {
    let frame = Arc::new(MockWalletLibrary::frame().with_connect_results(vec![Ok(LIVE)]));
    let backends = WalletBackends {
        injected: Arc::new(MockWalletLibrary::new("wagmi")),
        host_frame: frame.clone(),
        credentials: Arc::new(CredentialSource::from_context(host_context())),
        host_context: None,
        reader: Arc::new(MockReader::returning(U256::ZERO)),
    };
    let config = WalletConfig {
        chain_id: 84532,
        ..WalletConfig::default()
    };
    let wallet = UnifiedWalletConnection::new(host_verdict(), backends, config);

    assert!(wallet.send_transaction(&approve_request()).await.success);
    assert_eq!(frame.sent_chain_ids(), vec![84532]);
}

#[tokio::test]
async fn test_standalone_send_without_wallet_asks_to_connect() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));

    let result = h.wallet.send_transaction(&approve_request()).await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().to_lowercase().contains("connect"));
    assert!(result.transaction_hash.is_none());
    assert!(h.injected.sent().is_empty());
    assert_eq!(h.injected.connect_calls(), 0);
    assert!(h.wallet.state().last_error.is_some());
}

#[tokio::test]
async fn test_successful_send_clears_last_error() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));
    h.wallet.send_transaction(&approve_request()).await;
    h.wallet.connect_wallet().await;

    let result = h.wallet.send_transaction(&approve_request()).await;

    assert!(result.success);
    assert_eq!(result.transaction_hash, Some(tx_hash(1).to_string()));
    assert!(h.wallet.state().last_error.is_none());
    assert_eq!(h.injected.sent()[0].0, LIVE);
}

#[tokio::test]
async fn test_revert_message_passes_through() {
    let h = standalone(
        MockWalletLibrary::new("wagmi")
            .with_connect_results(vec![Ok(LIVE)])
            .with_send_results(vec![Err(WalletError::TransactionRejected("ERC20: insufficient balance".into()))]),
    );
    h.wallet.connect_wallet().await;

    let result = h.wallet.send_transaction(&approve_request()).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("ERC20: insufficient balance"));
    assert_eq!(h.wallet.state().last_error.map(|e| e.code), Some("TransactionRejected"));
}

#[tokio::test]
async fn test_approve_erc20_targets_token() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));
    h.wallet.connect_wallet().await;

    let result = h.wallet.approve_erc20(TOKEN, SPENDER, U256::from(5u64)).await;

    assert!(result.success);
    let (_, request) = &h.injected.sent()[0];
    assert_eq!(request.to, TOKEN);
    assert_eq!(request.data, erc20::encode_approve(SPENDER, U256::from(5u64)));
}

// ---- allowance ----

#[tokio::test]
async fn test_allowance_read() {
    let h = reading(MockReader::returning(U256::from(500u64)));

    let allowance = h.wallet.check_allowance(TOKEN, VERIFIED, SPENDER).await;

    assert_eq!(allowance, U256::from(500u64));
    let calls = h.reader.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, TOKEN);
    assert_eq!(calls[0].1, erc20::encode_allowance(VERIFIED, SPENDER));
}

#[tokio::test]
async fn test_allowance_read_failure_is_zero() {
    let h = reading(MockReader::failing("connection refused"));
    assert_eq!(h.wallet.check_allowance(TOKEN, VERIFIED, SPENDER).await, U256::ZERO);

    let h = reading(MockReader::garbage());
    assert_eq!(h.wallet.check_allowance(TOKEN, VERIFIED, SPENDER).await, U256::ZERO);
}

#[tokio::test]
async fn test_allowance_needs_no_connection() {
    let h = reading(MockReader::returning(U256::from(1u64)));

    h.wallet.check_allowance(TOKEN, VERIFIED, SPENDER).await;

    assert_eq!(h.injected.connect_calls(), 0);
    assert!(!h.wallet.is_connected());
}

// ---- batch ----

#[tokio::test(start_paused = true)]
async fn test_batch_stops_at_first_failure() {
    let h = standalone(
        MockWalletLibrary::new("wagmi")
            .with_connect_results(vec![Ok(LIVE)])
            .with_send_results(vec![
                Ok(tx_hash(1)),
                Ok(tx_hash(2)),
                Err(WalletError::TransactionRejected("execution reverted".into())),
            ]),
    );
    h.wallet.connect_wallet().await;
    let requests = vec![approve_request(); 5];

    let results = h.wallet.batch_transactions(&requests).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].success && results[1].success);
    assert_eq!(results[2].error.as_deref(), Some("execution reverted"));
    assert_eq!(h.injected.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_batch_pauses_between_transactions() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));
    h.wallet.connect_wallet().await;
    let start = tokio::time::Instant::now();

    let results = h.wallet.batch_transactions(&[approve_request(), approve_request(), approve_request()]).await;

    assert_eq!(results.len(), 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_approve_then_wrap_trace_shows_failed_wrap() {
    let h = standalone(
        MockWalletLibrary::new("wagmi")
            .with_connect_results(vec![Ok(LIVE)])
            .with_send_results(vec![
                Ok(tx_hash(1)),
                Err(WalletError::TransactionRejected("wrap reverted".into())),
            ]),
    );
    h.wallet.connect_wallet().await;

    let results = h.wallet.batch_transactions(&[approve_request(), wrap_request()]).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].transaction_hash.is_none());
}

#[tokio::test]
async fn test_batch_without_connection_attempts_nothing() {
    let h = standalone(MockWalletLibrary::new("wagmi"));

    let results = h.wallet.batch_transactions(&[approve_request(), wrap_request()]).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(h.injected.sent().is_empty());
}

// ---- disconnect / snapshot ----

#[tokio::test]
async fn test_disconnect_resets_state() {
    let h = standalone(MockWalletLibrary::new("wagmi").with_connect_results(vec![Ok(LIVE)]));
    h.wallet.connect_wallet().await;

    h.wallet.disconnect().await;

    assert!(!h.wallet.is_connected());
    assert_eq!(h.wallet.address(), None);
    assert_eq!(h.wallet.state(), ConnectionState::new(BackendKind::Injected));
}

#[tokio::test]
async fn test_snapshot_for_ui() {
    let h = hosted(
        MockWalletLibrary::frame().always_failing_connect("no signer"),
        CredentialSource::from_context(host_context()),
    );
    h.wallet.initialize().await;

    let snapshot = h.wallet.snapshot();

    assert!(snapshot.is_connected);
    assert!(!snapshot.can_interact);
    assert_eq!(snapshot.backend, BackendKind::HostFrame);
    assert_eq!(snapshot.short_address.as_deref(), Some("0x5aAe...eAed"));
    assert!(snapshot.warning.is_some());
}
