//! # Host Environment Detection
//!
//! Decides, once per session, whether the application is running inside the
//! social-feed host (Farcaster Mini App frame) or as an independent web page.
//!
//! ## Signals
//!
//! Checked in order, each match recorded in the verdict:
//!
//! 1. **Injected host flag** - set by the host's bootstrap script (direct signal)
//! 2. **Page URL / referrer** - host query parameters or host names
//! 3. **Framing** - the page is embedded; a cross-origin `window.top` access that
//!    threw counts as evidence of framing
//! 4. **User agent** - mobile embedded webview characteristics
//!
//! ## Decision Rule
//!
//! The host backend is selected iff at least one signal matched. With no signals the
//! standalone backend is used: wrongly assuming the host breaks signing entirely,
//! wrongly assuming standalone only costs the user a manual connect.
//!
//! ## Example
//!
//! ```rust
//! use lib_wallet::environment::{EnvironmentDetector, EnvironmentSignals, FrameRelation, Confidence};
//!
//! let signals = EnvironmentSignals {
//!     injected_host_flag: true,
//!     frame: FrameRelation::CrossOriginFrame,
//!     ..EnvironmentSignals::default()
//! };
//! let detector = EnvironmentDetector::new(signals);
//! let verdict = detector.detect();
//! assert!(verdict.use_host_backend);
//! assert_eq!(verdict.confidence, Confidence::High);
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::{debug, info};
use url::Url;

/// Query keys the host appends to Mini App launch URLs.
const HOST_QUERY_KEYS: &[&str] = &["miniApp", "fc_frame", "farcaster"];

/// Host names that serve the Mini App surface.
const HOST_DOMAINS: &[&str] = &["warpcast.com", "farcaster.xyz"];

/// User-agent tokens sent by the host's own mobile clients.
const HOST_UA_TOKENS: &[&str] = &["Warpcast", "Farcaster"];

/// How the page relates to the top-level browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRelation {
    /// `window.top === window`
    #[default]
    TopLevel,
    /// Framed, and `window.top` was readable
    SameOriginFrame,
    /// Framed, and reading `window.top` threw a cross-origin error
    CrossOriginFrame,
}

/// Raw facts about the hosting context, gathered by the embedding layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSignals {
    /// Global flag set by the host bootstrap script
    pub injected_host_flag: bool,
    /// Full page URL (`window.location.href`)
    pub page_url: Option<String>,
    /// `document.referrer`
    pub referrer: Option<String>,
    pub frame: FrameRelation,
    /// `navigator.userAgent`
    pub user_agent: Option<String>,
}

/// Source of environment signals.
///
/// Called at most once per detector.
pub trait SignalSource: Send + Sync {
    fn signals(&self) -> EnvironmentSignals;
}

impl SignalSource for EnvironmentSignals {
    fn signals(&self) -> EnvironmentSignals {
        self.clone()
    }
}

/// Individual evidence that the host environment is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    HostBootstrapFlag,
    HostQueryParam,
    HostDomain,
    HostReferrer,
    CrossOriginFrame,
    EmbeddedFrame,
    HostUserAgent,
    MobileWebview,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::HostBootstrapFlag => "host_bootstrap_flag",
            Signal::HostQueryParam => "host_query_param",
            Signal::HostDomain => "host_domain",
            Signal::HostReferrer => "host_referrer",
            Signal::CrossOriginFrame => "cross_origin_frame",
            Signal::EmbeddedFrame => "embedded_frame",
            Signal::HostUserAgent => "host_user_agent",
            Signal::MobileWebview => "mobile_webview",
        }
    }

    /// Direct signals alone justify high confidence.
    fn is_direct(&self) -> bool {
        matches!(self, Signal::HostBootstrapFlag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Immutable per-session detection result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentVerdict {
    pub use_host_backend: bool,
    pub confidence: Confidence,
    pub matched_signals: BTreeSet<Signal>,
}

impl EnvironmentVerdict {
    /// Verdict for a plain browser tab.
    pub fn standalone() -> Self {
        Self {
            use_host_backend: false,
            confidence: Confidence::Low,
            matched_signals: BTreeSet::new(),
        }
    }

    pub fn signal_names(&self) -> Vec<&'static str> {
        self.matched_signals.iter().map(Signal::as_str).collect()
    }
}

/// Memoizing environment detector.
pub struct EnvironmentDetector {
    source: Box<dyn SignalSource>,
    verdict: OnceLock<EnvironmentVerdict>,
}

impl EnvironmentDetector {
    pub fn new(source: impl SignalSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            verdict: OnceLock::new(),
        }
    }

    /// Detect the environment. Signals are read on the first call only; every later
    /// call returns the same verdict.
    pub fn detect(&self) -> &EnvironmentVerdict {
        self.verdict.get_or_init(|| {
            let verdict = evaluate(&self.source.signals());
            info!(
                use_host_backend = verdict.use_host_backend,
                confidence = ?verdict.confidence,
                signals = ?verdict.signal_names(),
                "Environment detected"
            );
            verdict
        })
    }
}

/// Pure evaluation of one signal snapshot.
pub fn evaluate(signals: &EnvironmentSignals) -> EnvironmentVerdict {
    let mut matched = BTreeSet::new();

    // 1. Host bootstrap flag
    if signals.injected_host_flag {
        matched.insert(Signal::HostBootstrapFlag);
    }

    // 2. URL parameters, host names, referrer
    if let Some(url) = signals.page_url.as_deref() {
        if has_host_query_param(url) {
            matched.insert(Signal::HostQueryParam);
        }
        if host_of(url).is_some_and(|host| is_host_domain(&host)) {
            matched.insert(Signal::HostDomain);
        }
    }
    if signals
        .referrer
        .as_deref()
        .and_then(host_of)
        .is_some_and(|host| is_host_domain(&host))
    {
        matched.insert(Signal::HostReferrer);
    }

    // 3. Framing
    match signals.frame {
        FrameRelation::CrossOriginFrame => {
            matched.insert(Signal::CrossOriginFrame);
        }
        FrameRelation::SameOriginFrame => {
            matched.insert(Signal::EmbeddedFrame);
        }
        FrameRelation::TopLevel => {}
    }

    // 4. User agent
    if let Some(ua) = signals.user_agent.as_deref() {
        if HOST_UA_TOKENS.iter().any(|token| ua.contains(token)) {
            matched.insert(Signal::HostUserAgent);
        } else if is_mobile_webview(ua) {
            matched.insert(Signal::MobileWebview);
        }
    }

    let confidence = if matched.iter().any(Signal::is_direct) {
        Confidence::High
    } else if matched.len() >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    debug!(signals = matched.len(), "Evaluated environment signals");

    EnvironmentVerdict {
        use_host_backend: !matched.is_empty(),
        confidence,
        matched_signals: matched,
    }
}

fn has_host_query_param(url: &str) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };
    let Some(query) = url.query() else {
        return false;
    };

    query.split('&').any(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts
            .next()
            .map(|v| urlencoding::decode(v).map(|d| d.into_owned()).unwrap_or_else(|_| v.to_string()))
            .unwrap_or_default();
        HOST_QUERY_KEYS.contains(&key) && value != "false" && value != "0"
    })
}

/// Host name of an absolute URL, as a WHATWG parser (the browser) sees it.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

fn is_host_domain(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    HOST_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

fn is_mobile_webview(ua: &str) -> bool {
    let android_webview = ua.contains("Android") && ua.contains("; wv)");
    let ios_device = ua.contains("iPhone") || ua.contains("iPad");
    let ios_webview = ios_device && ua.contains("AppleWebKit") && !ua.contains("Safari");
    android_webview || ios_webview
}
