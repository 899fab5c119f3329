//! Contains the contract between the daemon and the browser.
//! [TabHost] is the main artifact of this module: it abstracts the event
//! stream coming out of the browser extension and the tab lookups the
//! watcher performs against it.

pub mod socket;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

pub type TabId = u32;
pub type WindowId = i32;

/// Snapshot of a single browser tab as last reported by the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    /// Full page URL, e.g. `https://www.github.com/rust-lang/rust`.
    pub url: Arc<str>,
    /// Page title if the browser knows one yet.
    pub title: Option<Arc<str>>,
}

/// A focus-relevant notification from the browser. Delivery is serialized:
/// the watcher consumes one signal at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusSignal {
    /// The user switched to another tab.
    TabActivated { tab: TabId },
    /// A tab finished loading a new URL. `active` tells whether it was the
    /// focused tab at that moment.
    TabNavigated { tab: TabId, active: bool },
    /// Focus moved to another browser window, or away from the browser
    /// entirely (`window == None`).
    WindowFocus { window: Option<WindowId> },
    /// The content script reported user activity or inactivity.
    UserActivity { active: bool },
    /// A browser (re)connected to the daemon.
    BrowserConnected,
    /// The browser went away. Any open session should be closed.
    BrowserDisconnected,
}

/// Intended to serve as the contract any browser bridge must implement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabHost: Send {
    /// Waits for the next focus signal. `Ok(None)` means the host is done
    /// for good and the daemon should wind down.
    async fn next_signal(&mut self) -> Result<Option<FocusSignal>>;

    /// Resolves a tab id to its last known state. A tab that was closed
    /// between the event and the lookup resolves to `None`.
    fn tab_info(&mut self, tab: TabId) -> Result<Option<TabInfo>>;

    /// Returns the active tab of the given window, or of whichever window is
    /// focused when `window` is `None`.
    fn active_tab(&mut self, window: Option<WindowId>) -> Result<Option<TabInfo>>;
}

/// Decides whether a URL belongs to a page worth tracking. Internal browser
/// surfaces (chrome://, about:, devtools:// and so on) are never tracked.
/// A URL that fails to parse is still tracked in degraded form, see
/// [normalize_domain].
pub fn is_trackable(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => !url.is_empty(),
    }
}

/// Extracts the normalized domain of a URL: hostname with a leading `www.`
/// stripped. Falls back to the raw input when the URL does not parse, so a
/// malformed URL degrades instead of being dropped.
pub fn normalize_domain(url: &str) -> Arc<str> {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or(url);
            host.strip_prefix("www.").unwrap_or(host).into()
        }
        Err(_) => url.into(),
    }
}
