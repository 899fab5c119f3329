//! Loopback bridge between the browser extension and the daemon.
//!
//! The extension's native-messaging shim connects to a localhost TCP socket
//! and writes one JSON message per line. State messages (`tab_state`,
//! `tab_removed`) keep a local mirror of the browser's tabs up to date so tab
//! lookups never have to round-trip back to the browser; the remaining
//! messages surface as [FocusSignal]s.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines},
    net::{
        tcp::OwnedReadHalf,
        TcpListener,
    },
};
use tracing::{debug, info, warn};

use super::{FocusSignal, TabHost, TabId, TabInfo, WindowId};

pub const DEFAULT_BRIDGE_PORT: u16 = 48632;

/// One message on the bridge wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeMessage {
    /// Upsert of a tab into the mirror. The extension sends these for every
    /// tab on connect and again whenever a tab changes.
    TabState {
        id: TabId,
        window_id: WindowId,
        url: Arc<str>,
        title: Option<Arc<str>>,
        active: bool,
    },
    TabRemoved {
        id: TabId,
    },
    TabActivated {
        id: TabId,
    },
    /// A navigation in `id` completed. `active` reflects whether the tab was
    /// focused when the load finished.
    TabUpdated {
        id: TabId,
        active: bool,
    },
    WindowFocus {
        window_id: Option<WindowId>,
    },
    UserActive,
    UserInactive,
}

#[derive(Debug, Clone)]
struct MirroredTab {
    window_id: WindowId,
    url: Arc<str>,
    title: Option<Arc<str>>,
    active: bool,
}

/// The main realization of [TabHost]: accepts one bridge connection at a
/// time and replays its messages as focus signals. A dropped connection is
/// surfaced as [FocusSignal::BrowserDisconnected] and the host then waits
/// for the browser to come back.
pub struct SocketTabHost {
    listener: TcpListener,
    connection: Option<Lines<BufReader<OwnedReadHalf>>>,
    tabs: HashMap<TabId, MirroredTab>,
}

impl SocketTabHost {
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        info!("Bridge listening on 127.0.0.1:{port}");
        Ok(Self {
            listener,
            connection: None,
            tabs: HashMap::new(),
        })
    }

    fn apply(&mut self, message: BridgeMessage) -> Option<FocusSignal> {
        match message {
            BridgeMessage::TabState {
                id,
                window_id,
                url,
                title,
                active,
            } => {
                if active {
                    // The browser keeps one active tab per window.
                    for tab in self.tabs.values_mut().filter(|t| t.window_id == window_id) {
                        tab.active = false;
                    }
                }
                self.tabs.insert(
                    id,
                    MirroredTab {
                        window_id,
                        url,
                        title,
                        active,
                    },
                );
                None
            }
            BridgeMessage::TabRemoved { id } => {
                self.tabs.remove(&id);
                None
            }
            BridgeMessage::TabActivated { id } => {
                if let Some(window_id) = self.tabs.get(&id).map(|t| t.window_id) {
                    for tab in self.tabs.values_mut().filter(|t| t.window_id == window_id) {
                        tab.active = false;
                    }
                }
                if let Some(tab) = self.tabs.get_mut(&id) {
                    tab.active = true;
                }
                Some(FocusSignal::TabActivated { tab: id })
            }
            BridgeMessage::TabUpdated { id, active } => {
                Some(FocusSignal::TabNavigated { tab: id, active })
            }
            BridgeMessage::WindowFocus { window_id } => {
                Some(FocusSignal::WindowFocus { window: window_id })
            }
            BridgeMessage::UserActive => Some(FocusSignal::UserActivity { active: true }),
            BridgeMessage::UserInactive => Some(FocusSignal::UserActivity { active: false }),
        }
    }

    fn info_of(tab: &MirroredTab) -> TabInfo {
        TabInfo {
            url: tab.url.clone(),
            title: tab.title.clone(),
        }
    }
}

#[async_trait]
impl TabHost for SocketTabHost {
    async fn next_signal(&mut self) -> Result<Option<FocusSignal>> {
        loop {
            let Some(lines) = self.connection.as_mut() else {
                let (stream, peer) = self.listener.accept().await?;
                info!("Browser bridge connected from {peer}");
                let (read, _write) = stream.into_split();
                self.connection = Some(BufReader::new(read).lines());
                self.tabs.clear();
                return Ok(Some(FocusSignal::BrowserConnected));
            };

            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<BridgeMessage>(&line) {
                        Ok(message) => {
                            debug!("Bridge message {message:?}");
                            if let Some(signal) = self.apply(message) {
                                return Ok(Some(signal));
                            }
                        }
                        Err(e) => {
                            // Skip unknown or malformed messages instead of
                            // tearing the bridge down.
                            warn!("Ignoring malformed bridge message {line}: {e}");
                        }
                    }
                }
                Ok(None) => {
                    info!("Browser bridge disconnected");
                    self.connection = None;
                    return Ok(Some(FocusSignal::BrowserDisconnected));
                }
                Err(e) => {
                    warn!("Bridge read failed: {e}");
                    self.connection = None;
                    return Ok(Some(FocusSignal::BrowserDisconnected));
                }
            }
        }
    }

    fn tab_info(&mut self, tab: TabId) -> Result<Option<TabInfo>> {
        Ok(self.tabs.get(&tab).map(Self::info_of))
    }

    fn active_tab(&mut self, window: Option<WindowId>) -> Result<Option<TabInfo>> {
        let found = self
            .tabs
            .values()
            .find(|t| t.active && window.map_or(true, |w| t.window_id == w));
        Ok(found.map(Self::info_of))
    }
}
