use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    browser::{is_trackable, normalize_domain, FocusSignal, TabHost, TabInfo},
    daemon::event::{FocusEvent, PageVisit},
    utils::clock::Clock,
};

use super::idle::{IdleGate, IdleTransition};

/// Turns raw browser signals into resolved focus events. Resolution happens
/// here, before the channel: a tab that disappeared between the signal and
/// the lookup, an internal browser page, or an unfocused browser all come
/// out as an event with no target.
pub struct FocusWatcher {
    next: mpsc::Sender<FocusEvent>,
    host: Box<dyn TabHost>,
    shutdown: CancellationToken,
    idle_gate: IdleGate,
    time_provider: Box<dyn Clock>,
}

impl FocusWatcher {
    pub fn new(
        next: mpsc::Sender<FocusEvent>,
        host: Box<dyn TabHost>,
        shutdown: CancellationToken,
        idle_gate: IdleGate,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            host,
            shutdown,
            idle_gate,
            time_provider,
        }
    }

    /// Executes the watcher event loop. Ends when the host's signal stream
    /// does, or on cancellation.
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which
                // means we also drop the sender channel and consequently stop
                // the processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                signal = self.host.next_signal() => {
                    match signal {
                        Ok(Some(signal)) => self.handle_signal(signal).await?,
                        Ok(None) => {
                            info!("Signal stream finished, watcher is done");
                            return Ok(());
                        }
                        Err(e) => {
                            error!("Encountered an error waiting for a signal {:?}", e)
                        }
                    }
                }
            }
        }
    }

    async fn handle_signal(&mut self, signal: FocusSignal) -> Result<()> {
        debug!("Handling signal {:?}", signal);
        match signal {
            FocusSignal::TabActivated { tab } => {
                let target = self.host.tab_info(tab)?;
                self.send_focus(target).await
            }
            FocusSignal::TabNavigated { tab, active } => {
                if !active {
                    return Ok(());
                }
                let target = self.host.tab_info(tab)?;
                self.send_focus(target).await
            }
            FocusSignal::WindowFocus { window: Some(window) } => {
                let target = self.host.active_tab(Some(window))?;
                self.send_focus(target).await
            }
            FocusSignal::WindowFocus { window: None } => self.send_focus(None).await,
            FocusSignal::BrowserConnected => {
                let target = self.host.active_tab(None)?;
                self.send_focus(target).await
            }
            FocusSignal::BrowserDisconnected => self.send_focus(None).await,
            FocusSignal::UserActivity { active } => match self.idle_gate.observe(active) {
                Some(IdleTransition::Pause) => self.send_focus(None).await,
                Some(IdleTransition::Resume) => {
                    let target = self.host.active_tab(None)?;
                    self.send_focus(target).await
                }
                None => Ok(()),
            },
        }
    }

    async fn send_focus(&mut self, tab: Option<TabInfo>) -> Result<()> {
        let event = FocusEvent {
            target: tab.and_then(as_page_visit),
            timestamp: self.time_provider.now(),
        };
        debug!("Sending event {:?}", event);
        self.next
            .send(event)
            .await
            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        Ok(())
    }
}

/// Reduces a tab to the page the tracker cares about. Untrackable URLs
/// reduce to nothing.
fn as_page_visit(tab: TabInfo) -> Option<PageVisit> {
    if !is_trackable(&tab.url) {
        return None;
    }
    Some(PageVisit {
        domain: normalize_domain(&tab.url),
        title: tab.title,
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use mockall::Sequence;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        browser::{FocusSignal, MockTabHost, TabInfo},
        daemon::{collection::idle::IdleGate, event::FocusEvent},
        utils::clock::testing::ManualClock,
    };

    use super::FocusWatcher;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn tab(url: &str, title: Option<&str>) -> TabInfo {
        TabInfo {
            url: url.into(),
            title: title.map(Into::into),
        }
    }

    fn watcher(
        host: MockTabHost,
        idle_pause: bool,
    ) -> (FocusWatcher, mpsc::Receiver<FocusEvent>) {
        let (sender, receiver) = mpsc::channel(10);
        let watcher = FocusWatcher::new(
            sender,
            Box::new(host),
            CancellationToken::new(),
            IdleGate::new(idle_pause),
            Box::new(ManualClock::starting_at(
                Utc.from_utc_datetime(&TEST_START_DATE),
            )),
        );
        (watcher, receiver)
    }

    #[tokio::test]
    async fn activation_resolves_and_normalizes() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::TabActivated { tab: 1 })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        host.expect_tab_info()
            .returning(|_| Ok(Some(tab("https://www.github.com/rust-lang", Some("GitHub")))));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        let event = receiver.recv().await.unwrap();
        let visit = event.target.unwrap();
        assert_eq!(&*visit.domain, "github.com");
        assert_eq!(visit.title.as_deref(), Some("GitHub"));
        assert!(receiver.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn closed_tab_resolves_to_no_target() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::TabActivated { tab: 9 })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        host.expect_tab_info().returning(|_| Ok(None));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        assert_eq!(receiver.recv().await.unwrap().target, None);
        Ok(())
    }

    #[tokio::test]
    async fn internal_pages_resolve_to_no_target() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::TabActivated { tab: 2 })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        host.expect_tab_info()
            .returning(|_| Ok(Some(tab("chrome://settings", None))));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        assert_eq!(receiver.recv().await.unwrap().target, None);
        Ok(())
    }

    #[tokio::test]
    async fn background_navigation_is_ignored() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::TabNavigated { tab: 3, active: false })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        assert!(receiver.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn window_focus_resolves_that_windows_active_tab() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::WindowFocus { window: Some(4) })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        host.expect_active_tab()
            .withf(|window| *window == Some(4))
            .returning(|_| Ok(Some(tab("https://notion.so/page", None))));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        let event = receiver.recv().await.unwrap();
        assert_eq!(&*event.target.unwrap().domain, "notion.so");
        Ok(())
    }

    #[tokio::test]
    async fn activity_reports_are_ignored_without_idle_pause() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::UserActivity { active: false })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));

        let (watcher, mut receiver) = watcher(host, false);
        watcher.run().await?;

        assert!(receiver.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn idle_pause_closes_and_reopens_sessions() -> Result<()> {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::UserActivity { active: false })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::UserActivity { active: true })));
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        host.expect_active_tab()
            .returning(|_| Ok(Some(tab("https://leetcode.com/problems", None))));

        let (watcher, mut receiver) = watcher(host, true);
        watcher.run().await?;

        assert_eq!(receiver.recv().await.unwrap().target, None);
        assert_eq!(
            &*receiver.recv().await.unwrap().target.unwrap().domain,
            "leetcode.com"
        );
        Ok(())
    }
}
