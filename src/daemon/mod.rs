use std::path::PathBuf;

use anyhow::Result;
use collection::{idle::IdleGate, watcher::FocusWatcher};
use processing::{session::SessionTracker, ProcessingModule};
use storage::stats_storage::JsonStatsStorage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    browser::{socket::SocketTabHost, TabHost},
    daemon::event::FocusEvent,
    utils::clock::{Clock, SystemClock},
};

pub mod args;
pub mod collection;
pub mod event;
pub mod processing;
pub mod shutdown;
pub mod storage;

pub const STATS_FILE_NAME: &str = "stats.json";

#[derive(Debug, Clone, Copy)]
pub struct DaemonOptions {
    pub port: u16,
    pub idle_pause: bool,
}

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, options: DaemonOptions) -> Result<()> {
    std::env::set_current_dir("/")?;

    let (sender, receiver) = mpsc::channel::<FocusEvent>(10);
    let host = SocketTabHost::bind(options.port).await?;

    let shutdown_token = CancellationToken::new();

    let watcher = create_watcher(
        sender,
        host,
        &shutdown_token,
        options.idle_pause,
        SystemClock,
    );

    let tracker = create_tracker(dir.join(STATS_FILE_NAME), receiver, SystemClock)?;

    let (_, watch_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        watcher.run(),
        tracker.run(),
    );

    if let Err(watch_result) = watch_result {
        error!("Watcher module got an error {:?}", watch_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

fn create_watcher(
    sender: mpsc::Sender<FocusEvent>,
    host: impl TabHost + 'static,
    shutdown_token: &CancellationToken,
    idle_pause: bool,
    clock: impl Clock,
) -> FocusWatcher {
    FocusWatcher::new(
        sender,
        Box::new(host),
        shutdown_token.clone(),
        IdleGate::new(idle_pause),
        Box::new(clock),
    )
}

fn create_tracker(
    stats_path: PathBuf,
    receiver: mpsc::Receiver<FocusEvent>,
    clock: impl Clock,
) -> Result<ProcessingModule<SessionTracker<JsonStatsStorage>>, anyhow::Error> {
    let storage = JsonStatsStorage::new(stats_path)?;
    let tracker = SessionTracker::new(storage, Box::new(clock));
    Ok(ProcessingModule::new(receiver, tracker))
}

#[cfg(test)]
mod daemon_tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use mockall::Sequence;
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        browser::{FocusSignal, MockTabHost, TabInfo},
        classify::CategoryKind,
        daemon::{
            create_tracker, create_watcher,
            event::FocusEvent,
            storage::stats_storage::{JsonStatsStorage, StatsStorage},
            STATS_FILE_NAME,
        },
        utils::{clock::testing::ManualClock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn tab(url: &str, title: Option<&str>) -> TabInfo {
        TabInfo {
            url: url.into(),
            title: title.map(Into::into),
        }
    }

    /// Scripts a browser run: connect, sit on github for 90 seconds, switch
    /// to facebook for 40 seconds, then leave the browser entirely. The
    /// clock advances as a side effect of handing out signals, the way wall
    /// time advances between real events.
    fn scripted_host(clock: ManualClock) -> MockTabHost {
        let mut host = MockTabHost::new();
        let mut seq = Sequence::new();

        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(FocusSignal::BrowserConnected)));
        {
            let clock = clock.clone();
            host.expect_next_signal()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || {
                    clock.advance(Duration::seconds(90));
                    Ok(Some(FocusSignal::TabActivated { tab: 2 }))
                });
        }
        {
            let clock = clock.clone();
            host.expect_next_signal()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || {
                    clock.advance(Duration::seconds(40));
                    Ok(Some(FocusSignal::WindowFocus { window: None }))
                });
        }
        host.expect_next_signal()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));

        host.expect_active_tab()
            .returning(|_| Ok(Some(tab("https://www.github.com/rust-lang", Some("GitHub")))));
        host.expect_tab_info()
            .withf(|tab| *tab == 2)
            .returning(|_| Ok(Some(tab("https://facebook.com/feed", Some("Facebook")))));

        host
    }

    /// Smoke test running the whole pipeline against real storage in a temp
    /// directory.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let clock = ManualClock::starting_at(Utc.from_utc_datetime(&TEST_START_DATE));
        let host = scripted_host(clock.clone());

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<FocusEvent>(10);

        let watcher = create_watcher(sender, host, &shutdown_token, false, clock.clone());

        let dir = tempdir()?;
        let stats_path = dir.path().join(STATS_FILE_NAME);
        let tracker = create_tracker(stats_path.clone(), receiver, clock.clone())?;

        let (watch_result, processing_result) = tokio::join!(watcher.run(), tracker.run());
        watch_result?;
        processing_result?;

        let document = JsonStatsStorage::new(stats_path)?.load().await?;

        let github = &document.time_data["github.com"];
        assert_eq!(github.total_time, 90_000);
        assert_eq!(github.visits, 1);
        assert_eq!(github.category.kind, CategoryKind::Productive);
        assert_eq!(github.title.as_deref(), Some("GitHub"));

        let facebook = &document.time_data["facebook.com"];
        assert_eq!(facebook.total_time, 40_000);
        assert_eq!(facebook.visits, 1);
        assert_eq!(facebook.category.kind, CategoryKind::Unproductive);

        let bucket = &document.daily_data[&TEST_START_DATE.date()];
        assert_eq!(bucket["github.com"], 90_000);
        assert_eq!(bucket["facebook.com"], 40_000);

        Ok(())
    }
}
