//! Pure aggregation over the stats document. Nothing here touches storage
//! or the clock: callers load the document and pass "today" in, which keeps
//! every function deterministic.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;

use crate::{
    classify::CategoryKind,
    daemon::storage::entities::{DailyUsage, DomainRecord},
};

/// A (day, domain) pair must reach this much time to count as a focus
/// session. This is a long-block proxy, not a true session count.
pub const FOCUS_SESSION_MS: i64 = 25 * 60 * 1000;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TimeRange {
    Today,
    Week,
    Month,
    All,
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::Today => write!(f, "today"),
            TimeRange::Week => write!(f, "week"),
            TimeRange::Month => write!(f, "month"),
            TimeRange::All => write!(f, "all"),
        }
    }
}

impl TimeRange {
    /// First calendar day included in the range, or `None` for no cutoff.
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::Today => Some(today),
            TimeRange::Week => Some(today - Duration::days(7)),
            TimeRange::Month => Some(today - Duration::days(30)),
            TimeRange::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SeriesMetric {
    /// Minutes per day.
    Time,
    /// Productivity score per day.
    Score,
}

impl Display for SeriesMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesMetric::Time => write!(f, "time"),
            SeriesMetric::Score => write!(f, "score"),
        }
    }
}

/// Headline numbers for one time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total_time: i64,
    pub productive_time: i64,
    /// Count of (day, domain) pairs at or above [FOCUS_SESSION_MS].
    pub focus_sessions: u32,
    /// 0..=100, zero exactly when nothing was tracked.
    pub productivity_score: u32,
}

/// Per-domain totals across a bucket subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiteStats {
    pub total_time: i64,
    /// Number of days the domain shows up in.
    pub days_active: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub value: i64,
}

/// Buckets dated on or after `cutoff`, by calendar day.
pub fn filter_since(
    daily_data: &BTreeMap<NaiveDate, DailyUsage>,
    cutoff: NaiveDate,
) -> BTreeMap<NaiveDate, DailyUsage> {
    daily_data
        .range(cutoff..)
        .map(|(date, bucket)| (*date, bucket.clone()))
        .collect()
}

/// The subset of daily buckets a time range covers, as of `today`.
pub fn filter_by_range(
    daily_data: &BTreeMap<NaiveDate, DailyUsage>,
    range: TimeRange,
    today: NaiveDate,
) -> BTreeMap<NaiveDate, DailyUsage> {
    match range.cutoff(today) {
        Some(cutoff) => filter_since(daily_data, cutoff),
        None => daily_data.clone(),
    }
}

pub fn productivity_score(productive_time: i64, total_time: i64) -> u32 {
    if total_time == 0 {
        return 0;
    }
    (productive_time as f64 / total_time as f64 * 100.).round() as u32
}

fn is_productive(time_data: &BTreeMap<Arc<str>, DomainRecord>, domain: &Arc<str>) -> bool {
    time_data
        .get(domain)
        .map_or(false, |record| record.category.kind == CategoryKind::Productive)
}

pub fn summarize(
    buckets: &BTreeMap<NaiveDate, DailyUsage>,
    time_data: &BTreeMap<Arc<str>, DomainRecord>,
) -> Summary {
    let mut total_time = 0;
    let mut productive_time = 0;
    let mut focus_sessions = 0;

    for bucket in buckets.values() {
        for (domain, &time) in bucket {
            total_time += time;
            if is_productive(time_data, domain) {
                productive_time += time;
            }
            if time >= FOCUS_SESSION_MS {
                focus_sessions += 1;
            }
        }
    }

    Summary {
        total_time,
        productive_time,
        focus_sessions,
        productivity_score: productivity_score(productive_time, total_time),
    }
}

/// Collapses a bucket subset into per-domain totals.
pub fn site_stats(buckets: &BTreeMap<NaiveDate, DailyUsage>) -> BTreeMap<Arc<str>, SiteStats> {
    let mut stats = BTreeMap::<Arc<str>, SiteStats>::new();
    for bucket in buckets.values() {
        for (domain, &time) in bucket {
            let entry = stats.entry(domain.clone()).or_default();
            entry.total_time += time;
            entry.days_active += 1;
        }
    }
    stats
}

/// The `n` domains with the most time in the subset, descending. Ties keep
/// their input order.
pub fn top_domains(
    buckets: &BTreeMap<NaiveDate, DailyUsage>,
    n: usize,
) -> Vec<(Arc<str>, SiteStats)> {
    let mut ranked = site_stats(buckets).into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));
    ranked.truncate(n);
    ranked
}

/// Time per category label (not per kind), for the breakdown chart and the
/// weekly report.
pub fn category_breakdown(
    buckets: &BTreeMap<NaiveDate, DailyUsage>,
    time_data: &BTreeMap<Arc<str>, DomainRecord>,
) -> BTreeMap<Arc<str>, i64> {
    let mut categories = BTreeMap::<Arc<str>, i64>::new();
    for bucket in buckets.values() {
        for (domain, &time) in bucket {
            let label = time_data
                .get(domain)
                .map(|record| record.category.label.clone())
                .unwrap_or_else(|| crate::classify::NEUTRAL_LABEL.into());
            *categories.entry(label).or_insert(0) += time;
        }
    }
    categories
}

/// One point per calendar day for the last `days` days ending at `today`,
/// oldest first and zero-filled for days without data.
pub fn daily_series(
    time_data: &BTreeMap<Arc<str>, DomainRecord>,
    daily_data: &BTreeMap<NaiveDate, DailyUsage>,
    metric: SeriesMetric,
    days: u32,
    today: NaiveDate,
) -> Vec<DayPoint> {
    crate::utils::time::trailing_days(today, days)
        .map(|date| {
            let mut day_total = 0;
            let mut day_productive = 0;
            if let Some(bucket) = daily_data.get(&date) {
                for (domain, &time) in bucket {
                    day_total += time;
                    if is_productive(time_data, domain) {
                        day_productive += time;
                    }
                }
            }
            let value = match metric {
                SeriesMetric::Time => (day_total as f64 / 60_000.).round() as i64,
                SeriesMetric::Score => i64::from(productivity_score(day_productive, day_total)),
            };
            DayPoint { date, value }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::daemon::storage::entities::StatsDocument;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap()
    }

    /// github 90s and facebook 40s today, plus an hour of github yesterday.
    fn sample_document() -> StatsDocument {
        let mut document = StatsDocument::default();
        let yesterday = Utc.with_ymd_and_hms(2018, 7, 3, 12, 0, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();
        document.record_visit(&Arc::from("github.com"), None, 3_600_000, yesterday);
        document.record_visit(&Arc::from("github.com"), None, 90_000, noon);
        document.record_visit(&Arc::from("facebook.com"), None, 40_000, noon);
        document
    }

    #[test]
    fn today_range_excludes_yesterday() {
        let document = sample_document();
        let filtered = filter_by_range(&document.daily_data, TimeRange::Today, today());

        assert_eq!(filtered.len(), 1);
        let bucket = &filtered[&today()];
        assert_eq!(bucket["github.com"], 90_000);
        assert!(!filtered.contains_key(&(today() - Duration::days(1))));
    }

    #[test]
    fn week_range_includes_yesterday() {
        let document = sample_document();
        let filtered = filter_by_range(&document.daily_data, TimeRange::Week, today());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn summarize_counts_productive_time_and_score() {
        let document = sample_document();
        let filtered = filter_by_range(&document.daily_data, TimeRange::Today, today());
        let summary = summarize(&filtered, &document.time_data);

        assert_eq!(summary.total_time, 130_000);
        assert_eq!(summary.productive_time, 90_000);
        // round(90000 / 130000 * 100) == 69
        assert_eq!(summary.productivity_score, 69);
        assert_eq!(summary.focus_sessions, 0);
    }

    #[test]
    fn summarize_of_nothing_is_zero() {
        let empty = BTreeMap::new();
        let summary = summarize(&empty, &BTreeMap::new());
        assert_eq!(summary.total_time, 0);
        assert_eq!(summary.productivity_score, 0);
    }

    #[test]
    fn score_stays_within_bounds() {
        assert_eq!(productivity_score(0, 0), 0);
        assert_eq!(productivity_score(1, 1_000_000), 0);
        assert_eq!(productivity_score(999_999, 1_000_000), 100);
        assert!(productivity_score(50, 100) <= 100);
    }

    #[test]
    fn focus_sessions_count_long_blocks_per_day() {
        let document = sample_document();
        let filtered = filter_by_range(&document.daily_data, TimeRange::Week, today());
        let summary = summarize(&filtered, &document.time_data);
        // Only yesterday's hour-long github block crosses 25 minutes.
        assert_eq!(summary.focus_sessions, 1);
    }

    #[test]
    fn top_domains_sorts_descending_and_truncates() {
        let document = sample_document();
        let all = filter_by_range(&document.daily_data, TimeRange::All, today());

        let top = top_domains(&all, 5);
        assert_eq!(&*top[0].0, "github.com");
        assert_eq!(top[0].1.total_time, 3_690_000);
        assert_eq!(top[0].1.days_active, 2);
        assert_eq!(&*top[1].0, "facebook.com");

        assert_eq!(top_domains(&all, 1).len(), 1);
    }

    #[test]
    fn category_breakdown_groups_by_label() {
        let document = sample_document();
        let today_only = filter_by_range(&document.daily_data, TimeRange::Today, today());
        let breakdown = category_breakdown(&today_only, &document.time_data);

        assert_eq!(breakdown["Development"], 90_000);
        assert_eq!(breakdown["Social Media"], 40_000);
    }

    #[test]
    fn daily_series_is_ordered_and_zero_filled() {
        let document = sample_document();
        let series = daily_series(
            &document.time_data,
            &document.daily_data,
            SeriesMetric::Time,
            7,
            today(),
        );

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, today() - Duration::days(6));
        assert_eq!(series[6].date, today());
        // Empty days read as zero.
        assert!(series[..5].iter().all(|point| point.value == 0));
        // Yesterday's hour of github, in minutes.
        assert_eq!(series[5].value, 60);
        // round((90000 + 40000) / 60000) == 2
        assert_eq!(series[6].value, 2);
    }

    #[test]
    fn daily_series_score_metric() {
        let document = sample_document();
        let series = daily_series(
            &document.time_data,
            &document.daily_data,
            SeriesMetric::Score,
            2,
            today(),
        );

        assert_eq!(series[0].value, 100);
        assert_eq!(series[1].value, 69);
    }
}
