use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::classify::{classify, Category};

/// Milliseconds accumulated per domain during one calendar day.
pub type DailyUsage = BTreeMap<Arc<str>, i64>;

/// All-time aggregate for one domain. Field names follow the stored document
/// format, which the export command round-trips verbatim.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Cumulative milliseconds across every recorded session.
    pub total_time: i64,
    /// Number of closed sessions that made it past the noise threshold.
    pub visits: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_visit: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Arc<str>>,
    pub category: Category,
}

/// The persisted whole: all-time records keyed by domain plus per-day usage
/// buckets keyed by ISO date. Read and written as one document.
#[derive(PartialEq, Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatsDocument {
    #[serde(default)]
    pub time_data: BTreeMap<Arc<str>, DomainRecord>,
    #[serde(default)]
    pub daily_data: BTreeMap<NaiveDate, DailyUsage>,
}

impl StatsDocument {
    /// Applies one closed session to both aggregates. The category is
    /// recomputed on every write, so table changes take effect on the next
    /// visit to a domain.
    pub fn record_visit(
        &mut self,
        domain: &Arc<str>,
        title: Option<Arc<str>>,
        elapsed_ms: i64,
        now: DateTime<Utc>,
    ) {
        let record = self
            .time_data
            .entry(domain.clone())
            .or_insert_with(|| DomainRecord {
                total_time: 0,
                visits: 0,
                last_visit: now,
                title: None,
                category: classify(domain),
            });
        record.total_time += elapsed_ms;
        record.visits += 1;
        record.last_visit = now;
        if title.is_some() {
            record.title = title;
        }
        record.category = classify(domain);

        let bucket = self.daily_data.entry(now.date_naive()).or_default();
        *bucket.entry(domain.clone()).or_insert(0) += elapsed_ms;
    }
}
