//! Weekly report and textual insights derived from the stats document.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::daemon::storage::entities::StatsDocument;

use super::analysis::{category_breakdown, filter_since, productivity_score, site_stats};

const TOP_CATEGORY_COUNT: usize = 5;
const EIGHT_HOURS_MS: i64 = 8 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    pub total_time: i64,
    pub productive_time: i64,
    pub productivity_score: u32,
    /// Up to five category labels with their time, busiest first.
    pub top_categories: Vec<(Arc<str>, i64)>,
    pub recommendations: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub title: &'static str,
    pub description: String,
}

/// Summarizes the last seven calendar days ending at `today`.
pub fn weekly_report(document: &StatsDocument, today: NaiveDate) -> WeeklyReport {
    let week = filter_since(&document.daily_data, today - Duration::days(6));

    let mut total_time = 0;
    let mut productive_time = 0;
    for bucket in week.values() {
        for (domain, &time) in bucket {
            total_time += time;
            if document
                .time_data
                .get(domain)
                .map_or(false, |record| {
                    record.category.kind == crate::classify::CategoryKind::Productive
                })
            {
                productive_time += time;
            }
        }
    }

    let mut top_categories = category_breakdown(&week, &document.time_data)
        .into_iter()
        .collect::<Vec<_>>();
    top_categories.sort_by(|a, b| b.1.cmp(&a.1));
    top_categories.truncate(TOP_CATEGORY_COUNT);

    let score = productivity_score(productive_time, total_time);

    WeeklyReport {
        total_time,
        productive_time,
        productivity_score: score,
        top_categories,
        recommendations: recommendations(score, total_time),
    }
}

/// Rule-based advice keyed off the score and the total. The two standing
/// tips always apply.
pub fn recommendations(score: u32, total_time: i64) -> Vec<&'static str> {
    let mut recommendations = Vec::new();

    if score < 50 {
        recommendations
            .push("Consider using website blockers during work hours to reduce distractions.");
        recommendations.push(
            "Try the Pomodoro Technique: 25 minutes of focused work followed by 5-minute breaks.",
        );
    }

    if total_time > EIGHT_HOURS_MS {
        recommendations.push(
            "Your screen time is quite high. Consider taking regular breaks to rest your eyes.",
        );
    }

    if score >= 70 {
        recommendations.push("Great job maintaining high productivity! Keep up the good work.");
    }

    recommendations.push("Set specific times for checking social media to maintain focus.");
    recommendations.push("Use the dashboard regularly to track your progress and stay motivated.");

    recommendations
}

/// All-time insights. Returns nothing when nothing was tracked yet.
pub fn insights(document: &StatsDocument) -> Vec<Insight> {
    let stats = site_stats(&document.daily_data);
    let total_time: i64 = stats.values().map(|site| site.total_time).sum();
    if total_time == 0 {
        return Vec::new();
    }

    let mut insights = Vec::new();

    let top_site = stats
        .iter()
        .max_by_key(|(_, site)| site.total_time)
        .expect("nonzero total implies at least one site");
    insights.push(Insight {
        title: "Most Visited Site",
        description: format!(
            "You spend the most time on {}, totalling {}.",
            top_site.0,
            super::format_time(top_site.1.total_time)
        ),
    });

    let productive_time: i64 = stats
        .iter()
        .filter(|(domain, _)| {
            document.time_data.get(*domain).map_or(false, |record| {
                record.category.kind == crate::classify::CategoryKind::Productive
            })
        })
        .map(|(_, site)| site.total_time)
        .sum();
    let score = productivity_score(productive_time, total_time);
    let score_message = if score >= 70 {
        "Excellent! You maintain high productivity levels."
    } else if score >= 50 {
        "Good productivity, but there's room for improvement."
    } else {
        "Consider focusing more time on productive activities."
    };
    insights.push(Insight {
        title: "Productivity Analysis",
        description: format!("Your productivity score is {score}%. {score_message}"),
    });

    insights
}
