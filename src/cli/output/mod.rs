pub mod analysis;
pub mod report;

use ansi_term::Colour;

use crate::classify::CategoryKind;

use self::{
    analysis::{DayPoint, SeriesMetric, Summary},
    report::{Insight, WeeklyReport},
};

/// Human formatting for a span of milliseconds: `2h 5m`, `12m`, `45s`.
pub fn format_time(milliseconds: i64) -> String {
    let total_seconds = milliseconds / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{total_seconds}s")
    }
}

/// Display name for a domain: capitalized, TLD stripped. `github.com`
/// becomes `Github`.
pub fn format_domain(domain: &str) -> String {
    let mut chars = domain.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();
    let rest = rest.split('.').next().unwrap_or(rest);
    format!("{}{}", first.to_uppercase(), rest)
}

fn kind_colour(kind: CategoryKind) -> Option<Colour> {
    match kind {
        CategoryKind::Productive => Some(Colour::Green),
        CategoryKind::Unproductive => Some(Colour::Red),
        CategoryKind::Neutral => None,
    }
}

/// Category label painted by its kind.
pub fn paint_label(kind: CategoryKind, label: &str) -> String {
    match kind_colour(kind) {
        Some(colour) => colour.paint(label).to_string(),
        None => label.to_string(),
    }
}

fn paint_score(score: u32) -> String {
    let text = format!("{score}%");
    let colour = if score >= 70 {
        Colour::Green
    } else if score >= 50 {
        Colour::Yellow
    } else {
        Colour::Red
    };
    colour.paint(text).to_string()
}

pub fn print_summary(summary: &Summary) {
    println!("Total time\t{}", format_time(summary.total_time));
    println!("Productive\t{}", format_time(summary.productive_time));
    println!("Focus sessions\t{}", summary.focus_sessions);
    println!("Score\t\t{}", paint_score(summary.productivity_score));
}

pub struct SiteRow {
    pub domain: String,
    pub time: i64,
    pub share: crate::utils::percentage::Percentage,
    pub kind: CategoryKind,
    pub label: String,
    pub visits: u64,
}

pub fn print_sites(rows: &[SiteRow]) {
    if rows.is_empty() {
        println!("No activity recorded");
        return;
    }
    for row in rows {
        println!(
            "{}\t{}%\t{}\t{}\t{} visits",
            format_time(row.time),
            *row.share as i32,
            paint_label(row.kind, &row.label),
            row.domain,
            row.visits,
        );
    }
}

pub fn print_days(series: &[DayPoint], metric: SeriesMetric) {
    for point in series {
        match metric {
            SeriesMetric::Time => println!("{}\t{}m", point.date.format("%x"), point.value),
            SeriesMetric::Score => println!("{}\t{}%", point.date.format("%x"), point.value),
        }
    }
}

pub fn print_report(report: &WeeklyReport, insights: &[Insight]) {
    println!("Weekly Summary");
    println!("  Total Screen Time\t{}", format_time(report.total_time));
    println!("  Productive Time\t{}", format_time(report.productive_time));
    println!("  Productivity Score\t{}", paint_score(report.productivity_score));

    if !report.top_categories.is_empty() {
        println!();
        println!("Top Categories");
        for (label, time) in &report.top_categories {
            println!("  {label}\t{}", format_time(*time));
        }
    }

    if !insights.is_empty() {
        println!();
        println!("Insights");
        for insight in insights {
            println!("  {}: {}", insight.title, insight.description);
        }
    }

    println!();
    println!("Recommendations");
    for recommendation in &report.recommendations {
        println!("  - {recommendation}");
    }
}

#[cfg(test)]
mod tests {
    use super::{format_domain, format_time};

    #[test]
    fn format_time_picks_the_right_unit() {
        assert_eq!(format_time(45_000), "45s");
        assert_eq!(format_time(0), "0s");
        assert_eq!(format_time(12 * 60_000), "12m");
        assert_eq!(format_time(2 * 3_600_000 + 5 * 60_000), "2h 5m");
        assert_eq!(format_time(3_600_000), "1h 0m");
    }

    #[test]
    fn format_domain_capitalizes_and_strips_tld() {
        assert_eq!(format_domain("github.com"), "Github");
        assert_eq!(format_domain("docs.google.com"), "Docs");
        assert_eq!(format_domain(""), "");
    }
}
