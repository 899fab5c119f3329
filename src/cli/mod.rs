pub mod daemon_path;
pub mod export;
pub mod output;
pub mod process;

use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use clap::{Parser, Subcommand, ValueEnum};
use process::{kill_previous_servers, restart_server};
use tracing::level_filters::LevelFilter;

use crate::{
    browser::socket::DEFAULT_BRIDGE_PORT,
    classify::CategoryKind,
    cli::{
        daemon_path::to_daemon_path,
        output::{
            analysis::{
                daily_series, filter_by_range, filter_since, site_stats, summarize, top_domains,
                SeriesMetric, TimeRange,
            },
            report::{insights, weekly_report},
            print_days, print_report, print_sites, print_summary, SiteRow,
        },
    },
    daemon::{
        start_daemon,
        storage::{
            entities::{DailyUsage, StatsDocument},
            stats_storage::{JsonStatsStorage, StatsStorage},
        },
        DaemonOptions, STATS_FILE_NAME,
    },
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
        percentage::{millis_percentage, Percentage},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tabtime", version, long_about = None)]
#[command(about = "Daemon and CLI for tracking time spent on websites", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryFilter {
    All,
    Productive,
    Unproductive,
    Neutral,
}

impl CategoryFilter {
    fn matches(&self, kind: CategoryKind) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Productive => kind == CategoryKind::Productive,
            CategoryFilter::Unproductive => kind == CategoryKind::Unproductive,
            CategoryFilter::Neutral => kind == CategoryKind::Neutral,
        }
    }
}

impl Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Productive => write!(f, "productive"),
            CategoryFilter::Unproductive => write!(f, "unproductive"),
            CategoryFilter::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts the tracking daemon")]
    Init {},
    #[command(about = "Stop a currently running daemon.")]
    Stop {},
    #[command(
        about = "Run the daemon directly in the current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_BRIDGE_PORT, help = "Loopback port the browser bridge connects to")]
        port: u16,
        #[arg(long = "idle-pause", help = "Stop accumulating time while the user is idle")]
        idle_pause: bool,
    },
    #[command(about = "Display summary statistics for a time range")]
    Stats {
        #[arg(short, long, default_value_t = TimeRange::Today)]
        range: TimeRange,
    },
    #[command(about = "Display the top websites for a time range")]
    Sites {
        #[arg(short, long, default_value_t = TimeRange::Week)]
        range: TimeRange,
        #[arg(
            long,
            help = "Overrides --range with a start date. Examples are \"yesterday\", \"2 days ago\", \"15/03/2025\""
        )]
        since: Option<String>,
        #[arg(short, long, default_value_t = CategoryFilter::All)]
        category: CategoryFilter,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(short = 'p', long = "percentage", help = "Filter sites to have at least specified percentage of tracked time", default_value_t = Percentage::new_opt(0.).unwrap())]
        min_percentage: Percentage,
    },
    #[command(about = "Display a per-day series of tracked minutes or productivity score")]
    Days {
        #[arg(short, long, value_enum, default_value_t = SeriesMetric::Time)]
        metric: SeriesMetric,
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
    #[command(about = "Display the weekly report with insights and recommendations")]
    Report {},
    #[command(about = "Export all tracked data to a JSON file")]
    Export {
        #[arg(long, help = "Output path. Defaults to productivity-data-<date>.json")]
        out: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(
        CLI_PREFIX,
        &create_application_default_path()?,
        logging_level,
        args.log,
    )?;

    match args.commands {
        Commands::Init {} => {
            restart_server()?;
            Ok(())
        }
        Commands::Stop {} => {
            let daemon = to_daemon_path(std::env::current_exe().unwrap());
            kill_previous_servers(&daemon);
            Ok(())
        }
        Commands::Serve {
            dir,
            port,
            idle_pause,
        } => {
            let dir = dir.map_or_else(create_application_default_path, Ok)?;
            start_daemon(dir, DaemonOptions { port, idle_pause }).await?;
            Ok(())
        }
        Commands::Stats { range } => {
            let document = load_document().await?;
            let today = Utc::now().date_naive();
            let buckets = filter_by_range(&document.daily_data, range, today);
            print_summary(&summarize(&buckets, &document.time_data));
            Ok(())
        }
        Commands::Sites {
            range,
            since,
            category,
            limit,
            min_percentage,
        } => {
            let document = load_document().await?;
            let today = Utc::now().date_naive();
            let buckets = match since {
                Some(expression) => {
                    let cutoff = parse_date_string(&expression, Utc::now(), Dialect::Uk)
                        .map_err(|e| anyhow!("Failed to parse start date {expression}: {e}"))?;
                    filter_since(&document.daily_data, cutoff.date_naive())
                }
                None => filter_by_range(&document.daily_data, range, today),
            };
            let rows = site_rows(&document, &buckets, category, limit, min_percentage);
            print_sites(&rows);
            Ok(())
        }
        Commands::Days { metric, days } => {
            let document = load_document().await?;
            let today = Utc::now().date_naive();
            let series = daily_series(
                &document.time_data,
                &document.daily_data,
                metric,
                days,
                today,
            );
            print_days(&series, metric);
            Ok(())
        }
        Commands::Report {} => {
            let document = load_document().await?;
            let today = Utc::now().date_naive();
            print_report(&weekly_report(&document, today), &insights(&document));
            Ok(())
        }
        Commands::Export { out } => {
            let document = load_document().await?;
            let path = export::export_data(&document, out, Utc::now()).await?;
            println!("Exported to {}", path.display());
            Ok(())
        }
    }
}

async fn load_document() -> Result<StatsDocument> {
    let storage =
        JsonStatsStorage::new(create_application_default_path()?.join(STATS_FILE_NAME))?;
    storage.load().await
}

fn site_rows(
    document: &StatsDocument,
    buckets: &BTreeMap<NaiveDate, DailyUsage>,
    category: CategoryFilter,
    limit: usize,
    min_percentage: Percentage,
) -> Vec<SiteRow> {
    let total_time: i64 = site_stats(buckets).values().map(|site| site.total_time).sum();

    top_domains(buckets, usize::MAX)
        .into_iter()
        .filter_map(|(domain, stats)| {
            let record = document.time_data.get(&domain);
            let (kind, label, visits) = match record {
                Some(record) => (
                    record.category.kind,
                    record.category.label.to_string(),
                    record.visits,
                ),
                None => (
                    CategoryKind::Neutral,
                    crate::classify::NEUTRAL_LABEL.to_string(),
                    0,
                ),
            };
            if !category.matches(kind) {
                return None;
            }
            let share = millis_percentage(stats.total_time, total_time);
            if *share < *min_percentage {
                return None;
            }
            Some(SiteRow {
                domain: domain.to_string(),
                time: stats.total_time,
                share,
                kind,
                label,
                visits,
            })
        })
        .take(limit)
        .collect()
}
