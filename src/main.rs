mod aggregate;
mod client;
mod config;
mod error;
mod filter;
mod model;
mod response;
mod stats;
mod window;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use octocrab::OctocrabBuilder;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::warn;

use aggregate::collect_records;
use client::{CommentOrder, SearchClient, SearchNode};
use config::TeamMembership;
use filter::ContributionFilter;
use model::{Contribution, Issue, PullRequest};
use stats::{format_duration, summarize, DurationStats};
use window::{LookbackSpec, TimeWindow, WindowConfig};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Team configuration file.
    #[clap(long, default_value = "teams.json")]
    config: PathBuf,
    /// Team whose repositories are evaluated.
    #[clap(long)]
    team: String,
    /// Window reference date (YYYY-MM-DD); defaults to today.
    #[clap(long)]
    reference_date: Option<NaiveDate>,
    /// Lookback span such as 10d, 3w, 2m, 1q or 1y. A leading '-' looks
    /// ahead from the reference date instead of back.
    #[clap(long)]
    lookback: Option<LookbackSpec>,
    /// Truncate the window to complete Monday-aligned weeks.
    #[clap(long)]
    complete_weeks: bool,
    /// Skip private repositories.
    #[clap(long)]
    exclude_private: bool,
    /// Keep archived repositories.
    #[clap(long)]
    include_archived: bool,
    /// Only comments by team members count as responses.
    #[clap(long)]
    team_comments_only: bool,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue metrics.
    Issues {
        #[clap(long, value_enum, default_value_t = Metric::Age)]
        metric: Metric,
        /// List individual records instead of summary statistics.
        #[clap(long)]
        list: bool,
    },
    /// Pull request metrics.
    Pulls {
        #[clap(long, value_enum, default_value_t = Metric::Age)]
        metric: Metric,
        /// List individual records instead of summary statistics.
        #[clap(long)]
        list: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Metric {
    Age,
    FirstResponse,
    Staleness,
    Resolution,
}

impl Metric {
    fn as_str(self) -> &'static str {
        match self {
            Metric::Age => "age",
            Metric::FirstResponse => "first-response",
            Metric::Staleness => "staleness",
            Metric::Resolution => "resolution",
        }
    }

    /// Staleness scans comments newest-first; everything else oldest-first.
    fn comment_order(self) -> CommentOrder {
        match self {
            Metric::Staleness => CommentOrder::Descending,
            _ => CommentOrder::Ascending,
        }
    }

    /// The open/closed sub-queries run sequentially per organization.
    fn state_qualifiers(self) -> &'static [&'static str] {
        match self {
            Metric::Age => &["is:open"],
            Metric::Resolution => &["is:closed"],
            _ => &["is:open", "is:closed"],
        }
    }
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    team: &'a str,
    metric: &'a str,
    window: TimeWindow,
    stats: DurationStats,
}

#[derive(Serialize)]
struct RecordRow {
    number: u64,
    title: String,
    url: String,
    repository: String,
    seconds: i64,
    duration: String,
}

fn derive_duration<C: Contribution>(
    metric: Metric,
    contribution: &C,
    window: TimeWindow,
    filter: &ContributionFilter,
) -> Duration {
    match metric {
        Metric::Age => window.end - contribution.created_at(),
        Metric::FirstResponse => response::first_response_time(contribution, window.end, filter),
        Metric::Staleness => response::latest_response_time(contribution, window.end, filter),
        Metric::Resolution => match contribution.closed_at() {
            Some(closed_at) => closed_at - contribution.created_at(),
            None => window.end - contribution.created_at(),
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_metric<C: SearchNode>(
    client: &SearchClient,
    filter: &ContributionFilter,
    membership: &TeamMembership,
    window: TimeWindow,
    metric: Metric,
    list: bool,
    team: &str,
) -> Result<()> {
    let order = metric.comment_order();
    let mut records: Vec<(C, Duration)> = Vec::new();

    for org in membership.organizations() {
        for state in metric.state_qualifiers() {
            let query = format!(
                "org:{} {} {} created:{}..{}",
                org,
                C::SEARCH_QUALIFIER,
                state,
                window.start.format("%Y-%m-%d"),
                window.end.format("%Y-%m-%d"),
            );
            let fetched = collect_records(
                |cursor| client.search_page::<C>(&query, order, cursor),
                filter,
                |c: &C| derive_duration(metric, c, window, filter),
            )
            .await?;
            records.extend(fetched);
        }
    }

    if records.is_empty() {
        warn!("no matching contributions in the window");
    }

    if list {
        records.sort_by(|a, b| b.1.cmp(&a.1));
        let rows: Vec<RecordRow> = records
            .iter()
            .map(|(c, d)| RecordRow {
                number: c.number(),
                title: c.title().to_string(),
                url: c.url().to_string(),
                repository: format!("{}/{}", c.repository().owner.login, c.repository().name),
                seconds: d.num_seconds(),
                duration: format_duration(d),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let durations: Vec<Duration> = records.iter().map(|(_, d)| *d).collect();
        let stats = summarize(&durations);
        let report = SummaryReport {
            team,
            metric: metric.as_str(),
            window,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::WARN)
        .init();

    let args = Cli::parse();

    let membership = config::load_team(&args.config, &args.team)?;
    let window = WindowConfig {
        reference_date: args.reference_date,
        lookback: args.lookback,
        complete_weeks: args.complete_weeks,
    }
    .resolve(Utc::now())?;

    let gh_token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN must be set")?;
    let gh = OctocrabBuilder::new().personal_token(gh_token).build()?;

    let sty = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
    let pb = ProgressBar::new_spinner();
    pb.set_style(sty);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message("Searching...");

    let client = SearchClient::new(gh, pb.clone());
    let filter = ContributionFilter {
        repositories: membership.repositories.clone(),
        logins: membership.logins.clone(),
        exclude_private: args.exclude_private,
        include_archived: args.include_archived,
        team_comments_only: args.team_comments_only,
    };

    match args.command {
        Commands::Issues { metric, list } => {
            run_metric::<Issue>(
                &client, &filter, &membership, window, metric, list, &args.team,
            )
            .await?
        }
        Commands::Pulls { metric, list } => {
            run_metric::<PullRequest>(
                &client, &filter, &membership, window, metric, list, &args.team,
            )
            .await?
        }
    }

    pb.finish_and_clear();
    Ok(())
}
