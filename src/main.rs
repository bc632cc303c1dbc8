use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod detect;
mod error;
#[cfg(test)]
mod fixtures;
mod filter;
mod insights;
mod metrics;
mod models;
mod report;
mod store;

use insights::Insights;
use models::FilterCriteria;
use store::EventStore;

#[derive(Parser)]
#[command(name = "engagement-insights")]
#[command(about = "Engagement, ROI and suspicious-activity insights over social media posts", long_about = None)]
struct Cli {
    /// CSV export of post engagement
    #[arg(long, env = "ENGAGEMENT_CSV", global = true, default_value = "engagement.csv")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Keep only these platforms (repeatable)
    #[arg(long = "platform")]
    platforms: Vec<String>,
    /// Keep only these content types (repeatable)
    #[arg(long = "content-type")]
    content_types: Vec<String>,
    /// Keep only these years (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        FilterCriteria {
            platforms: args.platforms.into_iter().collect(),
            content_types: args.content_types.into_iter().collect(),
            years: args.years.into_iter().collect(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Headline numbers and best platform/hour
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Suspicious-activity risk and promotion candidates
    Detect {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write every tab as JSON
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "insights.json")]
        out: PathBuf,
    },
}

const DEFAULT_LOG: &str = "engagement_insights=info";

/// `RUST_LOG` when set and valid, otherwise info for this crate.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let store = EventStore::load(&cli.data)
        .with_context(|| format!("failed to load events from {}", cli.data.display()))?;
    if store.is_empty() {
        tracing::warn!(path = %cli.data.display(), "event table has no rows");
    }

    match cli.command {
        Commands::Summary { filter } => {
            let insights = Insights::compute(&store.snapshot(), &FilterCriteria::from(filter));
            if insights.is_empty() {
                println!("No posts match this filter.");
                return Ok(());
            }

            let overview = &insights.overview;
            println!("Posts: {} of {}", overview.posts, store.len());
            println!("Total engagement: {:.0}", overview.total_engagement);
            match overview.avg_engagement_rate {
                Some(rate) => println!("Avg engagement rate: {rate:.2}%"),
                None => println!("Avg engagement rate: n/a"),
            }
            println!("Ad spend: {:.2}", overview.total_ad_spend);
            println!("Revenue: {:.2}", overview.total_revenue);
            if let Some(roi) = overview.avg_roi {
                println!("Avg ROI: {roi:.2}");
            }
            println!(
                "Best platform: {}",
                insights.best_platform.as_deref().unwrap_or("undefined")
            );
            match insights.best_hour {
                Some(hour) => println!("Best time to post: {hour}:00"),
                None => println!("Best time to post: undefined"),
            }
        }
        Commands::Detect { filter, limit } => {
            let insights = Insights::compute(&store.snapshot(), &FilterCriteria::from(filter));
            let fraud = &insights.suspicious;
            if !fraud.has_data() {
                println!("No posts match this filter.");
                return Ok(());
            }

            println!(
                "Suspicious posts: {} of {} ({:.1}%), risk {}",
                fraud.suspicious_count, fraud.total_count, fraud.ratio_pct, fraud.risk_level
            );
            if let Some(slot) = &fraud.recommended_slot {
                println!(
                    "Safest posting slot: {} {}:00 ({} clean posts)",
                    slot.key.day_of_week, slot.key.post_hour, slot.count
                );
            }

            if insights.high_impact.segments.is_empty() {
                println!("No high-impact content detected.");
            } else {
                println!("Top promotion candidates:");
                for segment in insights.high_impact.segments.iter().take(limit) {
                    println!(
                        "- {} on {}: {} high-impact posts",
                        segment.key.content_type, segment.key.platform, segment.count
                    );
                }
            }
        }
        Commands::Report { filter, out } => {
            let insights = Insights::compute(&store.snapshot(), &FilterCriteria::from(filter));
            std::fs::write(&out, report::render(&insights))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { filter, out } => {
            let insights = Insights::compute(&store.snapshot(), &FilterCriteria::from(filter));
            let json = serde_json::to_string_pretty(&insights)?;
            std::fs::write(&out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Insights written to {}.", out.display());
        }
    }

    Ok(())
}
