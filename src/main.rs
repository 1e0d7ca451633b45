use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use portfolio_analytics::config::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_MS};
use portfolio_analytics::pipeline::read_fixture_sources;
use portfolio_analytics::report;
use portfolio_analytics::{
    build_dashboard, load_dashboard, AnalyticsClient, ApiConfig, CanonicalDashboardModel,
    DateWindow, LoadedDashboard,
};

#[derive(Parser)]
#[command(name = "portfolio-analytics")]
#[command(about = "Analytics aggregation and insight pipeline for the portfolio dashboard", long_about = None)]
struct Cli {
    /// Base URL of the analytics API
    #[arg(long, global = true, env = "ANALYTICS_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "ANALYTICS_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct WindowArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, requires = "end", conflicts_with = "days")]
    start: Option<NaiveDate>,
    /// Last day of the window (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,
    /// Number of days ending yesterday
    #[arg(long, default_value_t = 7)]
    days: i64,
}

impl WindowArgs {
    fn resolve(&self, today: NaiveDate) -> anyhow::Result<DateWindow> {
        let window = match (self.start, self.end) {
            (Some(start), Some(end)) => DateWindow::new(start, end)?,
            _ => DateWindow::trailing(self.days, today)?,
        };
        Ok(window)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs, trends, health score and findings
    Dashboard {
        #[command(flatten)]
        window: WindowArgs,
        /// Print the full model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the daily metric series as CSV
    Export {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "daily_metrics.csv")]
        out: PathBuf,
    },
    /// Build the model from saved payload files instead of the API
    Replay {
        #[arg(long)]
        dir: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
    },
}

async fn load(config: &ApiConfig, window: &DateWindow) -> anyhow::Result<LoadedDashboard> {
    let client = AnalyticsClient::new(config).context("failed to set up analytics client")?;
    Ok(load_dashboard(&client, window).await)
}

fn print_summary(loaded: &LoadedDashboard) {
    let model: &CanonicalDashboardModel = &loaded.model;
    let overview = &model.overview;

    println!("Dashboard for {} (vs {}):", model.window, model.previous_window);
    println!("- Health score {}/100", model.health.value());
    println!(
        "- Visitors {} ({} {}%)",
        overview.unique_visitors,
        model.trends.visitors.direction.as_str(),
        model.trends.visitors.change
    );
    println!(
        "- Sessions {} ({} {}%)",
        overview.sessions,
        model.trends.sessions.direction.as_str(),
        model.trends.sessions.change
    );
    println!(
        "- Engagement {:.1}% ({} {}%), bounce {:.1}%",
        overview.engagement_rate,
        model.trends.engagement.direction.as_str(),
        model.trends.engagement.change,
        overview.bounce_rate
    );
    println!(
        "- Conversions {} ({} {}%), resume downloads {}",
        overview.conversions,
        model.trends.conversions.direction.as_str(),
        model.trends.conversions.change,
        overview.resume_downloads
    );

    let alerts: Vec<_> = model.alerts().collect();
    if alerts.is_empty() {
        println!("No alerts.");
    } else {
        println!("Alerts:");
        for alert in alerts {
            println!("- [{}] {}: {}", alert.severity.as_str(), alert.title, alert.description);
        }
    }

    println!("Insights:");
    for insight in model.insights() {
        println!(
            "- [{}] {}: {}",
            insight.severity.as_str(),
            insight.title,
            insight.description
        );
    }

    if loaded.is_partial() {
        println!("Partial data:");
        for (name, outcome) in loaded.current.failures().chain(loaded.previous.failures()) {
            println!("- {name}: {outcome}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ApiConfig::new(cli.api_base, cli.timeout_ms);
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Dashboard { window, json } => {
            let window = window.resolve(today)?;
            let loaded = load(&config, &window).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded)?);
            } else {
                print_summary(&loaded);
            }
        }
        Commands::Report { window, out } => {
            let window = window.resolve(today)?;
            let loaded = load(&config, &window).await?;
            let report = report::build_report(&loaded.model, Some(&loaded.current));
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { window, out } => {
            let window = window.resolve(today)?;
            let loaded = load(&config, &window).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let rows = report::write_daily_csv(file, &loaded.model.daily)?;
            println!("Exported {rows} days to {}.", out.display());
        }
        Commands::Replay { dir, window } => {
            let window = window.resolve(today)?;
            let (current, previous) = read_fixture_sources(&dir)?;
            let model = build_dashboard(&window, &current, &previous);
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
    }

    Ok(())
}
