use anyhow::{Context, Result};
use clap::Parser;
use pagestats::config::ReportConfig;
use pagestats::report::{render_report, request_report, ClientError, ReportInput, StatsClient};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagestats-report")]
#[command(about = "Page statistics report for a date range", long_about = None)]
struct Cli {
    /// Page path to report on, e.g. /blog/my-post/
    #[arg(long)]
    page_url: Option<String>,
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
    /// Site id; defaults to REPORT_SITE_ID
    #[arg(long)]
    site_id: Option<String>,
    /// Stats server URL; defaults to REPORT_SERVER_URL
    #[arg(long)]
    server: Option<String>,
    /// Print the raw JSON report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ReportConfig::from_env();

    let server_url = cli.server.unwrap_or(config.server_url);
    let client = StatsClient::new(&server_url, Duration::from_secs(config.timeout_secs))
        .context("failed to build stats client")?;

    let input = ReportInput {
        site_id: cli.site_id.or(Some(config.site_id)),
        page_url: cli.page_url,
        start_date: cli.start_date,
        end_date: cli.end_date,
    };

    match request_report(&client, input).await {
        Ok((request, report)) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&request, &report));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ ClientError::MissingFields(_)) => {
            eprintln!("⚠ {e}");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            eprintln!("✗ Error fetching data: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
