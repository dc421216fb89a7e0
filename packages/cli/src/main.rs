#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for harvesting merchant portal reports.
//!
//! Runs one store per invocation. The whole run is planned before the
//! browser starts, so a bad store name or date preset exits without
//! touching the portal.
//!
//! Uses `indicatif-log-bridge` (via [`report_harvest_cli_utils::init_logger`])
//! so that log lines and the download progress bar share the terminal.

mod profile;

use std::path::PathBuf;

use clap::Parser;
use report_harvest::layout::{OutputLayout, sanitize_filename};
use report_harvest::{Catalog, DownloadOrchestrator, SystemClock};
use report_harvest_cli_utils::IndicatifProgress;
use report_harvest_models::{AttemptOutcome, RunReport};
use report_harvest_portal::BrowserSession as _;
use report_harvest_portal::webdriver::{SessionConfig, WebDriverSession};
use report_harvest_tabular::xlsx::XlsxIo;

/// Exit status for an unknown store name.
const EXIT_UNKNOWN_STORE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "report_harvest",
    about = "Download, convert and summarize merchant portal reports for one store"
)]
struct Cli {
    /// Store name exactly as listed in `stores.toml`
    store: String,
    /// Open the portal home page with this store's profile and wait for a
    /// manual login
    #[arg(long, conflicts_with = "check_profile")]
    login: bool,
    /// Open the portal home page briefly to confirm which account the
    /// profile is logged into
    #[arg(long)]
    check_profile: bool,
    /// Directory containing `presets.toml`, `reports.toml` and `stores.toml`
    /// (defaults to the built-in catalog)
    #[arg(long)]
    catalog_dir: Option<PathBuf>,
    /// Root of the reports tree
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,
    /// Root of the per-store browser profiles
    #[arg(long, default_value = "user_data")]
    profile_dir: PathBuf,
    /// WebDriver endpoint (e.g., a running `chromedriver`)
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver_url: String,
    /// Run the browser without a window
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = report_harvest_cli_utils::init_logger();
    let cli = Cli::parse();

    let catalog = match &cli.catalog_dir {
        Some(dir) => Catalog::from_dir(dir)?,
        None => Catalog::embedded()?,
    };

    let store = match catalog.store(&cli.store) {
        Ok(store) => store.clone(),
        Err(e) => {
            log::error!("{e}");
            eprintln!("Available stores:");
            for name in catalog.store_names() {
                eprintln!("  {name}");
            }
            std::process::exit(EXIT_UNKNOWN_STORE);
        }
    };

    let session_config = SessionConfig::new(
        &cli.webdriver_url,
        cli.profile_dir.join(sanitize_filename(&store.name)),
    )
    .with_headless(cli.headless);

    if cli.login {
        return profile::login(&catalog.portal().home_url, &session_config).await;
    }
    if cli.check_profile {
        return profile::check(&catalog.portal().home_url, &session_config).await;
    }

    let orchestrator = DownloadOrchestrator::new(
        &catalog,
        OutputLayout::new(&cli.reports_dir),
        SystemClock,
        XlsxIo,
    )
    .with_progress(IndicatifProgress::downloads_bar(&multi, &store.name));

    let plan = orchestrator.plan(&store.name)?;

    let mut session = WebDriverSession::connect(&session_config).await?;
    let report = orchestrator.execute(&mut session, &plan).await;
    if let Err(e) = session.close().await {
        log::warn!("Failed to close browser: {e}");
    }

    log_summary(&report);

    Ok(())
}

fn log_summary(report: &RunReport) {
    for failure in report.failures() {
        if let AttemptOutcome::Failed { meta, stage, reason } = failure {
            log::warn!("  failed: {meta} ({stage}): {reason}");
        }
    }
    for summary in &report.summaries {
        log::info!("  summary: {}", summary.path.display());
    }
    for failure in &report.summary_failures {
        log::warn!("  no summary for {}: {}", failure.report_key, failure.reason);
    }
    log::info!(
        "{}: {} downloaded, {} failed, {} summaries",
        report.store_name,
        report.succeeded(),
        report.failed(),
        report.summaries.len()
    );
}
