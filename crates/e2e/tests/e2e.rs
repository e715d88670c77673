//! E2E harness entry point
//!
//! This file is the test binary that drives the suites against the remote
//! store. Run with: cargo test --package toolshop-e2e --test e2e

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolshop_common::RunConfig;
use toolshop_e2e::target::Target;
use toolshop_e2e::{E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "toolshop-e2e")]
#[command(about = "E2E and API suite runner for the Toolshop demo store")]
struct Args {
    /// Path to a run configuration file
    #[arg(short, long, default_value = "toolshop.toml")]
    config: PathBuf,

    /// UI origin override
    #[arg(long, env = "TOOLSHOP_UI_URL")]
    ui_url: Option<String>,

    /// API origin override
    #[arg(long, env = "TOOLSHOP_API_URL")]
    api_url: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<String>,

    /// Run headed instead of headless
    #[arg(long)]
    headed: bool,

    /// Scenario worker count override
    #[arg(long)]
    workers: Option<usize>,

    /// Retry count override
    #[arg(long)]
    retries: Option<u32>,

    /// Adopt current screenshots as visual baselines after the run
    #[arg(long)]
    update_baselines: bool,

    /// Skip the readiness probe
    #[arg(long)]
    no_readiness_check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut config = RunConfig::load(&args.config)?;
    config.apply_env_overrides();

    if let Some(url) = args.ui_url {
        config.ui_base_url = url;
    }
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(browser) = args.browser {
        config.browser = browser;
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }

    if !args.no_readiness_check {
        let target = Target::new(&config)?;
        target.wait_until_ready(Duration::from_secs(30)).await?;
    }

    let global_timeout = Duration::from_millis(config.global_timeout_ms);
    let runner = TestRunner::new(config);

    let report = tokio::time::timeout(global_timeout, runner.run_all())
        .await
        .map_err(|_| {
            toolshop_e2e::E2eError::Timeout(format!(
                "run exceeded {} ms",
                global_timeout.as_millis()
            ))
        })??;

    if args.update_baselines {
        runner.update_baselines()?;
    }

    runner.write_report(&report)?;

    Ok(report.failed == 0)
}
