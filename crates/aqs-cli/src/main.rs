use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use aqs_cli::{execute, report, Cli};
use aqs_config::AppConfig;
use aqs_ingest::{Fetcher, SimulatedFetcher, WaqiClient};
use aqs_sampler::{default_pool_size, SampleError, SamplerError, Scheduler};

const EXIT_SAMPLE_FAILURE: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    aqs_obs::init("aqs", cli.json_logs);

    match try_main(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let plan = cli.plan()?;

    let fetcher: Arc<dyn Fetcher> = if cli.simulate {
        Arc::new(SimulatedFetcher::default())
    } else {
        let token = config.api_token()?;
        let client = match config.base_url() {
            Some(base) => WaqiClient::with_base_url(base, token, config.timeout()),
            None => WaqiClient::new(token, config.timeout()),
        }
        .context("Failed to build WAQI client")?;
        Arc::new(client)
    };
    info!("Using {} fetcher", fetcher.name());

    let pool_size = config.pool_size().unwrap_or_else(default_pool_size).max(1);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(pool_size)
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let scheduler = Scheduler::new(plan, fetcher)
        .with_pool_size(pool_size)
        .with_window(config.window());
    let execution = runtime.block_on(execute(
        scheduler,
        cli.progress_writer(),
        shutdown_signal(),
    ))?;

    match execution.result {
        Ok(completed) => {
            print!("{}", report::render_final(&plan, &completed.report, cli.json)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(SamplerError::Interrupted) => {
            eprintln!("Interrupted, no average computed.");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Err(SamplerError::Sample(e)) => {
            error!("Run aborted: {}", e);
            eprintln!("{}", failure_message(&e));
            Ok(ExitCode::from(EXIT_SAMPLE_FAILURE))
        }
        Err(e) => Err(e.into()),
    }
}

fn failure_message(e: &SampleError) -> String {
    match e {
        SampleError::Quota(_) => {
            "API request quota exhausted. Wait for it to reset or lower the rate.".to_string()
        }
        SampleError::InvalidKey(_) => {
            "The WAQI API token was rejected. Check api_keys.air_quality or WAQI_TOKEN.".to_string()
        }
        SampleError::Protocol(msg) => format!("Sampling failed: {}", msg),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
