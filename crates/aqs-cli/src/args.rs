use std::io::Write;
use std::path::PathBuf;

use aqs_core::{BoundingBox, PlanError, SamplingPlan};
use clap::Parser;

/// Calculates the average PM2.5 readings from stations within an area over a period
#[derive(Parser, Debug)]
#[command(name = "aqs", version)]
pub struct Cli {
    #[arg(allow_negative_numbers = true, help = "Latitude bound 1")]
    pub lat1: f64,
    #[arg(allow_negative_numbers = true, help = "Longitude bound 1")]
    pub lng1: f64,
    #[arg(allow_negative_numbers = true, help = "Latitude bound 2")]
    pub lat2: f64,
    #[arg(allow_negative_numbers = true, help = "Longitude bound 2")]
    pub lng2: f64,
    #[arg(
        default_value_t = 5,
        value_parser = parse_positive,
        help = "Sampling period in minutes"
    )]
    pub period: u32,
    #[arg(
        default_value_t = 1,
        value_parser = parse_rate,
        help = "Sampling rate in samples per minute"
    )]
    pub rate: u32,
    #[arg(long, help = "config file (default: $AQS_CONFIG, then ./config.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "use synthetic stations instead of the WAQI API")]
    pub simulate: bool,
    #[arg(long, help = "print the final report as JSON")]
    pub json: bool,
    #[arg(long, help = "emit logs as JSON lines on stderr")]
    pub json_logs: bool,
}

impl Cli {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.lat1, self.lng1, self.lat2, self.lng2)
    }

    pub fn plan(&self) -> Result<SamplingPlan, PlanError> {
        SamplingPlan::new(self.bbox(), self.period, self.rate)
    }

    /// Where run progress goes. With `--json` stdout carries only the report.
    pub fn progress_writer(&self) -> Box<dyn Write + Send> {
        if self.json {
            Box::new(std::io::stderr())
        } else {
            Box::new(std::io::stdout())
        }
    }
}

/// Highest accepted rate: one concurrent call per pool slot
pub fn max_rate() -> u32 {
    aqs_sampler::default_pool_size() as u32
}

pub fn parse_positive(value: &str) -> Result<u32, String> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a positive integer", value))?;
    if parsed < 1 {
        return Err(format!("'{}' is not a positive integer", value));
    }
    Ok(parsed)
}

pub fn parse_rate(value: &str) -> Result<u32, String> {
    check_rate(parse_positive(value)?, max_rate())
}

pub fn check_rate(rate: u32, ceiling: u32) -> Result<u32, String> {
    if rate > ceiling {
        return Err(format!(
            "{} is too high for your CPU count (max {}). Try a lower rate.",
            rate, ceiling
        ));
    }
    Ok(rate)
}
