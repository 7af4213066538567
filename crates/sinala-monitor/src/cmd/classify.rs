use std::path::PathBuf;

use clap::Args;
use sinala_core::{Thresholds, parse_reading};

use crate::config;
use crate::error::{MonitorError, MonitorResult};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Reading as the sensor publishes it (leading integer, e.g. "750")
    #[arg(allow_hyphen_values = true)]
    ppm: String,
    /// Path to a YAML config file
    #[arg(long, short, env = "SINALA_CONFIG")]
    config: Option<PathBuf>,
}

pub async fn run_classify(args: ClassifyArgs) -> MonitorResult<()> {
    let config = config::load(args.config.as_deref()).await?;
    println!("{}", describe(&config.thresholds, &args.ppm)?);
    Ok(())
}

fn describe(thresholds: &Thresholds, payload: &str) -> MonitorResult<String> {
    let reading =
        parse_reading(payload).ok_or_else(|| MonitorError::InvalidReading(payload.to_string()))?;
    let assessment = thresholds.assess(reading);
    Ok(format!(
        "{reading}: {} ({})",
        assessment.tier, assessment.advisory
    ))
}
