//! # Revenue Report
//!
//! Prints the finance dashboard for a set of payment rows as JSON.
//!
//! ## Usage
//! ```bash
//! # Dashboard for the last 12 months, using the platform config file
//! cargo run -p wayline-dispatch --bin revenue-report -- --payments ./payments.json
//!
//! # Explicit config, 6 months, reproducible "now"
//! cargo run -p wayline-dispatch --bin revenue-report -- \
//!     --config ./dispatch.toml --payments ./payments.json \
//!     --months 6 --now 2026-02-15T12:00:00Z
//! ```
//!
//! ## Input
//! A JSON array of payment rows:
//! ```json
//! [
//!   { "amount_total_cents": 13750, "status": "paid",
//!     "paid_at": "2026-02-01T07:10:00Z", "updated_at": "2026-02-01T07:10:00Z" }
//! ]
//! ```

use chrono::{DateTime, Utc};
use std::env;
use std::path::PathBuf;
use tracing::info;
use wayline_core::{PaymentRecord, DEFAULT_TRAILING_MONTHS};
use wayline_dispatch::telemetry::init_tracing;
use wayline_dispatch::{DispatchConfig, RevenueReports};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut payments_path: Option<PathBuf> = None;
    let mut months = DEFAULT_TRAILING_MONTHS;
    let mut now: DateTime<Utc> = Utc::now();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--payments" | "-p" => {
                if i + 1 < args.len() {
                    payments_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(DEFAULT_TRAILING_MONTHS);
                    i += 1;
                }
            }
            "--now" => {
                if i + 1 < args.len() {
                    now = DateTime::parse_from_rfc3339(&args[i + 1])?.with_timezone(&Utc);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(payments_path) = payments_path else {
        print_usage();
        return Err("--payments is required".into());
    };

    let config = DispatchConfig::load(config_path)?;
    let contents = std::fs::read_to_string(&payments_path)?;
    let payments: Vec<PaymentRecord> = serde_json::from_str(&contents)?;

    info!(
        payments = payments.len(),
        months,
        offset = config.business.utc_offset_minutes,
        "Building revenue report"
    );

    let report = RevenueReports::from_config(&config).build(&payments, now, months);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn print_usage() {
    println!("Wayline Revenue Report");
    println!();
    println!("Usage: revenue-report --payments <PATH> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -p, --payments <PATH>  JSON array of payment rows (required)");
    println!("  -c, --config <PATH>    dispatch.toml (default: platform config dir)");
    println!("  -m, --months <N>       Trailing months to include (default: 12)");
    println!("      --now <RFC3339>    Report as of this instant (default: current time)");
    println!("  -h, --help             Show this help message");
}
