use anyhow::Result;
use emistage::{report, StagingConfig};
use std::{env, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    if let Err(e) = run() {
        error!("insights failed: {:#}", e);
        eprintln!("insights failed: {:#}", e);
        exit(1);
    }
}

fn run() -> Result<()> {
    let cli_config = env::args().nth(1);
    let config = StagingConfig::load(cli_config.as_deref())?;
    let summary = report::run_insights(&config)?;

    println!("=== Analytics: Insights (STAGING) ===");
    println!("Input:  {}", config.output_path().display());
    println!("Shape:  ({}, {})", summary.rows, summary.columns);
    println!("Tables: {}", config.tables_dir().display());
    println!();
    match (summary.first_year, summary.last_year) {
        (Some(a), Some(b)) => println!("- Years covered: {}–{}", a, b),
        _ => println!("- Years covered: N/A"),
    }
    println!(
        "- #1 region (cumulative): {}",
        summary.top_region.as_deref().unwrap_or("N/A")
    );
    println!(
        "- #1 pollutant (cumulative): {}",
        summary.top_contaminant.as_deref().unwrap_or("N/A")
    );
    println!(
        "- Top 5% emitters share ({}): {:.2}%",
        summary.group_key.field().name(),
        summary.share_top * 100.0
    );
    Ok(())
}
