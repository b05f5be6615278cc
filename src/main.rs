use anyhow::Result;
use emistage::{process, StagingConfig};
use std::{env, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    if let Err(e) = run() {
        error!("staging failed: {:#}", e);
        eprintln!("staging failed: {:#}", e);
        exit(1);
    }
}

fn run() -> Result<()> {
    // ─── 2) configure dirs ───────────────────────────────────────────
    let cli_config = env::args().nth(1);
    let config = StagingConfig::load(cli_config.as_deref())?;
    info!(raw = %config.raw_dir.display(), out = %config.output_path().display(), "startup");

    // ─── 3) rebuild staging ──────────────────────────────────────────
    let report = process::run_staging(&config)?;
    for s in &report.sources {
        info!(source = %s.source_file, rows = s.rows, "ingested");
    }

    let out = report
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("STAGING generated: {}", out);
    println!("Shape: ({}, {})", report.rows, report.columns);
    Ok(())
}
