//! # Sweet Gossip
//!
//! Runs one configured scenario and prints its summary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `SG_*` environment variables
//! 2. Install logging
//! 3. Validate configuration
//! 4. Build and run the network
//! 5. Print the summary (JSON when `SG_LOG_JSON` is set)

use anyhow::{Context, Result};
use node_runtime::{RuntimeConfig, ScenarioOutcome};
use sg_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("reading SG_* environment")?;
    init_tracing(&config.telemetry).context("installing the log subscriber")?;

    info!("===========================================");
    info!("  Sweet Gossip simulation starting");
    info!("===========================================");
    info!(
        nodes = config.simulation.nodes.len(),
        pow_complexity = config.protocol.pow_complexity,
        flood_bound = config.protocol.flood_bound,
        run_until = config.simulation.run_until,
        "configuration loaded"
    );

    config.validate().context("validating configuration")?;
    let outcome = node_runtime::run(&config).context("running the scenario")?;

    if config.telemetry.json_logs {
        let summary = serde_json::to_string_pretty(&outcome).context("encoding the summary")?;
        println!("{summary}");
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn print_summary(outcome: &ScenarioOutcome) {
    println!("request      {}", outcome.request_id.as_deref().unwrap_or("-"));
    println!("responses    {}", outcome.responses);
    match &outcome.paid_invoice {
        Some(invoice) => println!("paid         {invoice} ({:?})", outcome.paid_invoice_state),
        None => println!("paid         -"),
    }
    for (kind, count) in &outcome.frames {
        println!("  {kind:<28} {count}");
    }
    println!(
        "delivered    {} messages in {} steps, finished at {}",
        outcome.report.messages_delivered, outcome.report.steps, outcome.report.finished_at
    );
    match &outcome.message {
        Some(message) => println!("reply        {message}"),
        None => println!("reply        (none)"),
    }
}
