//! Sweep the retirement contribution share across a scenario
//!
//! Runs the same household once per share in parallel and reports where each ends up.
//! Supports JSON output via --json

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use household_sim::config::DEFAULT_SCENARIO_PATH;
use household_sim::{ScenarioConfig, ScenarioRunner, SimulationSummary};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about = "Compare outcomes across retirement contribution shares")]
struct Cli {
    /// Scenario JSON file
    #[arg(default_value = DEFAULT_SCENARIO_PATH)]
    scenario: PathBuf,

    /// Lowest share of after-tax income put toward retirement
    #[arg(long, default_value_t = 0.0)]
    min_share: f64,

    /// Highest share of after-tax income put toward retirement
    #[arg(long, default_value_t = 0.30)]
    max_share: f64,

    /// Number of shares to try, evenly spaced
    #[arg(long, default_value_t = 7)]
    steps: usize,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SweepRow {
    retirement_share: f64,
    summary: Option<SimulationSummary>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SweepResponse {
    scenario: String,
    rows: Vec<SweepRow>,
    execution_time_ms: u64,
}

fn share_at(cli: &Cli, i: usize) -> f64 {
    if cli.steps <= 1 {
        return cli.min_share;
    }
    cli.min_share + (cli.max_share - cli.min_share) * i as f64 / (cli.steps - 1) as f64
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let base = ScenarioConfig::from_path(&cli.scenario)
        .with_context(|| format!("Failed to load scenario {}", cli.scenario.display()))?;
    let runner = ScenarioRunner::from_csv().context("Failed to load tax tables")?;

    let results = runner.run_variations(&base, Local::now().year(), cli.steps, |i, config| {
        let share = share_at(&cli, i);
        for person in &mut config.persons {
            person.settings.max_retirement_contribution = share;
        }
    });

    let rows: Vec<SweepRow> = results
        .into_iter()
        .enumerate()
        .map(|(i, result)| {
            let retirement_share = share_at(&cli, i);
            match result {
                Ok(result) => SweepRow {
                    retirement_share,
                    summary: Some(result.summary()),
                    error: None,
                },
                Err(e) => SweepRow {
                    retirement_share,
                    summary: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    let elapsed = start.elapsed();

    if cli.json {
        let response = SweepResponse {
            scenario: base.name.clone(),
            rows,
            execution_time_ms: elapsed.as_millis() as u64,
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    println!("Retirement share sweep: {}", base.name);
    println!("{}", "=".repeat(80));
    println!(
        "{:>7} {:>14} {:>12} {:>12} {:>12} {:>8} {:>8}",
        "Share", "Final total", "TFSA", "RRSP", "Taxable", "Bought", "Repaid"
    );
    println!("{}", "-".repeat(80));

    let year = |y: Option<i32>| y.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
    for row in &rows {
        match (&row.summary, &row.error) {
            (Some(s), _) => println!(
                "{:>6.1}% {:>14.0} {:>12.0} {:>12.0} {:>12.0} {:>8} {:>8}",
                row.retirement_share * 100.0,
                s.final_total,
                s.final_tax_free,
                s.final_tax_deferred,
                s.final_taxable,
                year(s.mortgage_purchase_year),
                year(s.mortgage_paid_off_year)
            ),
            (None, Some(e)) => println!("{:>6.1}% failed: {}", row.retirement_share * 100.0, e),
            (None, None) => {}
        }
    }

    println!("\nCompleted {} runs in {:.2?}", rows.len(), elapsed);
    Ok(())
}
