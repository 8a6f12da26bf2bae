//! Household Sim CLI
//!
//! Runs one scenario and prints the year-end balances

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use household_sim::config::DEFAULT_SCENARIO_PATH;
use household_sim::tax::DEFAULT_TAX_PATH;
use household_sim::{ScenarioConfig, ScenarioRunner, TaxSchedule};
use std::fs::File;
use std::path::PathBuf;

/// Simulate a household's finances year by year
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Scenario JSON file
    #[arg(default_value = DEFAULT_SCENARIO_PATH)]
    scenario: PathBuf,

    /// Use the built-in example scenario instead of a file
    #[arg(long)]
    example: bool,

    /// Directory holding the tax bracket and payroll CSV files
    #[arg(long, default_value = DEFAULT_TAX_PATH)]
    tax_dir: PathBuf,

    /// Use the built-in federal + Ontario tables instead of loading CSV files
    #[arg(long)]
    builtin_tax: bool,

    /// Number of years to simulate (overrides the scenario)
    #[arg(short, long)]
    years: Option<u32>,

    /// First simulated year when the scenario has none (defaults to this year)
    #[arg(long)]
    start_year: Option<i32>,

    /// Write the year-end balances to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the per-person allocations to this CSV file
    #[arg(long)]
    contributions: Option<PathBuf>,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = if cli.example {
        ScenarioConfig::example()
    } else {
        ScenarioConfig::from_path(&cli.scenario)
            .with_context(|| format!("Failed to load scenario {}", cli.scenario.display()))?
    };
    if let Some(years) = cli.years {
        config.years = years;
    }

    let runner = if cli.builtin_tax {
        ScenarioRunner::with_tax(TaxSchedule::default_ontario())
    } else {
        ScenarioRunner::from_csv_path(&cli.tax_dir)
            .with_context(|| format!("Failed to load tax tables from {}", cli.tax_dir.display()))?
    };

    let default_start_year = cli.start_year.unwrap_or_else(|| Local::now().year());
    let result = runner
        .run(&config, default_start_year)
        .with_context(|| format!("Simulation of '{}' failed", config.name))?;
    let summary = result.summary();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Household Sim v{}", env!("CARGO_PKG_VERSION"));
        println!("==================\n");
        println!("Scenario: {}", config.name);
        println!("  Persons: {}", config.persons.len());
        println!("  Years:   {} from {}", summary.years, result.start_year);
        println!();

        println!(
            "{:>5} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "Year", "Emergency", "TFSA", "RRSP", "Taxable", "Equity", "Principal", "Total"
        );
        println!("{}", "-".repeat(98));
        for row in &result.history.years {
            println!(
                "{:>5} {:>12.0} {:>12.0} {:>12.0} {:>12.0} {:>12.0} {:>12.0} {:>14.0}",
                row.year,
                row.emergency_fund,
                row.tax_free,
                row.tax_deferred,
                row.taxable,
                row.mortgage_equity,
                row.mortgage_principal,
                row.total
            );
        }

        println!();
        println!("Summary:");
        println!("  Final total:        ${:.2}", summary.final_total);
        println!("  Income tax paid:    ${:.2}", summary.total_income_tax);
        println!("  Drawn from savings: ${:.2}", summary.total_withdrawn);
        match (summary.mortgage_purchase_year, summary.mortgage_paid_off_year) {
            (Some(bought), Some(repaid)) => println!("  House bought {bought}, repaid {repaid}"),
            (Some(bought), None) => println!("  House bought {bought}, not yet repaid"),
            (None, _) if config.mortgage.is_some() => println!("  House never bought"),
            _ => {}
        }
    }

    if let Some(path) = &cli.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        result.history.write_years_csv(file)?;
        println!("\nBalances written to {}", path.display());
    }
    if let Some(path) = &cli.contributions {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        result.history.write_contributions_csv(file)?;
        println!("Allocations written to {}", path.display());
    }

    Ok(())
}
