//! CSV-based tax table loader
//!
//! Loads bracket tables and payroll contributions from data/tax/

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{PayrollContribution, TaxSchedule, TaxTable};
use crate::error::{Result, SimError};

/// Default path to the tax tables directory
pub const DEFAULT_TAX_PATH: &str = "data/tax";

/// Bracket tables stacked into the default schedule, in order
pub const DEFAULT_TABLE_FILES: [&str; 2] = ["federal.csv", "ontario.csv"];

/// Payroll contributions file inside the tax directory
pub const PAYROLL_FILE: &str = "payroll.csv";

#[derive(Debug, Deserialize)]
struct BracketRow {
    threshold: f64,
    rate: f64,
}

/// Load a bracket table from any reader with a `threshold,rate` header
pub fn load_tax_table_from_reader<R: Read>(reader: R) -> Result<TaxTable> {
    let mut reader = csv::Reader::from_reader(reader);

    let mut thresholds = Vec::new();
    let mut rates = Vec::new();

    for result in reader.deserialize() {
        let row: BracketRow = result?;
        thresholds.push(row.threshold);
        rates.push(row.rate);
    }

    TaxTable::new(thresholds, rates)
}

/// Load a bracket table from a CSV file
pub fn load_tax_table(path: &Path) -> Result<TaxTable> {
    let file = File::open(path)?;
    load_tax_table_from_reader(file)
}

/// Load payroll contributions from any reader with a
/// `name,rate,exemption,max_earnings` header
pub fn load_payroll_from_reader<R: Read>(reader: R) -> Result<Vec<PayrollContribution>> {
    let mut reader = csv::Reader::from_reader(reader);

    let mut contributions = Vec::new();
    for result in reader.deserialize() {
        let contribution: PayrollContribution = result?;
        if contribution.rate < 0.0 || contribution.max_earnings < contribution.exemption {
            return Err(SimError::config(format!(
                "payroll contribution {} has an invalid rate or earnings range",
                contribution.name
            )));
        }
        contributions.push(contribution);
    }

    Ok(contributions)
}

/// Load the full schedule from a tax directory
///
/// Every file in [`DEFAULT_TABLE_FILES`] must exist. The payroll file is optional.
pub fn load_schedule(dir: &Path) -> Result<TaxSchedule> {
    let tables = DEFAULT_TABLE_FILES
        .iter()
        .map(|name| load_tax_table(&dir.join(name)))
        .collect::<Result<Vec<_>>>()?;

    let payroll_path = dir.join(PAYROLL_FILE);
    let payroll = if payroll_path.exists() {
        load_payroll_from_reader(File::open(payroll_path)?)?
    } else {
        log::warn!("no {} in {}, payroll deductions disabled", PAYROLL_FILE, dir.display());
        Vec::new()
    };

    TaxSchedule::new(tables, payroll)
}

impl TaxSchedule {
    /// Load the schedule from the default location (data/tax/)
    pub fn from_csv() -> Result<Self> {
        load_schedule(Path::new(DEFAULT_TAX_PATH))
    }

    pub fn from_csv_path(dir: &Path) -> Result<Self> {
        load_schedule(dir)
    }
}
