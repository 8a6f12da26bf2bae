//! Combined tax schedule: stacked bracket tables plus payroll contributions

use serde::{Deserialize, Serialize};

use super::{PayrollContribution, TaxTable};
use crate::error::{Result, SimError};

/// All levies applied to a person's income in a year
///
/// Income tax is the sum of every bracket table (e.g. federal + provincial). Payroll
/// contributions only apply to employment income and are kept separate so that
/// investment income and tax-deferred deductions do not interact with them.
///
/// The top rates of the stacked tables must sum to less than 1, otherwise extra income
/// could lower after-tax income and the before-tax solver would not converge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxSchedule")]
pub struct TaxSchedule {
    tables: Vec<TaxTable>,
    payroll: Vec<PayrollContribution>,
}

#[derive(Deserialize)]
struct RawTaxSchedule {
    tables: Vec<TaxTable>,
    #[serde(default)]
    payroll: Vec<PayrollContribution>,
}

impl TryFrom<RawTaxSchedule> for TaxSchedule {
    type Error = SimError;

    fn try_from(raw: RawTaxSchedule) -> Result<Self> {
        Self::new(raw.tables, raw.payroll)
    }
}

impl TaxSchedule {
    pub fn new(tables: Vec<TaxTable>, payroll: Vec<PayrollContribution>) -> Result<Self> {
        let combined: f64 = tables.iter().map(TaxTable::top_rate).sum();
        if combined >= 1.0 {
            return Err(SimError::config(format!(
                "combined top tax rate {combined} must be below 1"
            )));
        }
        Ok(Self { tables, payroll })
    }

    /// Federal + Ontario income tax with CPP and EI, matching `data/tax/`
    pub fn default_ontario() -> Self {
        Self {
            tables: vec![TaxTable::canada_federal(), TaxTable::ontario()],
            payroll: vec![PayrollContribution::cpp(), PayrollContribution::ei()],
        }
    }

    /// Single bracket table without payroll contributions
    pub fn single(table: TaxTable) -> Self {
        Self {
            tables: vec![table],
            payroll: Vec::new(),
        }
    }

    pub fn tables(&self) -> &[TaxTable] {
        &self.tables
    }

    pub fn payroll(&self) -> &[PayrollContribution] {
        &self.payroll
    }

    pub fn income_tax(&self, income: f64) -> f64 {
        self.tables.iter().map(|t| t.tax_owed(income)).sum()
    }

    pub fn incremental_tax(&self, base: f64, delta: f64) -> f64 {
        self.income_tax(base + delta) - self.income_tax(base)
    }

    /// Combined marginal rate on the next unit of income
    pub fn marginal_rate(&self, income: f64) -> f64 {
        self.tables.iter().map(|t| t.marginal_rate(income)).sum()
    }

    pub fn payroll_deductions(&self, earnings: f64) -> f64 {
        self.payroll.iter().map(|p| p.amount(earnings)).sum()
    }

    /// Income left after income tax only
    pub fn after_income_tax(&self, income: f64) -> f64 {
        income - self.income_tax(income)
    }

    /// Index every bracket and payroll limit by `1 + inflation`
    pub fn index(&mut self, inflation: f64) {
        for table in &mut self.tables {
            table.index(inflation);
        }
        for contribution in &mut self.payroll {
            contribution.index(inflation);
        }
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self::default_ontario()
    }
}
