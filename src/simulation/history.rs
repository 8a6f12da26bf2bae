//! Year-end balances and per-person allocation records

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Household balances at the end of one simulated year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub emergency_fund: f64,
    pub tax_free: f64,
    pub tax_deferred: f64,
    pub taxable: f64,

    /// House cost minus principal remaining, before this year's payments
    pub mortgage_equity: f64,
    pub mortgage_principal: f64,

    /// Accounts plus mortgage equity
    pub total: f64,
}

impl YearRecord {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            emergency_fund: 0.0,
            tax_free: 0.0,
            tax_deferred: 0.0,
            taxable: 0.0,
            mortgage_equity: 0.0,
            mortgage_principal: 0.0,
            total: 0.0,
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.total = self.emergency_fund + self.tax_free + self.tax_deferred + self.taxable + self.mortgage_equity;
    }
}

/// Where one person's cash went in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub year: i32,
    pub person: usize,
    pub age: u32,
    pub before_tax_income: f64,
    pub income_tax: f64,
    pub payroll: f64,
    pub expense_share: f64,

    /// Cash pulled from savings, including forced liquidation
    pub withdrawn: f64,

    /// Positive for a deposit, negative when the excess was released
    pub emergency_fund: f64,
    pub tax_free_deposit: f64,
    pub tax_deferred_deposit: f64,
    pub tax_deferred_cost: f64,
    pub mortgage_prepayment: f64,
    pub taxable_deposit: f64,
}

impl ContributionRecord {
    pub fn new(year: i32, person: usize, age: u32) -> Self {
        Self {
            year,
            person,
            age,
            before_tax_income: 0.0,
            income_tax: 0.0,
            payroll: 0.0,
            expense_share: 0.0,
            withdrawn: 0.0,
            emergency_fund: 0.0,
            tax_free_deposit: 0.0,
            tax_deferred_deposit: 0.0,
            tax_deferred_cost: 0.0,
            mortgage_prepayment: 0.0,
            taxable_deposit: 0.0,
        }
    }

    pub fn after_tax_income(&self) -> f64 {
        self.before_tax_income - self.income_tax - self.payroll
    }
}

/// Full record of a household simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceHistory {
    pub years: Vec<YearRecord>,
    pub contributions: Vec<ContributionRecord>,
}

impl BalanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_year(&mut self, record: YearRecord) {
        self.years.push(record);
    }

    pub fn add_contribution(&mut self, record: ContributionRecord) {
        self.contributions.push(record);
    }

    pub fn latest(&self) -> Option<&YearRecord> {
        self.years.last()
    }

    pub fn year(&self, year: i32) -> Option<&YearRecord> {
        self.years.iter().find(|r| r.year == year)
    }

    pub fn contributions_for(&self, person: usize) -> impl Iterator<Item = &ContributionRecord> {
        self.contributions.iter().filter(move |r| r.person == person)
    }

    /// Write one CSV row per simulated year
    pub fn write_years_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for record in &self.years {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write one CSV row per person per simulated year
    pub fn write_contributions_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for record in &self.contributions {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
