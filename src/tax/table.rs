//! Progressive bracket table

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// A progressive tax schedule for one jurisdiction
///
/// `thresholds[i]` is the income at which `rates[i]` starts to apply. Income below the
/// first threshold is untaxed and the last rate applies without an upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxTable")]
pub struct TaxTable {
    thresholds: Vec<f64>,
    rates: Vec<f64>,
}

/// Unvalidated form read from scenario or schedule files
#[derive(Deserialize)]
struct RawTaxTable {
    thresholds: Vec<f64>,
    rates: Vec<f64>,
}

impl TryFrom<RawTaxTable> for TaxTable {
    type Error = SimError;

    fn try_from(raw: RawTaxTable) -> Result<Self> {
        Self::new(raw.thresholds, raw.rates)
    }
}

impl TaxTable {
    /// Create a table from parallel threshold and rate lists
    pub fn new(thresholds: Vec<f64>, rates: Vec<f64>) -> Result<Self> {
        if thresholds.len() != rates.len() {
            return Err(SimError::config(format!(
                "tax table has {} thresholds but {} rates",
                thresholds.len(),
                rates.len()
            )));
        }
        if thresholds.is_empty() {
            return Err(SimError::config("tax table has no brackets"));
        }
        if thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::config(
                "tax thresholds must be strictly ascending",
            ));
        }
        if let Some(rate) = rates.iter().find(|r| !(0.0..1.0).contains(*r)) {
            return Err(SimError::config(format!(
                "tax rate {rate} is outside [0, 1)"
            )));
        }

        Ok(Self { thresholds, rates })
    }

    /// 2021 Canadian federal brackets
    pub fn canada_federal() -> Self {
        Self {
            thresholds: vec![13229.0, 48535.0, 97070.0, 150474.0, 214368.0],
            rates: vec![0.15, 0.205, 0.26, 0.29, 0.33],
        }
    }

    /// 2021 Ontario provincial brackets
    pub fn ontario() -> Self {
        Self {
            thresholds: vec![10783.0, 44740.0, 89482.0, 150000.0, 220000.0],
            rates: vec![0.0505, 0.0915, 0.1116, 0.1216, 0.1316],
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Highest rate in the table
    pub fn top_rate(&self) -> f64 {
        self.rates.iter().copied().fold(0.0, f64::max)
    }

    /// Total tax owed on `income`
    pub fn tax_owed(&self, income: f64) -> f64 {
        self.thresholds
            .iter()
            .enumerate()
            .take_while(|(_, &threshold)| income > threshold)
            .map(|(i, &threshold)| {
                let upper = self
                    .thresholds
                    .get(i + 1)
                    .copied()
                    .unwrap_or(f64::INFINITY);
                (income.min(upper) - threshold) * self.rates[i]
            })
            .sum()
    }

    /// Portion of `income` taxed at the highest bracket it reaches
    pub fn marginal_top_bracket_amount(&self, income: f64) -> f64 {
        self.thresholds
            .iter()
            .rev()
            .find(|&&threshold| income >= threshold)
            .map(|&threshold| income - threshold)
            .unwrap_or(0.0)
    }

    /// Marginal rate applying to the next unit of income
    pub fn marginal_rate(&self, income: f64) -> f64 {
        self.thresholds
            .iter()
            .rposition(|&threshold| income >= threshold)
            .map(|i| self.rates[i])
            .unwrap_or(0.0)
    }

    /// Extra tax caused by adding `delta` on top of `base`
    pub fn incremental_tax(&self, base: f64, delta: f64) -> f64 {
        self.tax_owed(base + delta) - self.tax_owed(base)
    }

    /// Scale every threshold by `1 + inflation` (annual indexation)
    pub fn index(&mut self, inflation: f64) {
        for threshold in &mut self.thresholds {
            *threshold *= 1.0 + inflation;
        }
    }
}
