//! Scenario runner for single and batch simulations
//!
//! Loads the tax schedule once, then runs any number of scenarios against it. Each run
//! builds its own household from an owned config and a clone of the schedule, so batch
//! runs share no mutable state.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::simulation::{BalanceHistory, YearRecord};
use crate::tax::TaxSchedule;

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let result = runner.run(&ScenarioConfig::example(), 2024)?;
/// println!("{:.0}", result.summary().final_total);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    tax: TaxSchedule,
}

impl ScenarioRunner {
    /// Runner with the built-in federal + Ontario schedule
    pub fn new() -> Self {
        Self {
            tax: TaxSchedule::default_ontario(),
        }
    }

    /// Load tax tables from the default location (data/tax/)
    pub fn from_csv() -> Result<Self> {
        Ok(Self {
            tax: TaxSchedule::from_csv()?,
        })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self {
            tax: TaxSchedule::from_csv_path(path)?,
        })
    }

    pub fn with_tax(tax: TaxSchedule) -> Self {
        Self { tax }
    }

    pub fn tax(&self) -> &TaxSchedule {
        &self.tax
    }

    /// Simulate one scenario, starting at its own start year or `default_start_year`
    pub fn run(&self, config: &ScenarioConfig, default_start_year: i32) -> Result<SimulationResult> {
        let start_year = config.start_year.unwrap_or(default_start_year);
        let mut household = config.build_household(self.tax.clone(), start_year)?;
        household.advance(config.years)?;

        let mortgage_purchase_year = household.mortgage().and_then(|g| g.activated_year());
        let mortgage_paid_off_year = household.mortgage().and_then(|g| g.paid_off_year());

        Ok(SimulationResult {
            name: config.name.clone(),
            start_year,
            mortgage_purchase_year,
            mortgage_paid_off_year,
            history: household.into_history(),
        })
    }

    /// Simulate many independent scenarios in parallel, preserving input order
    pub fn run_batch(&self, configs: &[ScenarioConfig], default_start_year: i32) -> Vec<Result<SimulationResult>> {
        configs
            .par_iter()
            .map(|config| self.run(config, default_start_year))
            .collect()
    }

    /// Run one base scenario under several variations of it
    pub fn run_variations<F>(
        &self,
        base: &ScenarioConfig,
        default_start_year: i32,
        count: usize,
        vary: F,
    ) -> Vec<Result<SimulationResult>>
    where
        F: Fn(usize, &mut ScenarioConfig) + Sync,
    {
        (0..count)
            .into_par_iter()
            .map(|i| {
                let mut config = base.clone();
                vary(i, &mut config);
                self.run(&config, default_start_year)
            })
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one simulated scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub name: String,
    pub start_year: i32,
    pub mortgage_purchase_year: Option<i32>,
    pub mortgage_paid_off_year: Option<i32>,
    pub history: BalanceHistory,
}

impl SimulationResult {
    pub fn final_balances(&self) -> Option<&YearRecord> {
        self.history.latest()
    }

    pub fn summary(&self) -> SimulationSummary {
        let last = self.history.latest();
        let total_withdrawn = self.history.contributions.iter().map(|c| c.withdrawn).sum();
        let total_income_tax = self.history.contributions.iter().map(|c| c.income_tax).sum();
        let total_mortgage_prepaid = self.history.contributions.iter().map(|c| c.mortgage_prepayment).sum();

        SimulationSummary {
            name: self.name.clone(),
            years: self.history.years.len() as u32,
            final_year: last.map(|r| r.year).unwrap_or(self.start_year),
            final_total: last.map(|r| r.total).unwrap_or(0.0),
            final_tax_free: last.map(|r| r.tax_free).unwrap_or(0.0),
            final_tax_deferred: last.map(|r| r.tax_deferred).unwrap_or(0.0),
            final_taxable: last.map(|r| r.taxable).unwrap_or(0.0),
            total_income_tax,
            total_withdrawn,
            total_mortgage_prepaid,
            mortgage_purchase_year: self.mortgage_purchase_year,
            mortgage_paid_off_year: self.mortgage_paid_off_year,
        }
    }
}

/// Headline figures for a simulated scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub name: String,
    pub years: u32,
    pub final_year: i32,
    pub final_total: f64,
    pub final_tax_free: f64,
    pub final_tax_deferred: f64,
    pub final_taxable: f64,
    pub total_income_tax: f64,
    pub total_withdrawn: f64,
    pub total_mortgage_prepaid: f64,
    pub mortgage_purchase_year: Option<i32>,
    pub mortgage_paid_off_year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LivingConfig, PersonConfig};
    use crate::error::SimError;
    use crate::expenses::default_child_costs;

    fn single_earner(salary: f64) -> ScenarioConfig {
        ScenarioConfig {
            name: format!("salary {salary}"),
            start_year: None,
            years: 10,
            persons: vec![PersonConfig {
                age: 30,
                salary,
                accounts: Default::default(),
                settings: Default::default(),
            }],
            living: LivingConfig {
                living_costs: 1500.0,
                rent: 1000.0,
                child_costs: default_child_costs(),
            },
            expenses: Vec::new(),
            children: Vec::new(),
            mortgage: None,
            household: Default::default(),
        }
    }

    #[test]
    fn test_run_uses_default_start_year() {
        let runner = ScenarioRunner::new();
        let result = runner.run(&single_earner(60000.0), 2030).unwrap();

        assert_eq!(result.start_year, 2030);
        let summary = result.summary();
        assert_eq!(summary.years, 10);
        assert_eq!(summary.final_year, 2039);
        assert!(summary.final_total > 0.0);
        assert!(summary.total_income_tax > 0.0);
        assert_eq!(summary.mortgage_purchase_year, None);
    }

    #[test]
    fn test_batch_matches_sequential_runs() {
        let runner = ScenarioRunner::new();
        let configs: Vec<_> = [50000.0, 70000.0, 90000.0].iter().map(|&s| single_earner(s)).collect();

        let batch: Vec<_> = runner
            .run_batch(&configs, 2024)
            .into_iter()
            .map(|r| r.unwrap().summary().final_total)
            .collect();

        for (config, total) in configs.iter().zip(&batch) {
            let sequential = runner.run(config, 2024).unwrap().summary().final_total;
            assert_eq!(sequential, *total);
        }
        // Higher salary saves more
        assert!(batch[2] > batch[1] && batch[1] > batch[0]);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let runner = ScenarioRunner::new();
        let mut broke = single_earner(0.0);
        broke.name = "no income".to_string();
        let configs = vec![single_earner(60000.0), broke];

        let results = runner.run_batch(&configs, 2024);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SimError::Unaffordable { year: 2024, .. })));
    }

    #[test]
    fn test_variations_of_retirement_share() {
        let runner = ScenarioRunner::new();
        let shares = [0.0, 0.3];
        let results = runner.run_variations(&single_earner(80000.0), 2024, shares.len(), |i, config| {
            config.persons[0].settings.max_retirement_contribution = shares[i];
        });

        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result.unwrap().summary().final_total > 0.0);
        }
    }

    #[test]
    fn test_mortgage_milestones_reported() {
        let runner = ScenarioRunner::new();
        let result = runner.run(&ScenarioConfig::example(), 2024).unwrap();
        let summary = result.summary();

        let bought = summary.mortgage_purchase_year.unwrap();
        let repaid = summary.mortgage_paid_off_year.unwrap();
        assert!(repaid > bought);
        assert!(summary.total_mortgage_prepaid > 0.0);
    }
}
