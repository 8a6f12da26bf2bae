//! Recurring household living costs including children

use serde::{Deserialize, Serialize};

/// Default monthly cost of a child by age in years (index 0 = first year)
pub fn default_child_costs() -> Vec<f64> {
    let mut costs = vec![1500.0 + 4000.0 / 12.0, 1500.0];
    costs.extend(std::iter::repeat(500.0).take(18));
    costs
}

/// Monthly living costs, rent and per-child costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingExpenses {
    living_costs: f64,
    rent: f64,
    child_costs: Vec<f64>,
    children_ages: Vec<usize>,
}

impl LivingExpenses {
    pub fn new(living_costs: f64, rent: f64) -> Self {
        Self::with_child_costs(living_costs, rent, default_child_costs())
    }

    pub fn with_child_costs(living_costs: f64, rent: f64, child_costs: Vec<f64>) -> Self {
        Self {
            living_costs: living_costs.max(0.0),
            rent: rent.max(0.0),
            child_costs,
            children_ages: Vec::new(),
        }
    }

    pub fn living_costs(&self) -> f64 {
        self.living_costs
    }

    pub fn set_living_costs(&mut self, living_costs: f64) {
        self.living_costs = living_costs.max(0.0);
    }

    pub fn rent(&self) -> f64 {
        self.rent
    }

    pub fn set_rent(&mut self, rent: f64) {
        self.rent = rent.max(0.0);
    }

    pub fn child_costs(&self) -> &[f64] {
        &self.child_costs
    }

    pub fn children_ages(&self) -> &[usize] {
        &self.children_ages
    }

    /// Add a newborn child
    pub fn add_child(&mut self) {
        self.children_ages.push(0);
    }

    pub fn monthly_living_costs(&self, include_rent: bool) -> f64 {
        let rent = if include_rent { self.rent } else { 0.0 };
        let children: f64 = self
            .children_ages
            .iter()
            .filter_map(|&age| self.child_costs.get(age))
            .sum();

        self.living_costs + rent + children
    }

    /// Cost of the current year, then age every child by one year
    pub fn increment_year(&mut self, include_rent: bool) -> f64 {
        let annual = 12.0 * self.monthly_living_costs(include_rent);
        for age in &mut self.children_ages {
            *age += 1;
        }
        annual
    }
}
