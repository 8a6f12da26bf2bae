//! One-time and periodic expenses scheduled by calendar year

use serde::{Deserialize, Serialize};

/// An expense paid in `first_year` and then every `period_years` (0 = once)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub amount: f64,
    pub first_year: i32,
    #[serde(default)]
    pub period_years: u32,
}

impl Expense {
    pub fn one_time(amount: f64, year: i32) -> Self {
        Self {
            amount,
            first_year: year,
            period_years: 0,
        }
    }

    pub fn recurring(amount: f64, first_year: i32, period_years: u32) -> Self {
        Self {
            amount,
            first_year,
            period_years,
        }
    }

    pub fn year_cost(&self, year: i32) -> f64 {
        if year == self.first_year {
            return self.amount;
        }
        if self.period_years == 0 || year < self.first_year {
            return 0.0;
        }
        if (year - self.first_year) % self.period_years as i32 == 0 {
            self.amount
        } else {
            0.0
        }
    }
}
