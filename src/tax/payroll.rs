//! Payroll contributions levied on employment income (CPP/EI style)

use serde::{Deserialize, Serialize};

/// Flat-rate contribution on earnings between an exemption and a ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollContribution {
    pub name: String,
    pub rate: f64,
    /// Earnings below this amount are not contributory
    pub exemption: f64,
    /// Earnings above this amount are not contributory
    pub max_earnings: f64,
}

impl PayrollContribution {
    /// Canada Pension Plan employee share (2021)
    pub fn cpp() -> Self {
        Self {
            name: "CPP".to_string(),
            rate: 0.0545,
            exemption: 3500.0,
            max_earnings: 61600.0,
        }
    }

    /// Employment Insurance premium (2021)
    pub fn ei() -> Self {
        Self {
            name: "EI".to_string(),
            rate: 0.0158,
            exemption: 0.0,
            max_earnings: 56300.0,
        }
    }

    /// Contribution owed on `earnings`
    pub fn amount(&self, earnings: f64) -> f64 {
        self.rate * (earnings.min(self.max_earnings) - self.exemption).max(0.0)
    }

    pub fn index(&mut self, inflation: f64) {
        self.exemption *= 1.0 + inflation;
        self.max_earnings *= 1.0 + inflation;
    }
}
