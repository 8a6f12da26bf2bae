//! Before-tax contribution solver
//!
//! Tax-deferred contributions are deducted from taxable income, so diverting `x` of
//! gross income only costs `x - (tax(B) - tax(B - x))` in after-tax cash. Given the
//! after-tax amount a person wants to give up, find the gross amount to divert.

use super::TaxSchedule;
use crate::error::{Result, SimError};

/// Acceptable gap between the achieved and requested after-tax reduction
pub const SOLVER_TOLERANCE: f64 = 0.1;

/// Iteration cap for [`before_tax_contribution`]
pub const MAX_SOLVER_ITERATIONS: u32 = 1000;

/// Find the before-tax contribution that reduces after-tax income by `after_tax_amount`
///
/// Searches for the gross income `g` whose after-tax income is `after_tax_amount` lower
/// than at `before_tax_income`, stepping `g` by the remaining error each iteration. With
/// a piecewise-linear tax whose marginal rate `m` stays below 1, the error shrinks by a
/// factor of `m` per step.
///
/// # Arguments
/// * `after_tax_amount` - Desired reduction in after-tax cash
/// * `before_tax_income` - Gross income before the contribution
/// * `tax` - Schedule used for income tax (payroll contributions are ignored)
///
/// # Returns
/// * The before-tax contribution `before_tax_income - g`
pub fn before_tax_contribution(
    after_tax_amount: f64,
    before_tax_income: f64,
    tax: &TaxSchedule,
) -> Result<f64> {
    if after_tax_amount <= 0.0 {
        return Ok(0.0);
    }

    let after_tax_income = tax.after_income_tax(before_tax_income);
    let mut gross = before_tax_income;

    for iteration in 0..MAX_SOLVER_ITERATIONS {
        let reduction = (after_tax_income - tax.after_income_tax(gross)).abs();
        let error = reduction - after_tax_amount;

        if error.abs() <= SOLVER_TOLERANCE {
            log::debug!(
                "before-tax solve: {:.2} after tax -> {:.2} before tax in {} iterations",
                after_tax_amount,
                before_tax_income - gross,
                iteration
            );
            return Ok(before_tax_income - gross);
        }

        gross += error;
    }

    Err(SimError::NonConvergence {
        what: "before-tax contribution solver",
        iterations: MAX_SOLVER_ITERATIONS,
    })
}

/// After-tax cash actually given up by contributing `before_tax_amount`
pub fn after_tax_cost(before_tax_amount: f64, before_tax_income: f64, tax: &TaxSchedule) -> f64 {
    before_tax_amount - tax.incremental_tax(before_tax_income - before_tax_amount, before_tax_amount)
}
