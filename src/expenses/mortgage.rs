//! Fixed-payment amortized loan

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Principal below which a loan counts as repaid
const PAID_OFF_THRESHOLD: f64 = 0.01;

/// Terms used to originate a mortgage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub house_cost: f64,
    pub down_payment: f64,
    /// Nominal annual rate, compounded monthly
    pub annual_rate: f64,
    pub term_years: u32,
}

/// A mortgage with a fixed monthly payment
///
/// The payment is set once at origination from the original principal. Lump-sum
/// prepayments lower the principal but not the payment, so later payments retire more
/// principal and the loan finishes early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizedLoan {
    house_cost: f64,
    down_payment: f64,
    monthly_rate: f64,
    term_months: u32,
    monthly_payment: f64,
    principal_remaining: f64,
    interest_paid: f64,
}

impl AmortizedLoan {
    /// Originate a loan for `house_cost - down_payment`
    pub fn new(house_cost: f64, down_payment: f64, annual_rate: f64, term_years: u32) -> Result<Self> {
        if house_cost <= 0.0 || down_payment < 0.0 || down_payment > house_cost {
            return Err(SimError::config(format!(
                "mortgage needs 0 <= down payment ({down_payment}) <= house cost ({house_cost})"
            )));
        }
        if annual_rate < 0.0 {
            return Err(SimError::config("mortgage rate cannot be negative"));
        }
        if term_years == 0 {
            return Err(SimError::config("mortgage term must be at least one year"));
        }

        let principal = house_cost - down_payment;
        let monthly_rate = annual_rate / 12.0;
        let term_months = term_years * 12;

        let monthly_payment = if monthly_rate == 0.0 {
            principal / term_months as f64
        } else {
            let growth = (1.0 + monthly_rate).powi(term_months as i32);
            principal * monthly_rate * growth / (growth - 1.0)
        };

        if principal > 0.0 && monthly_payment <= principal * monthly_rate {
            return Err(SimError::config(format!(
                "monthly payment {monthly_payment:.2} never covers the first month's interest"
            )));
        }

        Ok(Self {
            house_cost,
            down_payment,
            monthly_rate,
            term_months,
            monthly_payment,
            principal_remaining: principal,
            interest_paid: 0.0,
        })
    }

    pub fn from_terms(terms: &LoanTerms) -> Result<Self> {
        Self::new(terms.house_cost, terms.down_payment, terms.annual_rate, terms.term_years)
    }

    pub fn house_cost(&self) -> f64 {
        self.house_cost
    }

    pub fn down_payment(&self) -> f64 {
        self.down_payment
    }

    pub fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    pub fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn principal_remaining(&self) -> f64 {
        self.principal_remaining
    }

    pub fn interest_paid(&self) -> f64 {
        self.interest_paid
    }

    /// Home equity: house cost less what is still owed
    pub fn equity_built(&self) -> f64 {
        self.house_cost - self.principal_remaining
    }

    pub fn is_paid_off(&self) -> bool {
        self.principal_remaining < PAID_OFF_THRESHOLD
    }

    /// Make `n_months` scheduled payments, returning the total cash paid
    pub fn advance(&mut self, n_months: u32) -> f64 {
        let mut amount_paid = 0.0;

        for _ in 0..n_months {
            if self.principal_remaining <= 0.0 {
                break;
            }

            let interest = self.principal_remaining * self.monthly_rate;
            // The final payment only covers what is left
            let principal_payment = (self.monthly_payment - interest).min(self.principal_remaining);

            self.interest_paid += interest;
            self.principal_remaining -= principal_payment;
            amount_paid += interest + principal_payment;
        }

        amount_paid
    }

    /// Cash that `advance(n_months)` would pay, without changing the loan
    pub fn project(&self, n_months: u32) -> f64 {
        self.clone().advance(n_months)
    }

    /// Prepay principal, returning the amount actually applied
    pub fn lump_sum_payment(&mut self, amount: f64) -> f64 {
        let applied = amount.max(0.0).min(self.principal_remaining);
        self.principal_remaining -= applied;
        applied
    }

    /// Scheduled months until less than one unit of principal remains
    ///
    /// Prepayments only shorten a loan, so the search stops one month past the term.
    pub fn months_to_payoff(&self) -> Result<u32> {
        let max_months = self.term_months.saturating_add(1);
        let mut principal = self.principal_remaining;
        let mut months = 0;

        while principal >= 1.0 {
            if months >= max_months {
                return Err(SimError::NonConvergence {
                    what: "mortgage payoff projection",
                    iterations: max_months,
                });
            }
            let interest = principal * self.monthly_rate;
            principal -= (self.monthly_payment - interest).min(principal);
            months += 1;
        }

        Ok(months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn reference_loan() -> AmortizedLoan {
        AmortizedLoan::new(120000.0, 20000.0, 0.1, 20).unwrap()
    }

    #[test]
    fn test_mortgage_basics() {
        let mut mortgage = reference_loan();
        assert!((mortgage.monthly_payment() - 965.0).abs() < 1.0);
        assert_eq!(mortgage.principal_remaining(), 100000.0);
        assert_eq!(mortgage.interest_paid(), 0.0);
        assert_eq!(mortgage.months_to_payoff().unwrap(), 240);

        mortgage.advance(1);
        assert!((mortgage.principal_remaining() - 99868.0).abs() < 1.0);
        assert!((mortgage.interest_paid() - 833.33).abs() < 1.0);

        // 6 months total
        mortgage.advance(5);
        assert!((mortgage.principal_remaining() - 99193.0).abs() < 1.0);

        mortgage.lump_sum_payment(20000.0);
        assert!((mortgage.principal_remaining() - 79193.0).abs() < 1.0);

        // 7 months total
        mortgage.advance(1);
        assert!((mortgage.principal_remaining() - 78888.0).abs() < 1.0);
    }

    #[test]
    fn test_accelerated_payments() {
        let mut mortgage = reference_loan();

        mortgage.lump_sum_payment(20000.0);
        assert_eq!(mortgage.principal_remaining(), 80000.0);

        mortgage.advance(6);
        assert!((mortgage.principal_remaining() - 78172.0).abs() < 1.0);

        mortgage.lump_sum_payment(20000.0);
        assert!((mortgage.principal_remaining() - 58172.0).abs() < 1.0);
        assert_eq!(mortgage.months_to_payoff().unwrap(), 91 - 6);
    }

    #[test]
    fn test_advance_is_additive() {
        let mut split = reference_loan();
        let mut whole = split.clone();

        let paid_split = split.advance(1) + split.advance(5);
        let paid_whole = whole.advance(6);

        assert_abs_diff_eq!(split.principal_remaining(), whole.principal_remaining(), epsilon = 1e-6);
        assert_abs_diff_eq!(split.interest_paid(), whole.interest_paid(), epsilon = 1e-6);
        assert_abs_diff_eq!(paid_split, paid_whole, epsilon = 1e-6);
    }

    #[test]
    fn test_project_does_not_mutate() {
        let mortgage = reference_loan();
        let projected = mortgage.project(12);

        assert_eq!(mortgage.principal_remaining(), 100000.0);
        assert_abs_diff_eq!(projected, 12.0 * mortgage.monthly_payment(), epsilon = 1e-6);
    }

    #[test]
    fn test_full_term_pays_off() {
        let mut mortgage = reference_loan();
        let paid = mortgage.advance(240);

        assert!(mortgage.is_paid_off());
        assert!(mortgage.principal_remaining() >= 0.0);
        assert_abs_diff_eq!(paid, 100000.0 + mortgage.interest_paid(), epsilon = 1e-6);
        assert_abs_diff_eq!(mortgage.equity_built(), 120000.0, epsilon = 0.01);

        // Nothing left to pay
        assert_eq!(mortgage.advance(12), 0.0);
    }

    #[test]
    fn test_lump_sum_capped_at_principal() {
        let mut mortgage = reference_loan();
        assert_eq!(mortgage.lump_sum_payment(-5.0), 0.0);
        assert_eq!(mortgage.lump_sum_payment(250000.0), 100000.0);
        assert!(mortgage.is_paid_off());
        assert_eq!(mortgage.months_to_payoff().unwrap(), 0);
    }

    #[test]
    fn test_zero_rate_loan() {
        let mut mortgage = AmortizedLoan::new(12000.0, 0.0, 0.0, 1).unwrap();
        assert_abs_diff_eq!(mortgage.monthly_payment(), 1000.0, epsilon = 1e-9);
        assert_eq!(mortgage.months_to_payoff().unwrap(), 12);
        mortgage.advance(12);
        assert!(mortgage.is_paid_off());
    }

    #[test]
    fn test_payoff_search_covers_long_terms() {
        let mortgage = AmortizedLoan::new(100000.0, 0.0, 0.01, 250).unwrap();
        assert_eq!(mortgage.months_to_payoff().unwrap(), 3000);
    }

    #[test]
    fn test_invalid_terms_rejected() {
        assert!(AmortizedLoan::new(100000.0, 200000.0, 0.05, 25).is_err());
        assert!(AmortizedLoan::new(100000.0, 20000.0, -0.01, 25).is_err());
        assert!(AmortizedLoan::new(100000.0, 20000.0, 0.05, 0).is_err());
        assert!(AmortizedLoan::new(0.0, 0.0, 0.05, 25).is_err());
    }
}
