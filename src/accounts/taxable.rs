//! Non-registered investment account with an adjusted cost basis

use super::{SavingsAccount, Withdrawal};

/// Share of a realized capital gain that is taxable
pub const CAPITAL_GAINS_INCLUSION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct TaxableAccount {
    balance: f64,
    cost_basis: f64,
}

impl TaxableAccount {
    pub fn new(balance: f64, cost_basis: f64) -> Self {
        Self {
            balance: balance.max(0.0),
            cost_basis: cost_basis.max(0.0),
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.cost_basis
    }

    /// Taxable gain a withdrawal of `amount` would realize, without withdrawing
    pub fn unrealized_gain_if_withdrawn(&self, amount: f64) -> f64 {
        if self.balance <= 0.0 || amount <= 0.0 {
            return 0.0;
        }
        let fraction = amount.min(self.balance) / self.balance;
        CAPITAL_GAINS_INCLUSION * (self.balance - self.cost_basis) * fraction
    }
}

impl Default for TaxableAccount {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl SavingsAccount for TaxableAccount {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn deposit(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        self.balance += amount;
        self.cost_basis += amount;
        amount
    }

    fn withdraw(&mut self, amount: f64) -> Withdrawal {
        if self.balance <= 0.0 || amount <= 0.0 {
            return Withdrawal::default();
        }
        let released = amount.min(self.balance);
        let taxable_income = self.unrealized_gain_if_withdrawn(released);

        self.cost_basis *= 1.0 - released / self.balance;
        self.balance -= released;

        Withdrawal {
            released,
            taxable_income,
        }
    }

    fn grow(&mut self, rate: f64) {
        self.balance *= 1.0 + rate;
    }
}
