//! Emergency fund sized in months of household expenses

use super::{SavingsAccount, Withdrawal};

/// Cash buffer targeting a number of months of expenses
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyFund {
    balance: f64,
    months: f64,
}

impl EmergencyFund {
    pub const DEFAULT_MONTHS: f64 = 6.0;

    pub fn new(balance: f64, months: f64) -> Self {
        Self {
            balance: balance.max(0.0),
            months: months.max(0.0),
        }
    }

    pub fn months(&self) -> f64 {
        self.months
    }

    /// Positive when the fund is below `months * monthly_expense`,
    /// negative when the excess may be released
    pub fn amount_under_target(&self, monthly_expense: f64) -> f64 {
        self.months * monthly_expense - self.balance
    }
}

impl Default for EmergencyFund {
    fn default() -> Self {
        Self::new(0.0, Self::DEFAULT_MONTHS)
    }
}

impl SavingsAccount for EmergencyFund {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn deposit(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        self.balance += amount;
        amount
    }

    fn withdraw(&mut self, amount: f64) -> Withdrawal {
        if amount <= 0.0 {
            return Withdrawal::default();
        }
        let released = amount.min(self.balance);
        self.balance -= released;
        Withdrawal::untaxed(released)
    }

    fn grow(&mut self, rate: f64) {
        self.balance *= 1.0 + rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emergency_fund() {
        let mut fund = EmergencyFund::new(0.0, 6.0);
        assert_eq!(fund.balance(), 0.0);
        assert_eq!(fund.months(), 6.0);
        assert_eq!(fund.amount_under_target(1000.0), 6000.0);

        assert_eq!(fund.deposit(8000.0), 8000.0);
        assert_eq!(fund.amount_under_target(1000.0), -2000.0);

        fund.withdraw(2000.0);
        assert_eq!(fund.balance(), 6000.0);
        assert_eq!(fund.amount_under_target(1000.0), 0.0);
    }

    #[test]
    fn test_withdraw_capped_at_balance() {
        let mut fund = EmergencyFund::new(500.0, 3.0);
        assert_eq!(fund.withdraw(800.0), Withdrawal::untaxed(500.0));
        assert_eq!(fund.balance(), 0.0);
        assert_eq!(fund.deposit(-5.0), 0.0);
    }

    #[test]
    fn test_default_targets_six_months() {
        let fund = EmergencyFund::default();
        assert_eq!(fund.amount_under_target(2500.0), 15000.0);
    }
}
