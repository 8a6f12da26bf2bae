//! Registered accounts limited by contribution room

use serde::{Deserialize, Serialize};

use super::{SavingsAccount, Withdrawal};

/// How an account's contribution room is replenished at year end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoomRule {
    /// TFSA: fixed yearly grant plus recapture of the year's withdrawals
    TaxFree { yearly_room_increase: f64 },
    /// RRSP: share of earned income up to a ceiling; withdrawals are ordinary income
    TaxDeferred {
        max_room: f64,
        room_percent_income: f64,
        /// Yearly growth of `max_room`
        max_room_growth: f64,
    },
}

impl RoomRule {
    pub fn default_tax_free() -> Self {
        RoomRule::TaxFree {
            yearly_room_increase: 6000.0,
        }
    }

    pub fn default_tax_deferred() -> Self {
        RoomRule::TaxDeferred {
            max_room: 27230.0,
            room_percent_income: 0.18,
            max_room_growth: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomAccount {
    rule: RoomRule,
    balance: f64,
    contribution_room: f64,
    /// Withdrawals since the last year end (recaptured by TFSA-style accounts)
    year_withdrawals: f64,
}

impl RoomAccount {
    pub fn new(rule: RoomRule, balance: f64, contribution_room: f64) -> Self {
        Self {
            rule,
            balance: balance.max(0.0),
            contribution_room: contribution_room.max(0.0),
            year_withdrawals: 0.0,
        }
    }

    pub fn tax_free(balance: f64, contribution_room: f64) -> Self {
        Self::new(RoomRule::default_tax_free(), balance, contribution_room)
    }

    pub fn tax_deferred(balance: f64, contribution_room: f64) -> Self {
        Self::new(RoomRule::default_tax_deferred(), balance, contribution_room)
    }

    pub fn rule(&self) -> &RoomRule {
        &self.rule
    }

    pub fn contribution_room(&self) -> f64 {
        self.contribution_room
    }

    pub fn is_tax_deferred(&self) -> bool {
        matches!(self.rule, RoomRule::TaxDeferred { .. })
    }

    /// Year-end rollover: growth, then new room. Returns the room granted.
    ///
    /// `earned_income` is only used by tax-deferred accounts.
    pub fn increment_year(&mut self, growth: f64, earned_income: f64) -> f64 {
        self.grow(growth);

        let granted = match &mut self.rule {
            RoomRule::TaxFree { yearly_room_increase } => *yearly_room_increase + self.year_withdrawals,
            RoomRule::TaxDeferred {
                max_room,
                room_percent_income,
                max_room_growth,
            } => {
                let granted = max_room.min(earned_income.max(0.0) * *room_percent_income);
                *max_room *= 1.0 + *max_room_growth;
                granted
            }
        };

        self.contribution_room += granted;
        self.year_withdrawals = 0.0;
        granted
    }
}

impl SavingsAccount for RoomAccount {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn deposit(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let accepted = amount.min(self.contribution_room);
        self.balance += accepted;
        self.contribution_room -= accepted;
        accepted
    }

    fn withdraw(&mut self, amount: f64) -> Withdrawal {
        if amount <= 0.0 {
            return Withdrawal::default();
        }
        let released = amount.min(self.balance);
        self.balance -= released;

        match self.rule {
            RoomRule::TaxFree { .. } => {
                self.year_withdrawals += released;
                Withdrawal::untaxed(released)
            }
            RoomRule::TaxDeferred { .. } => Withdrawal {
                released,
                taxable_income: released,
            },
        }
    }

    fn grow(&mut self, rate: f64) {
        self.balance *= 1.0 + rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tfsa() {
        let mut tfsa = RoomAccount::new(
            RoomRule::TaxFree { yearly_room_increase: 5000.0 },
            1000.0,
            10000.0,
        );
        assert_eq!(tfsa.balance(), 1000.0);
        assert_eq!(tfsa.contribution_room(), 10000.0);

        let withdrawal = tfsa.withdraw(2000.0);
        assert_eq!(withdrawal, Withdrawal::untaxed(1000.0));
        assert_eq!(tfsa.balance(), 0.0);
        // Room is only recaptured at year end
        assert_eq!(tfsa.contribution_room(), 10000.0);

        assert_eq!(tfsa.deposit(20000.0), 10000.0);
        assert_eq!(tfsa.balance(), 10000.0);
        assert_eq!(tfsa.contribution_room(), 0.0);

        let granted = tfsa.increment_year(1.0, 0.0);
        assert_eq!(tfsa.balance(), 20000.0);
        assert_eq!(granted, 6000.0);
        assert_eq!(tfsa.contribution_room(), 1000.0 + 5000.0);
    }

    #[test]
    fn test_rrsp() {
        let mut rrsp = RoomAccount::tax_deferred(1000.0, 10000.0);
        assert!(rrsp.is_tax_deferred());

        let withdrawal = rrsp.withdraw(2000.0);
        assert_eq!(withdrawal.released, 1000.0);
        assert_eq!(withdrawal.taxable_income, 1000.0);
        assert_eq!(rrsp.balance(), 0.0);
        assert_eq!(rrsp.contribution_room(), 10000.0);

        assert_eq!(rrsp.deposit(20000.0), 10000.0);
        assert_eq!(rrsp.contribution_room(), 0.0);

        rrsp.increment_year(1.0, 1800.0);
        assert_eq!(rrsp.balance(), 20000.0);
        assert!((rrsp.contribution_room() - 1800.0 * 0.18).abs() < 1e-9);
        // Withdrawals are never recaptured
        rrsp.withdraw(5000.0);
        rrsp.increment_year(0.0, 0.0);
        assert!((rrsp.contribution_room() - 1800.0 * 0.18).abs() < 1e-9);
    }

    #[test]
    fn test_rrsp_room_capped_and_indexed() {
        let mut rrsp = RoomAccount::new(
            RoomRule::TaxDeferred {
                max_room: 10000.0,
                room_percent_income: 0.18,
                max_room_growth: 0.1,
            },
            0.0,
            0.0,
        );

        assert_eq!(rrsp.increment_year(0.0, 1_000_000.0), 10000.0);
        assert!((rrsp.increment_year(0.0, 1_000_000.0) - 11000.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut tfsa = RoomAccount::tax_free(-50.0, -10.0);
        assert_eq!(tfsa.balance(), 0.0);
        assert_eq!(tfsa.contribution_room(), 0.0);

        let mut rrsp = RoomAccount::tax_deferred(100.0, 100.0);
        assert_eq!(rrsp.deposit(-10.0), 0.0);
        assert_eq!(rrsp.withdraw(-10.0), Withdrawal::default());
        assert_eq!(rrsp.balance(), 100.0);
        assert_eq!(tfsa.deposit(10.0), 0.0);
    }
}
