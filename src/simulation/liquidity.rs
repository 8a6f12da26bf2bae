//! How much cash a person or the household can raise, and raising it
//!
//! Draw order for a person is fixed: taxable account, unrestricted TFSA dollars,
//! RRSP, then whatever TFSA dollars are left. Proportional household withdrawals
//! size each person's share from their after-tax capacity, which is only exact
//! while every share stays within the same tax brackets.

use crate::accounts::SavingsAccount;
use crate::tax::TaxSchedule;

use super::person::Person;

/// Amounts below a cent are treated as nothing to withdraw
pub(crate) const CENT: f64 = 0.01;

impl Person {
    /// TFSA dollars that may be spent without touching the retirement portion
    pub fn unrestricted_tfsa(&self) -> f64 {
        if self.settings.allow_tfsa_withdrawal {
            self.tfsa.balance()
        } else {
            self.tfsa.balance() * (1.0 - self.tfsa_retirement_portion)
        }
    }

    /// Cash the person could raise this year
    ///
    /// # Arguments
    /// * `after_tax` - Subtract the income tax the withdrawal would trigger
    /// * `include_retirement` - Count the RRSP and the whole TFSA as available
    pub fn withdrawable_cash(&self, tax: &TaxSchedule, after_tax: bool, include_retirement: bool) -> f64 {
        let mut cash = self.taxable.balance();
        let mut extra_income = self.taxable.unrealized_gain_if_withdrawn(self.taxable.balance());

        if include_retirement {
            cash += self.tfsa.balance() + self.rrsp.balance();
            extra_income += self.rrsp.balance();
        } else {
            cash += self.unrestricted_tfsa();
        }

        if !after_tax {
            return cash;
        }

        cash - tax.incremental_tax(self.before_tax_income(), extra_income)
    }

    /// Withdraw `amount` across the person's accounts
    ///
    /// Returns 0 without touching anything when `amount` exceeds the after-tax
    /// ceiling including retirement accounts. Realized gains and RRSP withdrawals
    /// are added to this year's investment income.
    pub fn withdraw_cash(&mut self, tax: &TaxSchedule, amount: f64) -> f64 {
        if amount <= 0.0 || amount > self.withdrawable_cash(tax, true, true) {
            return 0.0;
        }

        let taxable = self.taxable.withdraw(amount);
        self.yearly_investment_income += taxable.taxable_income;
        let mut withdrawn = taxable.released;

        let retirement_dollars = self.tfsa.balance() * self.tfsa_retirement_portion;
        if amount - withdrawn > 0.0 {
            let unrestricted = self.unrestricted_tfsa();
            withdrawn += self.tfsa.withdraw((amount - withdrawn).min(unrestricted)).released;
        }

        if amount - withdrawn > 0.0 {
            let rrsp = self.rrsp.withdraw(amount - withdrawn);
            self.yearly_investment_income += rrsp.taxable_income;
            withdrawn += rrsp.released;
        }

        if amount - withdrawn > 0.0 {
            withdrawn += self.tfsa.withdraw(amount - withdrawn).released;
        }

        // Retirement dollars are spent last, so their amount only drops once
        // the regular dollars are gone
        self.set_tfsa_retirement_dollars(retirement_dollars.min(self.tfsa.balance()));

        withdrawn
    }

    /// Sell the whole taxable account, returning the cash released
    pub fn liquidate_taxable(&mut self) -> f64 {
        let withdrawal = self.taxable.withdraw(self.taxable.balance());
        self.yearly_investment_income += withdrawal.taxable_income;
        withdrawal.released
    }

    /// Sell the taxable account and, when TFSA withdrawals are restricted, the regular
    /// TFSA dollars too. Retirement dollars stay invested.
    pub fn liquidate_for_mortgage(&mut self) -> f64 {
        let mut released = self.liquidate_taxable();

        if !self.settings.allow_tfsa_withdrawal {
            let retirement_dollars = self.tfsa.balance() * self.tfsa_retirement_portion;
            released += self.tfsa.withdraw(self.unrestricted_tfsa()).released;
            self.set_tfsa_retirement_dollars(retirement_dollars.min(self.tfsa.balance()));
        }

        released
    }
}

/// After-tax non-retirement capacity of every person, and their total
pub fn household_withdrawable(persons: &[Person], tax: &TaxSchedule) -> (Vec<f64>, f64) {
    let capacity: Vec<f64> = persons
        .iter()
        .map(|p| p.withdrawable_cash(tax, true, false).max(0.0))
        .collect();
    let total = capacity.iter().sum();
    (capacity, total)
}

/// Withdraw `amount` from the household in proportion to each person's capacity
///
/// All or nothing: returns 0 and leaves every account untouched when the
/// household cannot cover `amount`. Otherwise returns the cash actually released.
pub fn withdraw_from_household(persons: &mut [Person], tax: &TaxSchedule, amount: f64) -> f64 {
    if amount <= 0.0 {
        return 0.0;
    }

    let (capacity, total) = household_withdrawable(persons, tax);
    if total < amount || total < CENT {
        return 0.0;
    }

    let ratio = amount / total;
    persons
        .iter_mut()
        .zip(capacity)
        .map(|(person, cash)| person.withdraw_cash(tax, cash * ratio))
        .sum()
}
