//! One household member and their savings accounts

use serde::{Deserialize, Serialize};

use crate::accounts::{EmergencyFund, RoomAccount, SavingsAccount, TaxableAccount};
use crate::error::{Result, SimError};

/// Per-person policy, fixed for the whole simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonSettings {
    /// Whether the whole tax-free balance may be spent before retirement
    pub allow_tfsa_withdrawal: bool,

    /// Fraction of after-tax income earmarked for retirement accounts
    pub max_retirement_contribution: f64,

    pub annual_salary_increase: f64,

    /// Salary stops at the year end when this age is reached
    pub retirement_age: u32,

    /// Growth of the tax-free, tax-deferred and taxable accounts
    pub index_fund_return: f64,

    pub emergency_fund_return: f64,
}

impl Default for PersonSettings {
    fn default() -> Self {
        Self {
            allow_tfsa_withdrawal: true,
            max_retirement_contribution: 0.15,
            annual_salary_increase: 0.03,
            retirement_age: 65,
            index_fund_return: 0.07,
            emergency_fund_return: 0.0,
        }
    }
}

impl PersonSettings {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.max_retirement_contribution) {
            return Err(SimError::config(format!(
                "max_retirement_contribution must lie in [0, 1], got {}",
                self.max_retirement_contribution
            )));
        }
        if self.annual_salary_increase <= -1.0
            || self.index_fund_return <= -1.0
            || self.emergency_fund_return <= -1.0
        {
            return Err(SimError::config("growth rates must be greater than -100%"));
        }
        Ok(())
    }
}

/// Opening balances of the four accounts a person holds
#[derive(Debug, Clone, PartialEq)]
pub struct PersonAccounts {
    pub tfsa: RoomAccount,
    pub rrsp: RoomAccount,
    pub taxable: TaxableAccount,
    pub emergency_fund: EmergencyFund,
}

impl Default for PersonAccounts {
    fn default() -> Self {
        Self {
            tfsa: RoomAccount::tax_free(0.0, 0.0),
            rrsp: RoomAccount::tax_deferred(0.0, 0.0),
            taxable: TaxableAccount::default(),
            emergency_fund: EmergencyFund::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub(super) settings: PersonSettings,
    pub(super) age: u32,
    pub(super) salary: f64,
    pub(super) tfsa: RoomAccount,
    pub(super) rrsp: RoomAccount,
    pub(super) taxable: TaxableAccount,
    pub(super) emergency_fund: EmergencyFund,

    /// Share of the TFSA balance counted toward retirement, in [0, 1]
    pub(super) tfsa_retirement_portion: f64,

    /// Realized gains and RRSP withdrawals taxed as income this year
    pub(super) yearly_investment_income: f64,

    /// Part of `yearly_investment_income` already taxed by this year's allocation
    pub(super) assessed_investment_income: f64,
}

impl Person {
    pub fn new(age: u32, salary: f64, accounts: PersonAccounts, settings: PersonSettings) -> Result<Self> {
        settings.validate()?;
        if accounts.tfsa.is_tax_deferred() {
            return Err(SimError::config("the TFSA must use a tax-free room rule"));
        }
        if !accounts.rrsp.is_tax_deferred() {
            return Err(SimError::config("the RRSP must use a tax-deferred room rule"));
        }

        Ok(Self {
            settings,
            age,
            salary: salary.max(0.0),
            tfsa: accounts.tfsa,
            rrsp: accounts.rrsp,
            taxable: accounts.taxable,
            emergency_fund: accounts.emergency_fund,
            tfsa_retirement_portion: 0.0,
            yearly_investment_income: 0.0,
            assessed_investment_income: 0.0,
        })
    }

    pub fn settings(&self) -> &PersonSettings {
        &self.settings
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    pub fn tfsa(&self) -> &RoomAccount {
        &self.tfsa
    }

    pub fn rrsp(&self) -> &RoomAccount {
        &self.rrsp
    }

    pub fn taxable(&self) -> &TaxableAccount {
        &self.taxable
    }

    pub fn emergency_fund(&self) -> &EmergencyFund {
        &self.emergency_fund
    }

    pub fn tfsa_retirement_portion(&self) -> f64 {
        self.tfsa_retirement_portion
    }

    pub fn yearly_investment_income(&self) -> f64 {
        self.yearly_investment_income
    }

    /// Investment income realized after this year's tax was computed
    pub fn unassessed_investment_income(&self) -> f64 {
        (self.yearly_investment_income - self.assessed_investment_income).max(0.0)
    }

    /// Mark everything realized so far as taxed this year
    pub(super) fn assess_investment_income(&mut self) {
        self.assessed_investment_income = self.yearly_investment_income;
    }

    /// Salary plus investment income realized so far this year
    pub fn before_tax_income(&self) -> f64 {
        self.salary + self.yearly_investment_income
    }

    pub fn total_savings(&self) -> f64 {
        self.tfsa.balance() + self.rrsp.balance() + self.taxable.balance() + self.emergency_fund.balance()
    }

    pub(super) fn set_tfsa_retirement_dollars(&mut self, retirement_dollars: f64) {
        let balance = self.tfsa.balance();
        self.tfsa_retirement_portion = if balance > 0.0 {
            (retirement_dollars / balance).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Year-end rollover: salary growth, account growth and new room, retirement, aging
    ///
    /// Income realized after this year's tax was computed (e.g. drawn by another person's
    /// shortfall) is carried into next year's tax base.
    pub fn roll_forward(&mut self) {
        let growth = self.settings.index_fund_return;

        self.yearly_investment_income = self.unassessed_investment_income();
        self.assessed_investment_income = 0.0;
        self.salary *= 1.0 + self.settings.annual_salary_increase;

        self.tfsa.increment_year(growth, 0.0);
        // RRSP room is earned on next year's salary
        self.rrsp.increment_year(growth, self.salary);
        self.taxable.grow(growth);
        self.emergency_fund.grow(self.settings.emergency_fund_return);

        if self.age >= self.settings.retirement_age {
            self.salary = 0.0;
        }
        self.age += 1;
    }
}
