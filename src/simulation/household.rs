//! Household orchestrator: shared expenses, the mortgage goal and the year loop

use serde::{Deserialize, Serialize};

use crate::accounts::SavingsAccount;
use crate::error::{Result, SimError};
use crate::expenses::{AmortizedLoan, Expense, LivingExpenses, LoanTerms};
use crate::tax::TaxSchedule;

use super::history::{BalanceHistory, ContributionRecord, YearRecord};
use super::liquidity::withdraw_from_household;
use super::person::Person;
use super::waterfall::{self, YearContext};

/// Household-wide policy, fixed for the whole simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdSettings {
    /// Send leftover cash and taxable savings to the mortgage until it is repaid
    pub pay_house_down_asap: bool,

    /// Yearly indexation of tax brackets and payroll limits
    pub bracket_indexation: f64,
}

impl Default for HouseholdSettings {
    fn default() -> Self {
        Self {
            pay_house_down_asap: true,
            bracket_indexation: 0.0,
        }
    }
}

/// A house purchase: inactive until the down payment has been withdrawn
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageGoal {
    loan: AmortizedLoan,
    activated_year: Option<i32>,
    payoff_months_at_activation: Option<u32>,
    paid_off_year: Option<i32>,
}

impl MortgageGoal {
    pub fn new(loan: AmortizedLoan) -> Self {
        Self {
            loan,
            activated_year: None,
            payoff_months_at_activation: None,
            paid_off_year: None,
        }
    }

    pub fn loan(&self) -> &AmortizedLoan {
        &self.loan
    }

    pub(crate) fn loan_mut(&mut self) -> &mut AmortizedLoan {
        &mut self.loan
    }

    pub fn is_active(&self) -> bool {
        self.activated_year.is_some()
    }

    pub fn activated_year(&self) -> Option<i32> {
        self.activated_year
    }

    /// Scheduled payoff length when the house was bought, before any prepayment
    pub fn payoff_months_at_activation(&self) -> Option<u32> {
        self.payoff_months_at_activation
    }

    /// Year in which the last of the principal was repaid
    pub fn paid_off_year(&self) -> Option<i32> {
        self.paid_off_year
    }

    /// Active since a year strictly before `year`
    pub fn activated_before(&self, year: i32) -> bool {
        self.activated_year.is_some_and(|y| y < year)
    }

    pub fn activate(&mut self, year: i32) -> Result<()> {
        self.payoff_months_at_activation = Some(self.loan.months_to_payoff()?);
        self.activated_year = Some(year);
        Ok(())
    }
}

/// Persons sharing expenses and at most one mortgage
///
/// A year that fails (unaffordable or non-convergent) leaves the household part-way
/// through that year; discard it rather than advancing further.
#[derive(Debug, Clone)]
pub struct Household {
    settings: HouseholdSettings,
    tax: TaxSchedule,
    year: i32,
    persons: Vec<Person>,
    living: LivingExpenses,
    expenses: Vec<Expense>,
    child_years: Vec<i32>,
    mortgage: Option<MortgageGoal>,
    history: BalanceHistory,
}

impl Household {
    pub fn new(
        year: i32,
        persons: Vec<Person>,
        living: LivingExpenses,
        tax: TaxSchedule,
        settings: HouseholdSettings,
    ) -> Result<Self> {
        if persons.is_empty() {
            return Err(SimError::config("a household needs at least one person"));
        }

        Ok(Self {
            settings,
            tax,
            year,
            persons,
            living,
            expenses: Vec::new(),
            child_years: Vec::new(),
            mortgage: None,
            history: BalanceHistory::new(),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn settings(&self) -> &HouseholdSettings {
        &self.settings
    }

    pub fn tax(&self) -> &TaxSchedule {
        &self.tax
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn living_expenses(&self) -> &LivingExpenses {
        &self.living
    }

    pub fn mortgage(&self) -> Option<&MortgageGoal> {
        self.mortgage.as_ref()
    }

    pub fn history(&self) -> &BalanceHistory {
        &self.history
    }

    pub fn into_history(self) -> BalanceHistory {
        self.history
    }

    pub fn contributions(&self) -> &[ContributionRecord] {
        &self.history.contributions
    }

    pub fn latest_balances(&self) -> Option<&YearRecord> {
        self.history.latest()
    }

    pub fn add_one_time_expense(&mut self, amount: f64, year: i32) {
        self.expenses.push(Expense::one_time(amount, year));
    }

    pub fn add_recurring_expense(&mut self, amount: f64, first_year: i32, period_years: u32) {
        self.expenses.push(Expense::recurring(amount, first_year, period_years));
    }

    pub fn add_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    /// A child born in `year`; past years are ignored
    pub fn schedule_new_child(&mut self, year: i32) {
        if year >= self.year {
            self.child_years.push(year);
        }
    }

    /// Plan a house purchase, bought as soon as the down payment can be raised
    pub fn start_mortgage(&mut self, terms: &LoanTerms) -> Result<()> {
        if self.mortgage.as_ref().is_some_and(MortgageGoal::is_active) {
            return Err(SimError::config("a mortgage is already active"));
        }
        self.mortgage = Some(MortgageGoal::new(AmortizedLoan::from_terms(terms)?));
        Ok(())
    }

    pub fn advance(&mut self, years: u32) -> Result<()> {
        for _ in 0..years {
            self.advance_year()?;
        }
        Ok(())
    }

    /// Simulate the current year and move to the next one
    pub fn advance_year(&mut self) -> Result<()> {
        self.try_purchase_house()?;

        let annual_expenses = self.annual_expenses();
        let ctx = YearContext {
            year: self.year,
            tax: &self.tax,
            annual_expenses,
            pay_house_down_asap: self.settings.pay_house_down_asap,
        };

        for index in 0..self.persons.len() {
            let record = waterfall::contribute(&mut self.persons, index, self.mortgage.as_mut(), &ctx)?;
            self.history.add_contribution(record);
        }

        for person in &mut self.persons {
            person.roll_forward();
        }

        let record = self.year_end_record();
        log::info!(
            "{}: total {:.0} (tax-free {:.0}, tax-deferred {:.0}, taxable {:.0}, equity {:.0})",
            record.year,
            record.total,
            record.tax_free,
            record.tax_deferred,
            record.taxable,
            record.mortgage_equity
        );
        self.history.add_year(record);

        if self.settings.bracket_indexation != 0.0 {
            self.tax.index(self.settings.bracket_indexation);
        }
        self.year += 1;
        Ok(())
    }

    fn try_purchase_house(&mut self) -> Result<()> {
        let Some(goal) = self.mortgage.as_mut() else {
            return Ok(());
        };
        if goal.is_active() {
            return Ok(());
        }

        let down_payment = goal.loan().down_payment();
        let raised = if down_payment > 0.0 {
            withdraw_from_household(&mut self.persons, &self.tax, down_payment)
        } else {
            0.0
        };
        if down_payment > 0.0 && raised <= 0.0 {
            return Ok(());
        }

        goal.activate(self.year)?;
        log::info!(
            "{}: bought a {:.0} house with {:.0} down",
            self.year,
            goal.loan().house_cost(),
            down_payment
        );
        Ok(())
    }

    /// Living costs plus rent or mortgage payments plus scheduled expenses
    fn annual_expenses(&mut self) -> f64 {
        let births = self.child_years.iter().filter(|&&y| y == self.year).count();
        for _ in 0..births {
            self.living.add_child();
        }

        let mut total = match self.mortgage.as_ref() {
            Some(goal) if goal.is_active() => {
                let housing = if goal.loan().is_paid_off() {
                    0.0
                } else {
                    goal.loan().project(12)
                };
                housing + self.living.increment_year(false)
            }
            _ => self.living.increment_year(true),
        };

        total += self.expenses.iter().map(|e| e.year_cost(self.year)).sum::<f64>();
        total
    }

    /// Sum balances, then advance the mortgage through the year
    fn year_end_record(&mut self) -> YearRecord {
        let mut record = YearRecord::new(self.year);
        for person in &self.persons {
            record.emergency_fund += person.emergency_fund().balance();
            record.tax_free += person.tfsa().balance();
            record.tax_deferred += person.rrsp().balance();
            record.taxable += person.taxable().balance();
        }

        if let Some(goal) = self.mortgage.as_mut().filter(|g| g.is_active()) {
            record.mortgage_equity = goal.loan().equity_built();
            record.mortgage_principal = goal.loan().principal_remaining();

            if !goal.loan().is_paid_off() {
                goal.loan_mut().advance(12);
            }
            if goal.loan().is_paid_off() && goal.paid_off_year.is_none() {
                goal.paid_off_year = Some(self.year);
                log::info!("{}: mortgage repaid", self.year);
            }
        }

        record.finalize();
        record
    }
}
