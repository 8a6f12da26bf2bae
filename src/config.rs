//! Scenario files: persons, accounts, expenses, mortgage and household policy
//!
//! Scenarios are JSON documents. Every field except `persons` and `living` has a default,
//! so a minimal scenario only lists who earns what and what it costs to live.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::accounts::{EmergencyFund, RoomAccount, RoomRule, TaxableAccount};
use crate::error::{Result, SimError};
use crate::expenses::{default_child_costs, Expense, LivingExpenses, LoanTerms};
use crate::simulation::{Household, HouseholdSettings, Person, PersonAccounts, PersonSettings};
use crate::tax::TaxSchedule;

pub const DEFAULT_SCENARIO_PATH: &str = "data/scenarios/two_person.json";

/// Opening account state for one person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub tfsa_balance: f64,
    pub tfsa_room: f64,
    pub tfsa_rule: RoomRule,
    pub rrsp_balance: f64,
    pub rrsp_room: f64,
    pub rrsp_rule: RoomRule,
    pub taxable_balance: f64,
    /// Defaults to the balance (no unrealized gain)
    pub taxable_cost_basis: Option<f64>,
    pub emergency_fund_balance: f64,
    pub emergency_fund_months: f64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            tfsa_balance: 0.0,
            tfsa_room: 0.0,
            tfsa_rule: RoomRule::default_tax_free(),
            rrsp_balance: 0.0,
            rrsp_room: 0.0,
            rrsp_rule: RoomRule::default_tax_deferred(),
            taxable_balance: 0.0,
            taxable_cost_basis: None,
            emergency_fund_balance: 0.0,
            emergency_fund_months: EmergencyFund::DEFAULT_MONTHS,
        }
    }
}

impl AccountsConfig {
    pub fn build(&self) -> PersonAccounts {
        PersonAccounts {
            tfsa: RoomAccount::new(self.tfsa_rule.clone(), self.tfsa_balance, self.tfsa_room),
            rrsp: RoomAccount::new(self.rrsp_rule.clone(), self.rrsp_balance, self.rrsp_room),
            taxable: TaxableAccount::new(
                self.taxable_balance,
                self.taxable_cost_basis.unwrap_or(self.taxable_balance),
            ),
            emergency_fund: EmergencyFund::new(self.emergency_fund_balance, self.emergency_fund_months),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonConfig {
    pub age: u32,
    pub salary: f64,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub settings: PersonSettings,
}

impl PersonConfig {
    pub fn build(&self) -> Result<Person> {
        Person::new(self.age, self.salary, self.accounts.build(), self.settings.clone())
    }
}

/// Monthly living costs and rent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingConfig {
    pub living_costs: f64,
    pub rent: f64,
    #[serde(default = "default_child_costs")]
    pub child_costs: Vec<f64>,
}

impl LivingConfig {
    pub fn build(&self) -> LivingExpenses {
        LivingExpenses::with_child_costs(self.living_costs, self.rent, self.child_costs.clone())
    }
}

fn default_years() -> u32 {
    30
}

/// A complete household scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: String,

    /// First simulated year; the runner picks one when absent
    #[serde(default)]
    pub start_year: Option<i32>,

    #[serde(default = "default_years")]
    pub years: u32,

    pub persons: Vec<PersonConfig>,
    pub living: LivingConfig,

    #[serde(default)]
    pub expenses: Vec<Expense>,

    /// Birth year of each planned child
    #[serde(default)]
    pub children: Vec<i32>,

    #[serde(default)]
    pub mortgage: Option<LoanTerms>,

    #[serde(default)]
    pub household: HouseholdSettings,
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.persons.is_empty() {
            return Err(SimError::config(format!("scenario '{}' has no persons", self.name)));
        }
        for (i, expense) in self.expenses.iter().enumerate() {
            if expense.amount < 0.0 {
                return Err(SimError::config(format!("expense {i} has a negative amount")));
            }
        }
        Ok(())
    }

    /// Two earners saving for a house, with one child on the way
    pub fn example() -> Self {
        let person = |age, salary, tfsa_room, allow_tfsa_withdrawal| PersonConfig {
            age,
            salary,
            accounts: AccountsConfig {
                tfsa_room,
                emergency_fund_months: 4.0,
                ..AccountsConfig::default()
            },
            settings: PersonSettings {
                allow_tfsa_withdrawal,
                ..PersonSettings::default()
            },
        };

        Self {
            name: "two-person example".to_string(),
            start_year: Some(2024),
            years: 40,
            persons: vec![person(28, 72000.0, 20000.0, true), person(27, 64000.0, 15000.0, false)],
            living: LivingConfig {
                living_costs: 2500.0,
                rent: 1800.0,
                child_costs: default_child_costs(),
            },
            expenses: vec![Expense::recurring(25000.0, 2026, 10)],
            children: vec![2027],
            mortgage: Some(LoanTerms {
                house_cost: 550000.0,
                down_payment: 110000.0,
                annual_rate: 0.045,
                term_years: 25,
            }),
            household: HouseholdSettings {
                pay_house_down_asap: true,
                bracket_indexation: 0.02,
            },
        }
    }

    /// Build a household ready to simulate from `start_year`
    pub fn build_household(&self, tax: TaxSchedule, start_year: i32) -> Result<Household> {
        let persons = self
            .persons
            .iter()
            .map(PersonConfig::build)
            .collect::<Result<Vec<_>>>()?;

        let mut household = Household::new(start_year, persons, self.living.build(), tax, self.household.clone())?;

        for expense in &self.expenses {
            household.add_expense(expense.clone());
        }
        for &year in &self.children {
            household.schedule_new_child(year);
        }
        if let Some(terms) = &self.mortgage {
            household.start_mortgage(terms)?;
        }

        Ok(household)
    }
}
