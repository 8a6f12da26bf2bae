//! Year-by-year household simulation

mod person;
mod liquidity;
mod waterfall;
mod household;
mod history;

pub use person::{Person, PersonAccounts, PersonSettings};
pub use liquidity::{household_withdrawable, withdraw_from_household};
pub use waterfall::{contribute, YearContext, MAX_SHORTFALL_ITERATIONS, SHORTFALL_TOLERANCE};
pub use household::{Household, HouseholdSettings, MortgageGoal};
pub use history::{BalanceHistory, ContributionRecord, YearRecord};
