//! Household Sim - Year-by-year household finance simulator
//!
//! This library provides:
//! - Progressive bracket tax with payroll contributions, loaded from CSV or built in
//! - Mortgage amortization with lump-sum prepayment
//! - TFSA/RRSP-style room accounts, an emergency fund and a taxable account
//! - A before-tax solver for tax-deferred contributions
//! - The annual cash-allocation waterfall with bounded shortfall resolution
//! - JSON scenarios and parallel batch runs

pub mod error;
pub mod tax;
pub mod expenses;
pub mod accounts;
pub mod simulation;
pub mod config;
pub mod scenario;

// Re-export commonly used types
pub use error::{Result, SimError};
pub use tax::{TaxSchedule, TaxTable};
pub use expenses::{AmortizedLoan, LivingExpenses, LoanTerms};
pub use simulation::{Household, HouseholdSettings, Person, PersonSettings, YearRecord};
pub use config::ScenarioConfig;
pub use scenario::{ScenarioRunner, SimulationResult, SimulationSummary};
