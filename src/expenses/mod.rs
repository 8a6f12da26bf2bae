//! Household outflows: mortgage, living costs and scheduled expenses

mod mortgage;
mod living;
mod expense;

pub use mortgage::{AmortizedLoan, LoanTerms};
pub use living::{default_child_costs, LivingExpenses};
pub use expense::Expense;
