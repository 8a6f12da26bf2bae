//! Income tax: bracket tables, payroll contributions and the before-tax solver

mod table;
mod payroll;
mod schedule;
mod before_tax;
pub mod loader;

pub use table::TaxTable;
pub use payroll::PayrollContribution;
pub use schedule::TaxSchedule;
pub use before_tax::{after_tax_cost, before_tax_contribution, SOLVER_TOLERANCE};
pub use loader::{load_schedule, load_tax_table, DEFAULT_TAX_PATH};
