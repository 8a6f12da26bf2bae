//! Savings vehicles held by each person
//!
//! - **Room accounts**: tax-free (TFSA) and tax-deferred (RRSP) accounts capped by a
//!   running contribution room
//! - **Emergency fund**: cash buffer sized in months of expenses
//! - **Taxable account**: investments tracked with an adjusted cost basis
//!
//! Deposits and withdrawals never fail. Out-of-range amounts are clamped and the amount
//! actually moved is returned, so callers must book the returned value.

mod room;
mod reserve;
mod taxable;

pub use room::{RoomAccount, RoomRule};
pub use reserve::EmergencyFund;
pub use taxable::TaxableAccount;

/// Cash released by a withdrawal and the income it adds to this year's tax base
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Withdrawal {
    pub released: f64,
    pub taxable_income: f64,
}

impl Withdrawal {
    pub fn untaxed(released: f64) -> Self {
        Self {
            released,
            taxable_income: 0.0,
        }
    }
}

/// Operations shared by every savings vehicle
pub trait SavingsAccount {
    fn balance(&self) -> f64;

    /// Deposit up to `amount`, returning the amount accepted
    fn deposit(&mut self, amount: f64) -> f64;

    /// Withdraw up to `amount`
    fn withdraw(&mut self, amount: f64) -> Withdrawal;

    /// Apply one year of investment growth
    fn grow(&mut self, rate: f64);
}
