//! Error type shared by the whole simulator

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Inputs that can never produce a meaningful simulation
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An iterative search ran past its iteration cap
    #[error("{what} did not converge after {iterations} iterations")]
    NonConvergence { what: &'static str, iterations: u32 },

    /// A person's yearly cash flow could not be brought back to zero
    #[error("year {year}: person {person} cannot cover a shortfall of {shortfall:.2}")]
    Unaffordable {
        year: i32,
        person: usize,
        shortfall: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
