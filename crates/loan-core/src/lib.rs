pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "application")]
pub mod application;

pub use config::{LendingConfig, LoanLimits};
pub use error::LoanError;
pub use types::*;

/// Standard result type for all loan-core operations
pub type LoanResult<T> = Result<T, LoanError>;
