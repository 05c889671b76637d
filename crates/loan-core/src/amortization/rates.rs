use rust_decimal_macros::dec;

use crate::types::{LoanType, Rate};

/// Indicative annual rate, in percent, quoted for each product.
pub fn reference_rate(loan_type: LoanType) -> Rate {
    match loan_type {
        LoanType::Personal => dec!(8.99),
        LoanType::Auto => dec!(4.50),
        LoanType::Mortgage => dec!(6.75),
        LoanType::Business => dec!(9.25),
        LoanType::Student => dec!(5.25),
        LoanType::HomeEquity => dec!(7.50),
    }
}

/// The full rate card, in declaration order.
pub fn reference_rates() -> Vec<(LoanType, Rate)> {
    LoanType::ALL
        .iter()
        .map(|t| (*t, reference_rate(*t)))
        .collect()
}
