use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::LoanLimits;
use crate::error::LoanError;
use crate::types::{round_money, Money, Rate};
use crate::LoanResult;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Input for simple (non-compounding) interest over a day count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleInterestInput {
    pub principal: Money,
    /// Annual rate in percent.
    pub annual_rate_percent: Rate,
    pub days: i64,
}

/// `principal * (rate / 100 / 365) * days`, rounded half-up to cents.
pub fn simple_interest(input: &SimpleInterestInput, limits: &LoanLimits) -> LoanResult<Money> {
    limits.check_principal("principal", input.principal)?;
    limits.check_annual_rate("annual_rate_percent", input.annual_rate_percent)?;
    if input.days <= 0 {
        return Err(LoanError::validation("days", "must be positive"));
    }

    let daily_rate = input.annual_rate_percent / dec!(100) / DAYS_PER_YEAR;
    Ok(round_money(
        input.principal * daily_rate * Decimal::from(input.days),
    ))
}
