use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::schedule::{compound_factor, monthly_rate};
use crate::config::LoanLimits;
use crate::error::LoanError;
use crate::types::{round_money, Money, Rate, Ratio};
use crate::LoanResult;

/// Conventional qualified-mortgage debt-to-income ceiling.
pub const DEFAULT_MAX_DTI: Ratio = dec!(0.43);

/// Input for sizing the largest loan an income can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub monthly_income: Money,
    /// Monthly payments already committed elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_debt: Option<Money>,
    /// Annual rate in percent.
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    /// Defaults to 0.43.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dti_ratio: Option<Ratio>,
}

/// Invert the annuity formula: the principal whose level payment consumes at
/// most `max_dti_ratio` of monthly income after existing obligations.
///
/// Returns zero when existing debt already uses up the allowance.
pub fn max_affordable_loan(input: &AffordabilityInput, limits: &LoanLimits) -> LoanResult<Money> {
    if input.monthly_income <= Decimal::ZERO {
        return Err(LoanError::validation(
            "monthly_income",
            "must be positive",
        ));
    }
    limits.check_annual_rate("annual_rate_percent", input.annual_rate_percent)?;
    limits.check_term("term_months", input.term_months)?;

    let max_dti = input.max_dti_ratio.unwrap_or(DEFAULT_MAX_DTI);
    if max_dti <= Decimal::ZERO || max_dti > Decimal::ONE {
        return Err(LoanError::validation(
            "max_dti_ratio",
            "must be in (0, 1]",
        ));
    }

    let mut max_payment = input.monthly_income * max_dti;
    if let Some(debt) = input.existing_debt {
        if debt > Decimal::ZERO {
            max_payment -= debt;
        }
    }
    if max_payment <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let n = input.term_months;
    let r = monthly_rate(input.annual_rate_percent);
    if r.is_zero() {
        return max_payment
            .checked_mul(Decimal::from(n))
            .map(round_money)
            .ok_or_else(|| overflow("affordable payment x term"));
    }

    let factor = compound_factor(r, n)?;
    let present_value_factor = r
        .checked_mul(factor)
        .and_then(|denominator| (factor - Decimal::ONE).checked_div(denominator))
        .ok_or_else(|| overflow("present value factor"))?;
    max_payment
        .checked_mul(present_value_factor)
        .map(round_money)
        .ok_or_else(|| overflow("affordable payment x present value factor"))
}

fn overflow(context: &str) -> LoanError {
    LoanError::Arithmetic {
        context: context.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::schedule::level_payment;
    use rust_decimal_macros::dec;

    fn input(income: Decimal, debt: Option<Decimal>, rate: Decimal, term: u32) -> AffordabilityInput {
        AffordabilityInput {
            monthly_income: income,
            existing_debt: debt,
            annual_rate_percent: rate,
            term_months: term,
            max_dti_ratio: None,
        }
    }

    #[test]
    fn test_zero_rate_is_payment_times_term() {
        // 5000 * 0.43 - 500 = 1650 per month, 1650 * 24 = 39600
        let max = max_affordable_loan(
            &input(dec!(5000), Some(dec!(500)), Decimal::ZERO, 24),
            &LoanLimits::default(),
        )
        .unwrap();
        assert_eq!(max, dec!(39600.00));
    }

    #[test]
    fn test_inverse_of_level_payment() {
        let max = max_affordable_loan(
            &input(dec!(6000), None, dec!(6), 60),
            &LoanLimits::default(),
        )
        .unwrap();
        // The payment on the affordable principal should land on the
        // allowance (6000 * 0.43 = 2580) to within a cent.
        let payment = level_payment(max, monthly_rate(dec!(6)), 60).unwrap();
        assert!((payment - dec!(2580)).abs() <= dec!(0.01), "payment was {payment}");
    }

    #[test]
    fn test_existing_debt_exhausts_allowance() {
        let max = max_affordable_loan(
            &input(dec!(3000), Some(dec!(1500)), dec!(5), 36),
            &LoanLimits::default(),
        )
        .unwrap();
        assert_eq!(max, Decimal::ZERO);
    }

    #[test]
    fn test_custom_dti() {
        let mut i = input(dec!(4000), None, Decimal::ZERO, 10);
        i.max_dti_ratio = Some(dec!(0.25));
        let max = max_affordable_loan(&i, &LoanLimits::default()).unwrap();
        assert_eq!(max, dec!(10000.00));
    }

    #[test]
    fn test_overflow_is_an_arithmetic_error() {
        let huge = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        let err = max_affordable_loan(
            &input(huge, None, Decimal::ZERO, 360),
            &LoanLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoanError::Arithmetic { .. }), "got {err:?}");
    }

    #[test]
    fn test_invalid_inputs() {
        let limits = LoanLimits::default();
        let err = max_affordable_loan(&input(Decimal::ZERO, None, dec!(5), 12), &limits).unwrap_err();
        assert_eq!(err.field(), Some("monthly_income"));

        let mut i = input(dec!(4000), None, dec!(5), 12);
        i.max_dti_ratio = Some(dec!(1.5));
        let err = max_affordable_loan(&i, &limits).unwrap_err();
        assert_eq!(err.field(), Some("max_dti_ratio"));

        let err = max_affordable_loan(&input(dec!(4000), None, dec!(5), 500), &limits).unwrap_err();
        assert_eq!(err.field(), Some("term_months"));
    }
}
