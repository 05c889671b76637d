use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as percentages on the way in (5.25 = 5.25% p.a.) and as
/// decimals internally once divided down to a periodic rate.
pub type Rate = Decimal;

/// Dimensionless ratios such as debt-to-income (0.36 = 36%).
pub type Ratio = Decimal;

/// Fractional digits for currency amounts.
pub const MONEY_SCALE: u32 = 2;

/// Fractional digits for ratios returned to callers.
pub const RATIO_SCALE: u32 = 4;

/// Fractional digits carried by periodic (monthly, daily) rates.
pub const PERIODIC_RATE_SCALE: u32 = 10;

/// Round half-up (away from zero on a tie) to `dp` fractional digits.
///
/// `Decimal::round_dp` is banker's rounding, which is wrong for money.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a currency amount to cents, half-up, always carrying two digits.
pub fn round_money(value: Money) -> Money {
    with_scale(round_half_up(value, MONEY_SCALE), MONEY_SCALE)
}

/// Round a ratio to four digits, half-up, always carrying four digits.
pub fn round_ratio(value: Ratio) -> Ratio {
    with_scale(round_half_up(value, RATIO_SCALE), RATIO_SCALE)
}

fn with_scale(mut value: Decimal, scale: u32) -> Decimal {
    value.rescale(scale);
    value
}

/// Product category of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanType {
    Personal,
    Auto,
    Mortgage,
    Business,
    Student,
    HomeEquity,
}

impl LoanType {
    pub const ALL: [LoanType; 6] = [
        LoanType::Personal,
        LoanType::Auto,
        LoanType::Mortgage,
        LoanType::Business,
        LoanType::Student,
        LoanType::HomeEquity,
    ];
}

impl std::fmt::Display for LoanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanType::Personal => write!(f, "PERSONAL"),
            LoanType::Auto => write!(f, "AUTO"),
            LoanType::Mortgage => write!(f, "MORTGAGE"),
            LoanType::Business => write!(f, "BUSINESS"),
            LoanType::Student => write!(f, "STUDENT"),
            LoanType::HomeEquity => write!(f, "HOME_EQUITY"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_up_on_tie() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
    }

    #[test]
    fn test_round_money_pads_scale() {
        assert_eq!(round_money(dec!(1000)).to_string(), "1000.00");
        assert_eq!(round_ratio(dec!(0.2)).to_string(), "0.2000");
    }

    #[test]
    fn test_round_ratio() {
        assert_eq!(round_ratio(dec!(0.28125)), dec!(0.2813));
        assert_eq!(round_ratio(dec!(0.2)), dec!(0.2));
    }

    #[test]
    fn test_loan_type_serde_names() {
        let json = serde_json::to_string(&LoanType::HomeEquity).unwrap();
        assert_eq!(json, "\"HOME_EQUITY\"");
        let parsed: LoanType = serde_json::from_str("\"AUTO\"").unwrap();
        assert_eq!(parsed, LoanType::Auto);
    }

    #[test]
    fn test_metadata_precision() {
        let out = with_metadata("m", &serde_json::json!({}), vec![], 1, dec!(1));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
