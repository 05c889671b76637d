pub mod amortization;
pub mod application;
pub mod risk;

use serde::de::DeserializeOwned;

/// clap value parser for the core's SCREAMING_SNAKE_CASE enums, so
/// `--loan-type home-equity` and `--loan-type HOME_EQUITY` both work.
pub(crate) fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let name = raw.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(serde_json::Value::String(name))
        .map_err(|_| format!("unrecognised value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_core::risk::profile::EmploymentStatus;
    use loan_core::LoanType;

    #[test]
    fn test_parse_enum_accepts_kebab_case() {
        assert_eq!(parse_enum::<LoanType>("home-equity"), Ok(LoanType::HomeEquity));
        assert_eq!(
            parse_enum::<EmploymentStatus>("employed_full_time"),
            Ok(EmploymentStatus::FullTime)
        );
        assert!(parse_enum::<LoanType>("yacht").is_err());
    }
}
