//! Lending configuration: input bounds for the amortization engine and the
//! risk policy table.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides:
//!
//! ```yaml
//! limits:
//!   max_principal: "500000.00"
//!   min_term_months: 6
//! risk_policy:
//!   auto_approval:
//!     min_credit_score: 760
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::types::{Money, Rate, MONEY_SCALE, RATIO_SCALE};
use crate::LoanResult;

#[cfg(feature = "risk")]
use crate::risk::policy::RiskPolicy;

/// Bounds every loan request is validated against before any arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanLimits {
    pub min_principal: Money,
    pub max_principal: Money,
    /// Upper bound on the annual rate, in percent.
    pub max_annual_rate: Rate,
    pub min_term_months: u32,
    pub max_term_months: u32,
}

impl Default for LoanLimits {
    fn default() -> Self {
        LoanLimits {
            min_principal: dec!(1000.00),
            max_principal: dec!(10000000.00),
            max_annual_rate: dec!(30.00),
            min_term_months: 1,
            max_term_months: 480,
        }
    }
}

impl LoanLimits {
    /// Check the limits themselves are coherent.
    pub fn validate(&self) -> LoanResult<()> {
        if self.min_principal <= Decimal::ZERO {
            return Err(LoanError::Config(
                "limits.min_principal must be positive".into(),
            ));
        }
        if self.min_principal > self.max_principal {
            return Err(LoanError::Config(
                "limits.min_principal exceeds limits.max_principal".into(),
            ));
        }
        if self.max_annual_rate < Decimal::ZERO {
            return Err(LoanError::Config(
                "limits.max_annual_rate cannot be negative".into(),
            ));
        }
        if self.min_term_months == 0 || self.min_term_months > self.max_term_months {
            return Err(LoanError::Config(
                "limits term range must satisfy 1 <= min_term_months <= max_term_months".into(),
            ));
        }
        Ok(())
    }

    pub fn check_principal(&self, field: &str, amount: Money) -> LoanResult<()> {
        if amount <= Decimal::ZERO {
            return Err(LoanError::validation(field, "must be positive"));
        }
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(LoanError::validation(
                field,
                format!("cannot have more than {MONEY_SCALE} fractional digits"),
            ));
        }
        if amount < self.min_principal {
            return Err(LoanError::validation(
                field,
                format!("must be at least {}", self.min_principal),
            ));
        }
        if amount > self.max_principal {
            return Err(LoanError::validation(
                field,
                format!("cannot exceed {}", self.max_principal),
            ));
        }
        Ok(())
    }

    pub fn check_annual_rate(&self, field: &str, rate: Rate) -> LoanResult<()> {
        if rate < Decimal::ZERO {
            return Err(LoanError::validation(field, "cannot be negative"));
        }
        // Rates are quoted to at most four fractional digits of a percent.
        if rate.normalize().scale() > RATIO_SCALE {
            return Err(LoanError::validation(
                field,
                format!("cannot have more than {RATIO_SCALE} fractional digits"),
            ));
        }
        if rate > self.max_annual_rate {
            return Err(LoanError::validation(
                field,
                format!("cannot exceed {}%", self.max_annual_rate),
            ));
        }
        Ok(())
    }

    pub fn check_term(&self, field: &str, term_months: u32) -> LoanResult<()> {
        if term_months == 0 {
            return Err(LoanError::validation(field, "must be positive"));
        }
        if term_months < self.min_term_months || term_months > self.max_term_months {
            return Err(LoanError::validation(
                field,
                format!(
                    "must be between {} and {} months",
                    self.min_term_months, self.max_term_months
                ),
            ));
        }
        Ok(())
    }
}

/// Everything a caller may tune. Loaded once and passed by reference into
/// the pure operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    pub limits: LoanLimits,
    #[cfg(feature = "risk")]
    pub risk_policy: RiskPolicy,
}

impl LendingConfig {
    pub fn from_json_str(s: &str) -> LoanResult<Self> {
        let config: LendingConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> LoanResult<Self> {
        let config: LendingConfig = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LoanResult<()> {
        self.limits.validate()?;
        #[cfg(feature = "risk")]
        self.risk_policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_valid() {
        assert!(LoanLimits::default().validate().is_ok());
        assert!(LendingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_principal_bounds() {
        let limits = LoanLimits::default();
        assert!(limits.check_principal("principal", dec!(1000)).is_ok());
        assert!(limits.check_principal("principal", dec!(10000000)).is_ok());

        let err = limits.check_principal("principal", dec!(999.99)).unwrap_err();
        assert_eq!(err.field(), Some("principal"));
        let err = limits.check_principal("principal", dec!(-5)).unwrap_err();
        assert_eq!(err.field(), Some("principal"));
        assert!(limits.check_principal("principal", dec!(10000000.01)).is_err());
    }

    #[test]
    fn test_sub_cent_principal_rejected() {
        let limits = LoanLimits::default();
        let err = limits.check_principal("principal", dec!(1000.005)).unwrap_err();
        assert_eq!(err.field(), Some("principal"));
        // Trailing zeros are not extra precision.
        assert!(limits.check_principal("principal", dec!(1000.000)).is_ok());
        assert!(limits.check_principal("principal", dec!(1000.01)).is_ok());
    }

    #[test]
    fn test_rate_precision_capped_at_four_digits() {
        let limits = LoanLimits::default();
        assert!(limits.check_annual_rate("annual_rate_percent", dec!(6.1234)).is_ok());
        assert!(limits.check_annual_rate("annual_rate_percent", dec!(6.12340)).is_ok());
        let err = limits
            .check_annual_rate("annual_rate_percent", dec!(6.12345))
            .unwrap_err();
        assert_eq!(err.field(), Some("annual_rate_percent"));
    }

    #[test]
    fn test_rate_and_term_bounds() {
        let limits = LoanLimits::default();
        assert!(limits.check_annual_rate("annual_rate_percent", Decimal::ZERO).is_ok());
        assert!(limits.check_annual_rate("annual_rate_percent", dec!(30)).is_ok());
        assert!(limits.check_annual_rate("annual_rate_percent", dec!(30.01)).is_err());
        assert!(limits.check_annual_rate("annual_rate_percent", dec!(-0.01)).is_err());

        assert!(limits.check_term("term_months", 480).is_ok());
        assert!(limits.check_term("term_months", 481).is_err());
        assert!(limits.check_term("term_months", 0).is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "limits:\n  max_principal: \"500000.00\"\n  min_term_months: 6\n";
        let config = LendingConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.limits.max_principal, dec!(500000.00));
        assert_eq!(config.limits.min_term_months, 6);
        assert_eq!(config.limits.min_principal, dec!(1000.00));
        assert_eq!(config.limits.max_term_months, 480);
    }

    #[test]
    fn test_json_config_rejects_inverted_limits() {
        let json = r#"{"limits": {"min_principal": "5000", "max_principal": "1000"}}"#;
        match LendingConfig::from_json_str(json).unwrap_err() {
            LoanError::Config(msg) => assert!(msg.contains("min_principal")),
            other => panic!("Expected Config, got {other:?}"),
        }
    }
}
