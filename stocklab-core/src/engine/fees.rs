//! Fee model: flat or proportional charge per executed trade.
//!
//! The fee is computed on the trade's notional and always reduces cash:
//! it lowers the proceeds of a sale or cover and raises the cost of a
//! purchase or short.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ConfigurationError;

/// How the fee amount is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    /// Fixed dollar amount per trade.
    Flat,
    /// Fraction of the trade notional (0.01 = 1%).
    Proportional,
}

impl FromStr for FeeKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "-" => Ok(FeeKind::Flat),
            "proportional" | "%" => Ok(FeeKind::Proportional),
            other => Err(ConfigurationError::InvalidFeeKind(other.to_string())),
        }
    }
}

/// Transaction fee specification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSpec {
    pub kind: FeeKind,
    pub amount: f64,
}

impl FeeSpec {
    pub fn new(kind: FeeKind, amount: f64) -> Self {
        Self { kind, amount }
    }

    pub fn flat(amount: f64) -> Self {
        Self::new(FeeKind::Flat, amount)
    }

    pub fn proportional(amount: f64) -> Self {
        Self::new(FeeKind::Proportional, amount)
    }

    pub fn frictionless() -> Self {
        Self::flat(0.0)
    }

    /// Fee charged on a trade of the given notional.
    pub fn compute(&self, notional: f64) -> f64 {
        match self.kind {
            FeeKind::Flat => self.amount,
            FeeKind::Proportional => notional * self.amount,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ConfigurationError::InvalidFeeAmount(self.amount));
        }
        Ok(())
    }
}

impl Default for FeeSpec {
    fn default() -> Self {
        Self::frictionless()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_charges_nothing() {
        let fee = FeeSpec::frictionless();
        assert_eq!(fee.compute(0.0), 0.0);
        assert_eq!(fee.compute(10_000.0), 0.0);
    }

    #[test]
    fn flat_fee_ignores_notional() {
        let fee = FeeSpec::flat(4.95);
        assert_eq!(fee.compute(100.0), 4.95);
        assert_eq!(fee.compute(1_000_000.0), 4.95);
    }

    #[test]
    fn proportional_fee_scales_with_notional() {
        let fee = FeeSpec::proportional(0.01);
        assert!((fee.compute(11_000.0) - 110.0).abs() < 1e-10);
    }

    #[test]
    fn parses_symbolic_and_named_kinds() {
        assert_eq!("-".parse::<FeeKind>().unwrap(), FeeKind::Flat);
        assert_eq!("Flat".parse::<FeeKind>().unwrap(), FeeKind::Flat);
        assert_eq!("%".parse::<FeeKind>().unwrap(), FeeKind::Proportional);
        assert_eq!(
            "proportional".parse::<FeeKind>().unwrap(),
            FeeKind::Proportional
        );
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let err = "bps".parse::<FeeKind>().unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidFeeKind("bps".into()));
    }

    #[test]
    fn negative_or_nan_amount_fails_validation() {
        assert!(FeeSpec::flat(-1.0).validate().is_err());
        assert!(FeeSpec::proportional(f64::NAN).validate().is_err());
        assert!(FeeSpec::proportional(0.005).validate().is_ok());
    }
}
