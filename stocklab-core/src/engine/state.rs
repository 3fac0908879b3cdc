//! Engine configuration, mutable state, and run result types.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountState, Fill, SkippedDirective, Trajectory};
use crate::engine::error::ConfigurationError;
use crate::engine::fees::FeeSpec;
use crate::metrics::{BarFrequency, Summary};

/// Risk-free rate used when none is configured (annualized).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// Immutable configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// 1.0 = no leverage.
    pub leverage: f64,
    pub fee: FeeSpec,
    /// Annualized; de-annualized with the frequency's factor for Sharpe.
    pub risk_free_rate: f64,
    pub frequency: BarFrequency,
}

impl EngineConfig {
    pub fn new(initial_capital: f64, leverage: f64, fee: FeeSpec) -> Self {
        Self {
            initial_capital,
            leverage,
            fee,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            frequency: BarFrequency::Day1,
        }
    }

    /// Unlevered, fee-free config.
    pub fn frictionless(initial_capital: f64) -> Self {
        Self::new(initial_capital, 1.0, FeeSpec::frictionless())
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn with_frequency(mut self, frequency: BarFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Check every numeric precondition of a run.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigurationError::InvalidInitialCapital(
                self.initial_capital,
            ));
        }
        if !self.leverage.is_finite() || self.leverage < 1.0 {
            return Err(ConfigurationError::InvalidLeverage(self.leverage));
        }
        self.fee.validate()?;
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigurationError::InvalidRiskFreeRate(self.risk_free_rate));
        }
        Ok(())
    }
}

/// Mutable state that evolves bar-by-bar during one run.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub account: AccountState,
    pub trajectory: Trajectory,
    pub fills: Vec<Fill>,
    pub skipped: Vec<SkippedDirective>,
    /// Buy-and-hold share count, fixed from the first bar.
    pub benchmark_shares: Option<f64>,
}

impl EngineState {
    pub fn new(config: &EngineConfig, bar_count: usize) -> Self {
        Self {
            account: AccountState::new(config.initial_capital, config.leverage),
            trajectory: Trajectory::with_capacity(bar_count),
            fills: Vec::new(),
            skipped: Vec::new(),
            benchmark_shares: None,
        }
    }

    /// Portfolio value recorded for the previous bar, if any.
    pub fn previous_portfolio_value(&self) -> Option<f64> {
        self.trajectory.last().map(|p| p.portfolio_value)
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// One point per input bar.
    pub trajectory: Trajectory,
    /// Executed trades in bar order.
    pub fills: Vec<Fill>,
    /// Non-`Hold` directives that did not trade.
    pub skipped: Vec<SkippedDirective>,
    /// Account after the last bar.
    pub final_account: AccountState,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::frictionless(10_000.0);
        assert_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.leverage, 1.0);
        assert_eq!(config.risk_free_rate, DEFAULT_RISK_FREE_RATE);
        assert_eq!(config.frequency, BarFrequency::Day1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        for capital in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig::frictionless(capital);
            assert!(matches!(
                config.validate(),
                Err(ConfigurationError::InvalidInitialCapital(_))
            ));
        }
    }

    #[test]
    fn rejects_leverage_below_one() {
        let config = EngineConfig::new(10_000.0, 0.5, FeeSpec::frictionless());
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidLeverage(0.5))
        );
    }

    #[test]
    fn rejects_bad_fee_and_rate() {
        let config = EngineConfig::new(10_000.0, 1.0, FeeSpec::flat(-1.0));
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidFeeAmount(-1.0))
        );

        let config = EngineConfig::frictionless(10_000.0).with_risk_free_rate(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidRiskFreeRate(_))
        ));
    }

    #[test]
    fn engine_state_initial() {
        let config = EngineConfig::new(10_000.0, 2.0, FeeSpec::frictionless());
        let state = EngineState::new(&config, 5);
        assert_eq!(state.account.cash, 10_000.0);
        assert_eq!(state.account.max_long_exposure, 20_000.0);
        assert!(state.trajectory.is_empty());
        assert_eq!(state.previous_portfolio_value(), None);
    }
}
