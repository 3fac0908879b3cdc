//! Engine error taxonomy.
//!
//! Configuration errors are raised before the first bar is processed.
//! Computation errors carry the index of the bar that produced them.
//! Both abort the run; the engine never skips a bad bar and continues.

use thiserror::Error;

/// Invalid input detected before simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("initial capital must be positive and finite, got {0}")]
    InvalidInitialCapital(f64),
    #[error("leverage must be finite and >= 1.0, got {0}")]
    InvalidLeverage(f64),
    #[error("fee amount must be finite and non-negative, got {0}")]
    InvalidFeeAmount(f64),
    #[error("unknown fee kind '{0}' (expected flat, '-', proportional or '%')")]
    InvalidFeeKind(String),
    #[error("risk-free rate must be finite, got {0}")]
    InvalidRiskFreeRate(f64),
    #[error("bar sequence is empty")]
    EmptyBars,
}

/// Numeric failure at a specific bar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("bar {bar_index}: execute price is zero")]
    ZeroExecutePrice { bar_index: usize },
    #[error("bar {bar_index}: execute price {price} is negative")]
    NegativeExecutePrice { bar_index: usize, price: f64 },
    #[error("bar {bar_index}: opening notional must be finite, got {value}")]
    InvalidNotional { bar_index: usize, value: f64 },
    #[error("bar {bar_index}: {field} is not finite ({value})")]
    NonFinite {
        bar_index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("bar {bar_index}: previous portfolio value is zero, period return is undefined")]
    ZeroPortfolioValue { bar_index: usize },
}

impl ComputationError {
    pub fn bar_index(&self) -> usize {
        match self {
            ComputationError::ZeroExecutePrice { bar_index }
            | ComputationError::NegativeExecutePrice { bar_index, .. }
            | ComputationError::InvalidNotional { bar_index, .. }
            | ComputationError::NonFinite { bar_index, .. }
            | ComputationError::ZeroPortfolioValue { bar_index } => *bar_index,
        }
    }
}

/// Any failure that aborts a backtest run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),
}
