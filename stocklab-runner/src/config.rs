//! Serializable backtest configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use stocklab_core::engine::{ConfigurationError, EngineConfig, FeeSpec, DEFAULT_RISK_FREE_RATE};
use stocklab_core::{BarFrequency, FeeKind};

use crate::sizing::QuantityMode;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from reading or interpreting a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Serializable configuration for a single backtest run.
///
/// Captures everything needed to reproduce a run except the bars:
/// - Capital, leverage and Sharpe inputs
/// - Fee model
/// - How the annotator's quantity column is converted into notional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub fees: FeesSection,
    #[serde(default)]
    pub sizing: SizingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    pub initial_capital: f64,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Bar frequency label (`1min`, `5min`, `15min`, `1H`, `1D`, `1W`, `1Y`).
    /// Unknown labels annualize as daily.
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

/// Fee section. `kind` is kept as text so both `flat`/`proportional` and the
/// shorthand `-`/`%` are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeesSection {
    #[serde(default = "default_fee_kind")]
    pub kind: String,
    #[serde(default)]
    pub amount: f64,
}

impl Default for FeesSection {
    fn default() -> Self {
        Self {
            kind: default_fee_kind(),
            amount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SizingSection {
    #[serde(default)]
    pub quantity_mode: QuantityMode,
}

fn default_leverage() -> f64 {
    1.0
}

fn default_risk_free_rate() -> f64 {
    DEFAULT_RISK_FREE_RATE
}

fn default_frequency() -> String {
    BarFrequency::Day1.label().to_string()
}

fn default_fee_kind() -> String {
    "flat".to_string()
}

impl BacktestConfig {
    /// Unlevered, fee-free daily config.
    pub fn new(initial_capital: f64) -> Self {
        Self {
            backtest: BacktestSection {
                initial_capital,
                leverage: default_leverage(),
                risk_free_rate: default_risk_free_rate(),
                frequency: default_frequency(),
            },
            fees: FeesSection::default(),
            sizing: SizingSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        Ok(config)
    }

    pub fn fee_spec(&self) -> Result<FeeSpec, ConfigurationError> {
        let kind: FeeKind = self.fees.kind.parse()?;
        Ok(FeeSpec::new(kind, self.fees.amount))
    }

    /// Resolve into the engine's config and validate it.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigurationError> {
        let config = EngineConfig::new(
            self.backtest.initial_capital,
            self.backtest.leverage,
            self.fee_spec()?,
        )
        .with_risk_free_rate(self.backtest.risk_free_rate)
        .with_frequency(BarFrequency::from_label_or_daily(&self.backtest.frequency));
        config.validate()?;
        Ok(config)
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Plain data with string keys; serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
