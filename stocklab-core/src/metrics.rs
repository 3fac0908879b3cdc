//! Performance metrics: pure functions over the finished trajectory.
//!
//! Mean and standard deviation are population estimators (divide by `n`)
//! computed once over the whole return series.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Trajectory;

/// Sampling frequency of the bar series, used to annualize the Sharpe ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarFrequency {
    #[serde(rename = "1min")]
    Minute1,
    #[serde(rename = "5min")]
    Minute5,
    #[serde(rename = "15min")]
    Minute15,
    #[serde(rename = "1H")]
    Hour1,
    #[default]
    #[serde(rename = "1D")]
    Day1,
    #[serde(rename = "1W")]
    Week1,
    #[serde(rename = "1Y")]
    Year1,
}

impl BarFrequency {
    pub const ALL: [BarFrequency; 7] = [
        BarFrequency::Minute1,
        BarFrequency::Minute5,
        BarFrequency::Minute15,
        BarFrequency::Hour1,
        BarFrequency::Day1,
        BarFrequency::Week1,
        BarFrequency::Year1,
    ];

    /// Return periods per year, assuming 252 sessions of 6.5 hours.
    pub fn annualization_factor(&self) -> f64 {
        match self {
            BarFrequency::Minute1 => 252.0 * 6.5 * 60.0,
            BarFrequency::Minute5 => 252.0 * 6.5 * 12.0,
            BarFrequency::Minute15 => 252.0 * 26.0,
            BarFrequency::Hour1 => 252.0 * 6.5,
            BarFrequency::Day1 => 252.0,
            BarFrequency::Week1 => 52.0,
            BarFrequency::Year1 => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BarFrequency::Minute1 => "1min",
            BarFrequency::Minute5 => "5min",
            BarFrequency::Minute15 => "15min",
            BarFrequency::Hour1 => "1H",
            BarFrequency::Day1 => "1D",
            BarFrequency::Week1 => "1W",
            BarFrequency::Year1 => "1Y",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label.trim())
    }

    /// Like `from_label`, but unknown labels fall back to daily.
    pub fn from_label_or_daily(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| {
            log::warn!("unknown bar frequency '{label}', annualizing as daily (252)");
            BarFrequency::Day1
        })
    }
}

/// Why a metric has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricUndefined {
    #[error("need at least 2 period returns, got {count}")]
    InsufficientData { count: usize },
    #[error("period returns have zero variance")]
    ZeroVariance,
}

/// Sharpe ratio as reported in a summary: either a number or the reason there is none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SharpeRatio {
    Defined { value: f64 },
    Undefined { reason: MetricUndefined },
}

impl SharpeRatio {
    pub fn value(&self) -> Option<f64> {
        match self {
            SharpeRatio::Defined { value } => Some(*value),
            SharpeRatio::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, SharpeRatio::Defined { .. })
    }
}

impl From<Result<f64, MetricUndefined>> for SharpeRatio {
    fn from(result: Result<f64, MetricUndefined>) -> Self {
        match result {
            Ok(value) => SharpeRatio::Defined { value },
            Err(reason) => SharpeRatio::Undefined { reason },
        }
    }
}

/// Summary statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub profit: f64,
    /// Percent, e.g. `8.9` for +8.9%.
    pub total_return_pct: f64,
    pub sharpe: SharpeRatio,
    pub fill_count: usize,
    pub bar_count: usize,
    /// Buy-and-hold over the same bars; `None` when the series has no usable
    /// benchmark values.
    #[serde(default)]
    pub benchmark: Option<BenchmarkSummary>,
}

/// Same headline numbers for holding the initial capital in the stock from
/// the first close to the last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub final_value: f64,
    pub profit: f64,
    pub total_return_pct: f64,
    pub sharpe: SharpeRatio,
}

impl BenchmarkSummary {
    /// Requires a finite, strictly positive benchmark value on every bar.
    pub fn compute(
        trajectory: &Trajectory,
        initial_capital: f64,
        risk_free_rate: f64,
        frequency: BarFrequency,
    ) -> Option<Self> {
        let values = trajectory.benchmark_values()?;
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return None;
        }
        let final_value = *values.last()?;
        let returns = period_returns(&values);
        Some(Self {
            final_value,
            profit: final_value - initial_capital,
            total_return_pct: total_return_pct(final_value, initial_capital),
            sharpe: sharpe_ratio(&returns, risk_free_rate, frequency.annualization_factor())
                .into(),
        })
    }
}

/// Shares bought with the whole initial capital at the first close.
pub fn buy_and_hold_shares(initial_capital: f64, first_close: f64) -> Option<f64> {
    (first_close.is_finite() && first_close > 0.0).then(|| initial_capital / first_close)
}

impl Summary {
    pub fn compute(
        trajectory: &Trajectory,
        initial_capital: f64,
        risk_free_rate: f64,
        frequency: BarFrequency,
        fill_count: usize,
    ) -> Self {
        let final_value = trajectory
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or(initial_capital);
        let returns = trajectory.returns();
        Self {
            initial_capital,
            final_value,
            profit: final_value - initial_capital,
            total_return_pct: total_return_pct(final_value, initial_capital),
            sharpe: sharpe_ratio(&returns, risk_free_rate, frequency.annualization_factor())
                .into(),
            fill_count,
            bar_count: trajectory.len(),
            benchmark: BenchmarkSummary::compute(
                trajectory,
                initial_capital,
                risk_free_rate,
                frequency,
            ),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent: `(final - initial) / initial * 100`.
pub fn total_return_pct(final_value: f64, initial_capital: f64) -> f64 {
    (final_value - initial_capital) / initial_capital * 100.0
}

/// Annualized Sharpe ratio.
///
/// `mean(r - rf/k) / std(r - rf/k) * sqrt(k)` with `k` the annualization
/// factor. Undefined for fewer than 2 returns or zero variance.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    annualization_factor: f64,
) -> Result<f64, MetricUndefined> {
    if returns.len() < 2 {
        return Err(MetricUndefined::InsufficientData {
            count: returns.len(),
        });
    }
    let period_rf = risk_free_rate / annualization_factor;
    let excess: Vec<f64> = returns.iter().map(|r| r - period_rf).collect();
    if excess.iter().all(|&r| r == excess[0]) {
        return Err(MetricUndefined::ZeroVariance);
    }
    let std = population_std_dev(&excess);
    if std == 0.0 {
        return Err(MetricUndefined::ZeroVariance);
    }
    Ok(mean_f64(&excess) / std * annualization_factor.sqrt())
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Period-over-period returns of a value series.
///
/// Unlike the engine loop, this helper does not guard against a zero
/// previous value; callers pass strictly positive series.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
