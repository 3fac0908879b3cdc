//! Bar loop: folds annotated bars into a trajectory.
//!
//! Per bar: execute the directive, mark to market at the close, append the
//! snapshot and derive the period return from the previous snapshot. The loop
//! does no I/O and shares no state with other runs.

use crate::domain::{AnnotatedBar, SkippedDirective, TrajectoryPoint};
use crate::engine::error::{ComputationError, ConfigurationError, EngineError};
use crate::engine::execution::{execute_directive, StepOutcome};
use crate::engine::state::{BacktestResult, EngineConfig, EngineState};
use crate::metrics::{buy_and_hold_shares, SharpeRatio, Summary};

/// Run a full backtest over `bars`.
///
/// Fails before the first bar on an invalid config or empty input, and at
/// the offending bar on a numeric failure.
pub fn run_backtest(
    bars: &[AnnotatedBar],
    config: &EngineConfig,
) -> Result<BacktestResult, EngineError> {
    config.validate()?;
    if bars.is_empty() {
        return Err(ConfigurationError::EmptyBars.into());
    }

    let mut state = EngineState::new(config, bars.len());
    state.benchmark_shares = buy_and_hold_shares(config.initial_capital, bars[0].bar.close);
    for (bar_index, annotated) in bars.iter().enumerate() {
        process_bar(&mut state, annotated, bar_index, config)?;
    }

    let summary = Summary::compute(
        &state.trajectory,
        config.initial_capital,
        config.risk_free_rate,
        config.frequency,
        state.fills.len(),
    );
    log_summary(&summary);

    Ok(BacktestResult {
        trajectory: state.trajectory,
        fills: state.fills,
        skipped: state.skipped,
        final_account: state.account,
        summary,
    })
}

fn process_bar(
    state: &mut EngineState,
    annotated: &AnnotatedBar,
    bar_index: usize,
    config: &EngineConfig,
) -> Result<(), ComputationError> {
    match execute_directive(&mut state.account, annotated, bar_index, config)? {
        StepOutcome::Idle => {}
        StepOutcome::Filled(fill) => {
            log::debug!(
                "bar {bar_index}: {:?} {:.4} shares @ {:.4} (fee {:.4}), cash {:.2}, position {:.4}",
                fill.kind,
                fill.shares,
                fill.price,
                fill.fee,
                fill.cash_after,
                fill.position_after
            );
            state.fills.push(fill);
        }
        StepOutcome::Skipped(reason) => {
            log::trace!(
                "bar {bar_index}: {} skipped ({reason:?})",
                annotated.directive.action
            );
            state.skipped.push(SkippedDirective {
                bar_index,
                action: annotated.directive.action,
                reason,
            });
        }
    }

    let account = &state.account;
    let stock_value = account.stock_value(annotated.bar.close);
    let portfolio_value = account.cash + stock_value;
    if !portfolio_value.is_finite() {
        return Err(ComputationError::NonFinite {
            bar_index,
            field: "portfolio_value",
            value: portfolio_value,
        });
    }

    let period_return = match state.previous_portfolio_value() {
        None => None,
        Some(prev) if prev == 0.0 => {
            return Err(ComputationError::ZeroPortfolioValue { bar_index });
        }
        Some(prev) => Some((portfolio_value - prev) / prev),
    };

    state.trajectory.push(TrajectoryPoint {
        bar_index,
        timestamp: annotated.bar.timestamp,
        cash: account.cash,
        position: account.position,
        stock_value,
        portfolio_value,
        period_return,
        benchmark_value: state
            .benchmark_shares
            .map(|shares| shares * annotated.bar.close)
            .filter(|v| v.is_finite()),
    });
    Ok(())
}

fn log_summary(summary: &Summary) {
    let sharpe = match summary.sharpe {
        SharpeRatio::Defined { value } => format!("{value:.2}"),
        SharpeRatio::Undefined { reason } => format!("undefined ({reason})"),
    };
    log::info!(
        "final portfolio value ${:.2}, profit ${:.2}, return {:.2}%, sharpe {sharpe}",
        summary.final_value,
        summary.profit,
        summary.total_return_pct
    );
    if let Some(b) = &summary.benchmark {
        log::info!(
            "buy & hold value ${:.2}, profit ${:.2}, return {:.2}%",
            b.final_value,
            b.profit,
            b.total_return_pct
        );
    }
}
