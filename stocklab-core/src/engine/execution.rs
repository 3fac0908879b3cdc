//! Trade execution: the per-bar position/cash state machine.
//!
//! Rules are evaluated in priority order and at most one trade happens per bar:
//!
//! 1. Close: `Sell`/`CloseLong` while long, `Buy`/`CloseShort` while short.
//!    The whole position is closed and both ceilings reset to `leverage * cash`.
//! 2. Open/add long: `Buy` while flat or long, if
//!    `position * price + notional + fee <= max_long_exposure`.
//! 3. Open/add short: `Sell` while flat or short, if
//!    `-position * price + notional <= max_short_exposure`.
//! 4. Anything else leaves the account untouched.
//!
//! A directive only reaches the rules if it carries a price inside the bar's
//! `[low, high]` range.

use crate::domain::{AccountState, Action, AnnotatedBar, Fill, FillKind, SkipReason};
use crate::engine::error::ComputationError;
use crate::engine::state::EngineConfig;

/// What one bar's directive did to the account.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Directive was `Hold`.
    Idle,
    Filled(Fill),
    Skipped(SkipReason),
}

/// Apply one annotated bar's directive to the account.
///
/// On `Idle`/`Skipped` the account is unchanged. Errors leave the account in
/// an unspecified state; the caller aborts the run.
pub fn execute_directive(
    account: &mut AccountState,
    annotated: &AnnotatedBar,
    bar_index: usize,
    config: &EngineConfig,
) -> Result<StepOutcome, ComputationError> {
    let directive = &annotated.directive;
    let bar = &annotated.bar;

    if directive.action == Action::Hold {
        return Ok(StepOutcome::Idle);
    }
    let Some(price) = directive.price() else {
        return Ok(StepOutcome::Skipped(SkipReason::NoExecutePrice));
    };
    if !bar.contains_price(price) {
        return Ok(StepOutcome::Skipped(SkipReason::OutsideBarRange));
    }
    if price == 0.0 {
        return Err(ComputationError::ZeroExecutePrice { bar_index });
    }
    if price < 0.0 {
        return Err(ComputationError::NegativeExecutePrice { bar_index, price });
    }

    let fill = |account: &AccountState, kind, shares, notional, fee| Fill {
        bar_index,
        timestamp: bar.timestamp,
        kind,
        price,
        shares,
        notional,
        fee,
        cash_after: account.cash,
        position_after: account.position,
    };

    match directive.action {
        Action::Sell | Action::CloseLong if account.is_long() => {
            let shares = account.position;
            let proceeds = shares * price;
            let fee = config.fee.compute(proceeds);
            account.cash += proceeds - fee;
            account.position = 0.0;
            account.reset_ceilings(config.leverage);
            Ok(StepOutcome::Filled(fill(
                account,
                FillKind::CloseLong,
                shares,
                proceeds,
                fee,
            )))
        }
        Action::Buy | Action::CloseShort if account.is_short() => {
            let shares = -account.position;
            let cost = shares * price;
            let fee = config.fee.compute(cost);
            account.cash -= cost + fee;
            account.position = 0.0;
            account.reset_ceilings(config.leverage);
            Ok(StepOutcome::Filled(fill(
                account,
                FillKind::CloseShort,
                shares,
                cost,
                fee,
            )))
        }
        Action::CloseLong | Action::CloseShort => {
            Ok(StepOutcome::Skipped(SkipReason::NothingToClose))
        }
        Action::Buy => {
            let notional = opening_notional(directive.notional, bar_index)?;
            if let Some(reason) = unusable_notional(notional) {
                return Ok(StepOutcome::Skipped(reason));
            }
            let fee = config.fee.compute(notional);
            let committed = account.position * price + notional + fee;
            if committed > account.max_long_exposure {
                return Ok(StepOutcome::Skipped(SkipReason::ExposureLimit));
            }
            let shares = notional / price;
            account.cash -= notional + fee;
            account.position += shares;
            Ok(StepOutcome::Filled(fill(
                account,
                FillKind::OpenLong,
                shares,
                notional,
                fee,
            )))
        }
        Action::Sell => {
            let notional = opening_notional(directive.notional, bar_index)?;
            if let Some(reason) = unusable_notional(notional) {
                return Ok(StepOutcome::Skipped(reason));
            }
            let exposure = -account.position * price + notional;
            if exposure > account.max_short_exposure {
                return Ok(StepOutcome::Skipped(SkipReason::ExposureLimit));
            }
            let fee = config.fee.compute(notional);
            let shares = notional / price;
            account.cash += notional - fee;
            account.position -= shares;
            Ok(StepOutcome::Filled(fill(
                account,
                FillKind::OpenShort,
                shares,
                notional,
                fee,
            )))
        }
        Action::Hold => Ok(StepOutcome::Idle),
    }
}

fn opening_notional(notional: f64, bar_index: usize) -> Result<f64, ComputationError> {
    if !notional.is_finite() {
        return Err(ComputationError::InvalidNotional {
            bar_index,
            value: notional,
        });
    }
    Ok(notional)
}

/// Finite notionals that cannot open a position.
fn unusable_notional(notional: f64) -> Option<SkipReason> {
    if notional == 0.0 {
        Some(SkipReason::ZeroNotional)
    } else if notional < 0.0 {
        Some(SkipReason::NegativeNotional)
    } else {
        None
    }
}
