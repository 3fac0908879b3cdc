//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Accounting identity: portfolio == cash + position * close on every bar
//! 2. Fill-range gating: no price or an out-of-range price never trades
//! 3. Ceiling resets: only after full closes, always leverage * cash
//! 4. Determinism: identical input yields an identical trajectory
//! 5. Flat fee correctness: each trade's cash delta shifts by exactly the fee

use chrono::NaiveDate;
use proptest::prelude::*;
use stocklab_core::domain::{Action, AnnotatedBar, Bar, Directive};
use stocklab_core::engine::{run_backtest, EngineConfig, FeeSpec};
use stocklab_core::AccountState;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Hold),
        3 => Just(Action::Buy),
        3 => Just(Action::Sell),
        1 => Just(Action::CloseLong),
        1 => Just(Action::CloseShort),
    ]
}

/// One bar step: close move, directive action, price offset within (or
/// beyond) the range, whether a price is present, and notional.
fn arb_step() -> impl Strategy<Value = (f64, Action, f64, bool, f64)> {
    (
        -0.05..0.05_f64,
        arb_action(),
        -1.5..1.5_f64,
        prop::bool::weighted(0.85),
        (0.0..6_000.0_f64).prop_map(|n| (n * 100.0).round() / 100.0),
    )
}

fn build_bars(steps: &[(f64, Action, f64, bool, f64)]) -> Vec<AnnotatedBar> {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let mut close = 100.0_f64;
    steps
        .iter()
        .enumerate()
        .map(|(i, &(ret, action, offset, has_price, notional))| {
            let open = close;
            close = (close * (1.0 + ret)).max(5.0);
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            // offset in [-1.5, 1.5] maps to [low - 0.25*range, high + 0.25*range]
            let mid = (high + low) / 2.0;
            let price = mid + offset * (high - low) / 2.0;
            let bar = Bar {
                timestamp: start + chrono::Duration::minutes(15 * i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000.0,
            };
            let directive = Directive {
                action,
                execute_price: has_price.then_some((price * 100.0).round() / 100.0),
                notional,
            };
            AnnotatedBar::new(bar, directive)
        })
        .collect()
}

fn arb_bars() -> impl Strategy<Value = Vec<AnnotatedBar>> {
    prop::collection::vec(arb_step(), 1..60).prop_map(|steps| build_bars(&steps))
}

fn arb_leverage() -> impl Strategy<Value = f64> {
    (1.0..3.0_f64).prop_map(|l| (l * 100.0).round() / 100.0)
}

proptest! {
    // ── 1. Accounting identity ───────────────────────────────────────

    #[test]
    fn portfolio_equals_cash_plus_stock(bars in arb_bars(), leverage in arb_leverage()) {
        let config = EngineConfig::new(10_000.0, leverage, FeeSpec::proportional(0.001));
        let result = run_backtest(&bars, &config).unwrap();
        prop_assert_eq!(result.trajectory.len(), bars.len());
        for (p, ab) in result.trajectory.points().iter().zip(&bars) {
            let scale = p.portfolio_value.abs().max(1.0);
            prop_assert!((p.portfolio_value - (p.cash + p.stock_value)).abs() <= 1e-9 * scale);
            prop_assert!((p.stock_value - p.position * ab.bar.close).abs() <= 1e-9 * scale);
        }
    }

    // ── 2. Fill-range gating ─────────────────────────────────────────

    #[test]
    fn untradeable_directives_change_nothing(bars in arb_bars(), leverage in arb_leverage()) {
        let config = EngineConfig::new(10_000.0, leverage, FeeSpec::flat(1.0));
        let result = run_backtest(&bars, &config).unwrap();
        let points = result.trajectory.points();
        for i in 0..bars.len() {
            let untradeable = match bars[i].directive.price() {
                None => true,
                Some(p) => !bars[i].bar.contains_price(p),
            };
            if untradeable {
                let (cash, position) = if i == 0 {
                    (10_000.0, 0.0)
                } else {
                    (points[i - 1].cash, points[i - 1].position)
                };
                prop_assert_eq!(points[i].cash, cash);
                prop_assert_eq!(points[i].position, position);
                prop_assert!(result.fills.iter().all(|f| f.bar_index != i));
            }
        }
    }

    // ── 3. Ceiling resets ────────────────────────────────────────────

    #[test]
    fn ceilings_reset_only_on_close(steps in prop::collection::vec(arb_step(), 1..30), leverage in arb_leverage()) {
        let bars = build_bars(&steps);
        let config = EngineConfig::new(10_000.0, leverage, FeeSpec::proportional(0.002));
        let mut previous = AccountState::new(10_000.0, leverage);
        for n in 1..=bars.len() {
            let result = run_backtest(&bars[..n], &config).unwrap();
            let acct = result.final_account;
            let closed = result
                .fills
                .last()
                .is_some_and(|f| f.bar_index == n - 1 && f.kind.is_close());
            if closed {
                prop_assert_eq!(acct.max_long_exposure, leverage * acct.cash);
                prop_assert_eq!(acct.max_short_exposure, leverage * acct.cash);
            } else {
                prop_assert_eq!(acct.max_long_exposure, previous.max_long_exposure);
                prop_assert_eq!(acct.max_short_exposure, previous.max_short_exposure);
            }
            previous = acct;
        }
    }

    // ── 4. Determinism ───────────────────────────────────────────────

    #[test]
    fn reruns_are_identical(bars in arb_bars(), leverage in arb_leverage()) {
        let config = EngineConfig::new(25_000.0, leverage, FeeSpec::proportional(0.005));
        let a = run_backtest(&bars, &config).unwrap();
        let b = run_backtest(&bars, &config).unwrap();
        prop_assert_eq!(a.fills.len(), b.fills.len());
        for (x, y) in a.trajectory.points().iter().zip(b.trajectory.points()) {
            prop_assert_eq!(x.portfolio_value.to_bits(), y.portfolio_value.to_bits());
            prop_assert_eq!(x.cash.to_bits(), y.cash.to_bits());
            prop_assert_eq!(x.position.to_bits(), y.position.to_bits());
        }
    }

    // ── 5. Flat fee correctness ──────────────────────────────────────

    #[test]
    fn flat_fee_shifts_each_trade_by_fee(bars in arb_bars(), fee in 0.0..25.0_f64) {
        let config = EngineConfig::new(10_000.0, 1.0, FeeSpec::flat(fee));
        let result = run_backtest(&bars, &config).unwrap();
        let points = result.trajectory.points();
        for fill in &result.fills {
            prop_assert_eq!(fill.fee, fee);
            let i = fill.bar_index;
            let before = if i == 0 { 10_000.0 } else { points[i - 1].cash };
            let delta = points[i].cash - before;
            let no_fee_delta = match fill.kind {
                stocklab_core::FillKind::OpenLong | stocklab_core::FillKind::CloseShort => -fill.notional,
                stocklab_core::FillKind::OpenShort | stocklab_core::FillKind::CloseLong => fill.notional,
            };
            let scale = before.abs().max(fill.notional).max(1.0);
            prop_assert!((no_fee_delta - delta - fee).abs() <= 1e-9 * scale);
        }
    }
}
