//! Account state: cash, signed position and leverage ceilings.

use serde::{Deserialize, Serialize};

/// Mutable account owned by a single backtest run.
///
/// Ceilings start at `leverage * initial_capital` and are recomputed from
/// realized cash only when a position is fully closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    /// Positive = long shares, negative = short shares, zero = flat.
    pub position: f64,
    pub max_long_exposure: f64,
    pub max_short_exposure: f64,
}

impl AccountState {
    pub fn new(initial_capital: f64, leverage: f64) -> Self {
        Self {
            cash: initial_capital,
            position: 0.0,
            max_long_exposure: leverage * initial_capital,
            max_short_exposure: leverage * initial_capital,
        }
    }

    pub fn is_long(&self) -> bool {
        self.position > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.position < 0.0
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0.0
    }

    /// Mark-to-market stock value. Exactly zero when flat, whatever `close` is.
    pub fn stock_value(&self, close: f64) -> f64 {
        if self.is_flat() {
            0.0
        } else {
            self.position * close
        }
    }

    pub fn portfolio_value(&self, close: f64) -> f64 {
        self.cash + self.stock_value(close)
    }

    /// Reset both ceilings from current cash. Called after a full close.
    pub fn reset_ceilings(&mut self, leverage: f64) {
        self.max_long_exposure = leverage * self.cash;
        self.max_short_exposure = leverage * self.cash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_flat_with_levered_ceilings() {
        let acct = AccountState::new(10_000.0, 2.0);
        assert!(acct.is_flat());
        assert_eq!(acct.cash, 10_000.0);
        assert_eq!(acct.max_long_exposure, 20_000.0);
        assert_eq!(acct.max_short_exposure, 20_000.0);
    }

    #[test]
    fn stock_value_is_zero_when_flat_even_with_nan_close() {
        let acct = AccountState::new(10_000.0, 1.0);
        assert_eq!(acct.stock_value(f64::NAN), 0.0);
        assert_eq!(acct.portfolio_value(f64::NAN), 10_000.0);
    }

    #[test]
    fn short_position_has_negative_stock_value() {
        let mut acct = AccountState::new(10_000.0, 1.0);
        acct.position = -50.0;
        acct.cash = 15_000.0;
        assert_eq!(acct.stock_value(100.0), -5_000.0);
        assert_eq!(acct.portfolio_value(100.0), 10_000.0);
    }

    #[test]
    fn reset_ceilings_tracks_cash() {
        let mut acct = AccountState::new(10_000.0, 1.5);
        acct.cash = 12_000.0;
        acct.reset_ceilings(1.5);
        assert_eq!(acct.max_long_exposure, 18_000.0);
        assert_eq!(acct.max_short_exposure, 18_000.0);
    }
}
