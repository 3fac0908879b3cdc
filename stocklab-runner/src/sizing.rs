//! Quantity sizing: turns an annotator's raw quantity into dollar notional.
//!
//! Annotators express trade size in different units. Sizing happens once,
//! before the engine runs; the engine never re-derives it.

use serde::{Deserialize, Serialize};

/// Unit of the raw quantity column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityMode {
    /// Fraction of the run's initial capital (1.0 = all of it).
    #[default]
    FractionOfInitialCapital,
    /// Share count, valued at the directive's execute price.
    Shares,
    /// Already in dollars.
    Notional,
}

impl QuantityMode {
    /// Dollar notional for `quantity` under this mode.
    ///
    /// In `Shares` mode a directive without a price sizes to zero.
    pub fn to_notional(
        self,
        quantity: f64,
        execute_price: Option<f64>,
        initial_capital: f64,
    ) -> f64 {
        match self {
            QuantityMode::FractionOfInitialCapital => quantity * initial_capital,
            QuantityMode::Shares => execute_price.map_or(0.0, |p| quantity * p),
            QuantityMode::Notional => quantity,
        }
    }
}
