//! Directive: per-bar trade intent attached by a signal annotator.

use super::bar::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the annotator wants done on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Cover a short, otherwise open or add to a long.
    Buy,
    /// Close a long, otherwise open or add to a short.
    Sell,
    /// No trade.
    Hold,
    /// Close an open long; ignored when not long.
    CloseLong,
    /// Cover an open short; ignored when not short.
    CloseShort,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "Buy",
            Action::Sell => "Sell",
            Action::Hold => "Hold",
            Action::CloseLong => "CloseLong",
            Action::CloseShort => "CloseShort",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a signal label is not one of the known actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal '{0}' (expected Buy, Sell, Hold, CloseLong or CloseShort)")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    /// Case-insensitive. An empty label is `Hold`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().replace(['_', ' '], "").as_str() {
            "" | "hold" => Ok(Action::Hold),
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "closelong" => Ok(Action::CloseLong),
            "closeshort" => Ok(Action::CloseShort),
            _ => Err(UnknownAction(trimmed.to_string())),
        }
    }
}

/// Trade intent for one bar.
///
/// `notional` is the dollar size of an opening trade, already resolved by
/// the caller from whatever capital reference the strategy uses. Closing
/// trades always close the full position and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub action: Action,
    /// `None` means no trade is attempted this bar.
    pub execute_price: Option<f64>,
    pub notional: f64,
}

impl Directive {
    pub fn hold() -> Self {
        Self {
            action: Action::Hold,
            execute_price: None,
            notional: 0.0,
        }
    }

    pub fn buy(execute_price: f64, notional: f64) -> Self {
        Self {
            action: Action::Buy,
            execute_price: Some(execute_price),
            notional,
        }
    }

    pub fn sell(execute_price: f64, notional: f64) -> Self {
        Self {
            action: Action::Sell,
            execute_price: Some(execute_price),
            notional,
        }
    }

    pub fn close_long(execute_price: f64) -> Self {
        Self {
            action: Action::CloseLong,
            execute_price: Some(execute_price),
            notional: 0.0,
        }
    }

    pub fn close_short(execute_price: f64) -> Self {
        Self {
            action: Action::CloseShort,
            execute_price: Some(execute_price),
            notional: 0.0,
        }
    }

    /// The execution price, treating NaN the same as a missing price.
    pub fn price(&self) -> Option<f64> {
        self.execute_price.filter(|p| !p.is_nan())
    }
}

impl Default for Directive {
    fn default() -> Self {
        Self::hold()
    }
}

/// A bar together with the directive the annotator attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub directive: Directive,
}

impl AnnotatedBar {
    pub fn new(bar: Bar, directive: Directive) -> Self {
        Self { bar, directive }
    }
}
