use super::directive::Action;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which transition an executed trade performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillKind {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl FillKind {
    pub fn is_close(&self) -> bool {
        matches!(self, FillKind::CloseLong | FillKind::CloseShort)
    }
}

/// Executed trade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub kind: FillKind,
    pub price: f64,
    /// Unsigned share count moved by this trade.
    pub shares: f64,
    /// Dollar value of the trade before fees.
    pub notional: f64,
    pub fee: f64,
    pub cash_after: f64,
    pub position_after: f64,
}

/// Why a non-`Hold` directive did not trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoExecutePrice,
    OutsideBarRange,
    ExposureLimit,
    NothingToClose,
    ZeroNotional,
    /// Opening directive with a negative size, e.g. an exit marker with nothing to exit.
    NegativeNotional,
}

/// A directive that was evaluated and did not trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDirective {
    pub bar_index: usize,
    pub action: Action,
    pub reason: SkipReason,
}
