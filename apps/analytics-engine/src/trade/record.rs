//! Canonical trade record.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A closed (or still open) options trade as supplied by the trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Calendar date the position was opened (exchange local date).
    pub date_opened: NaiveDate,
    /// Time of day the position was opened, used to order same-day trades.
    #[serde(default)]
    pub time_opened: Option<NaiveTime>,
    /// Calendar date the position was closed.
    #[serde(default)]
    pub date_closed: Option<NaiveDate>,
    /// Realized profit/loss in currency units.
    pub pl: Decimal,
    /// Margin required to hold the position. Valid only when strictly positive.
    #[serde(default)]
    pub margin_req: Option<Decimal>,
    /// Position size multiplier.
    #[serde(default = "default_contracts")]
    pub num_contracts: u32,
    /// Strategy label. Never used in calculations except strategy weighting.
    #[serde(default)]
    pub strategy: String,
    /// Account funds after the trade closed, when the log records it.
    #[serde(default)]
    pub funds_at_close: Option<Decimal>,
}

const fn default_contracts() -> u32 {
    1
}

impl Trade {
    /// Create a single-contract trade with no margin information.
    #[must_use]
    pub const fn new(date_opened: NaiveDate, pl: Decimal) -> Self {
        Self {
            date_opened,
            time_opened: None,
            date_closed: None,
            pl,
            margin_req: None,
            num_contracts: 1,
            strategy: String::new(),
            funds_at_close: None,
        }
    }

    /// Set the margin requirement.
    #[must_use]
    pub const fn with_margin(mut self, margin_req: Decimal) -> Self {
        self.margin_req = Some(margin_req);
        self
    }

    /// Set the contract count.
    #[must_use]
    pub const fn with_contracts(mut self, num_contracts: u32) -> Self {
        self.num_contracts = num_contracts;
        self
    }

    /// Set the strategy label.
    #[must_use]
    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = strategy.to_string();
        self
    }

    /// Set the close date.
    #[must_use]
    pub const fn with_date_closed(mut self, date_closed: NaiveDate) -> Self {
        self.date_closed = Some(date_closed);
        self
    }

    /// Set the open time.
    #[must_use]
    pub const fn with_time_opened(mut self, time_opened: NaiveTime) -> Self {
        self.time_opened = Some(time_opened);
        self
    }

    /// Set the account funds after close.
    #[must_use]
    pub const fn with_funds_at_close(mut self, funds: Decimal) -> Self {
        self.funds_at_close = Some(funds);
        self
    }

    /// P/L as a float for statistical work.
    #[must_use]
    pub fn pl_f64(&self) -> f64 {
        self.pl.to_f64().unwrap_or(0.0)
    }

    /// Margin requirement when strictly positive.
    #[must_use]
    pub fn valid_margin(&self) -> Option<f64> {
        self.margin_req
            .filter(|m| *m > Decimal::ZERO)
            .and_then(|m| m.to_f64())
    }

    /// Date used for daily aggregation: close date, else open date.
    #[must_use]
    pub fn settlement_date(&self) -> NaiveDate {
        self.date_closed.unwrap_or(self.date_opened)
    }

    /// Chronological sort key.
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date_opened, self.time_opened.unwrap_or_default())
    }
}
