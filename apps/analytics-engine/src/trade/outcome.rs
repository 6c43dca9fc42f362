//! Per-trade outcomes annotated with full-history return bases.
//!
//! Slices of outcomes (periods, windows, rolling windows) keep the equity base
//! reconstructed over the complete history, so a slice never re-bases equity
//! at its own first trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::Trade;
use super::returns::{
    MARGIN_RETURN_FLOOR, aligned_capital_returns, estimate_initial_capital, margin_return,
    sort_chronologically, validate_trades,
};
use crate::error::AnalyticsError;

/// A trade reduced to the values the statistical engines consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// Open date (period bucketing, windowing).
    pub date: NaiveDate,
    /// Close date, or open date when still open (daily aggregation).
    pub settled: NaiveDate,
    /// Realized P/L.
    pub pl: f64,
    /// Account equity before this trade.
    pub equity_before: f64,
    /// `pl / equity_before`, `None` when prior equity was not positive.
    pub capital_return: Option<f64>,
    /// Floored margin-based return, `None` without valid margin.
    pub margin_return: Option<f64>,
    /// Position size multiplier.
    pub num_contracts: u32,
    /// Strategy label.
    pub strategy: String,
}

impl TradeOutcome {
    /// Whether the trade made money.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.pl > 0.0
    }

    /// Whether the trade lost money.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.pl < 0.0
    }

    /// Scale P/L and returns by a sizing factor, keeping the equity base.
    ///
    /// The scaled margin return stays at or above [`MARGIN_RETURN_FLOOR`].
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            pl: self.pl * factor,
            capital_return: self.capital_return.map(|r| r * factor),
            margin_return: self
                .margin_return
                .map(|r| (r * factor).max(MARGIN_RETURN_FLOOR)),
            ..self.clone()
        }
    }
}

/// Build outcomes for chronologically sorted trades.
#[must_use]
pub fn trade_outcomes(sorted_trades: &[Trade], initial_capital: f64) -> Vec<TradeOutcome> {
    let capital_returns = aligned_capital_returns(sorted_trades, initial_capital);
    let mut equity = initial_capital;

    sorted_trades
        .iter()
        .zip(capital_returns)
        .map(|(trade, capital_return)| {
            let pl = trade.pl_f64();
            let outcome = TradeOutcome {
                date: trade.date_opened,
                settled: trade.settlement_date(),
                pl,
                equity_before: equity,
                capital_return,
                margin_return: margin_return(trade),
                num_contracts: trade.num_contracts,
                strategy: trade.strategy.clone(),
            };
            equity += pl;
            outcome
        })
        .collect()
}

/// A validated, chronologically sorted history with its outcomes.
#[derive(Debug, Clone)]
pub struct PreparedHistory {
    /// Sorted trades.
    pub trades: Vec<Trade>,
    /// Outcomes aligned with `trades`.
    pub outcomes: Vec<TradeOutcome>,
    /// Starting equity used for the capital bases.
    pub initial_capital: f64,
}

/// Validate, sort and annotate a trade collection.
///
/// Starting equity is estimated from the first trade when not given.
pub fn prepare_history(
    trades: &[Trade],
    initial_capital: Option<f64>,
) -> Result<PreparedHistory, AnalyticsError> {
    validate_trades(trades)?;
    let sorted = sort_chronologically(trades);
    let initial_capital = initial_capital.unwrap_or_else(|| estimate_initial_capital(&sorted));
    let outcomes = trade_outcomes(&sorted, initial_capital);

    Ok(PreparedHistory {
        trades: sorted,
        outcomes,
        initial_capital,
    })
}
