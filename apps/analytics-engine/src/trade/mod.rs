//! Trade & return model.
//!
//! Canonical trade record plus the pure functions that derive dollar,
//! capital-based and margin-based per-trade returns.

mod outcome;
mod record;
mod returns;

pub use outcome::{PreparedHistory, TradeOutcome, prepare_history, trade_outcomes};
pub use record::Trade;
pub use returns::{
    DEFAULT_INITIAL_CAPITAL, MARGIN_COVERAGE_THRESHOLD, MARGIN_RETURN_FLOOR, ReturnBasis,
    aligned_capital_returns, capital_returns, daily_capital_returns, daily_pl, dollar_returns,
    estimate_initial_capital, margin_coverage, margin_return, margin_returns,
    normalize_per_contract, per_trade_returns, should_use_margin_returns, sort_chronologically,
    validate_trades,
};
