//! Per-trade return derivations.
//!
//! Three conventions are supported:
//! - **Dollar**: raw P/L, summed additively downstream.
//! - **Capital**: `pl / prior_equity`, with equity rebuilt by a running sum
//!   from the initial capital.
//! - **Margin**: `pl / margin_req`, skipping trades without positive margin
//!   and flooring each result at [`MARGIN_RETURN_FLOOR`].
//!
//! All functions expect trades in chronological order (see
//! [`sort_chronologically`]) and never mutate their input.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::record::Trade;
use crate::error::AnalyticsError;

/// Lowest margin-based return a single trade may contribute.
pub const MARGIN_RETURN_FLOOR: f64 = -0.99;

/// Share of trades that must carry valid margin before margin returns are used.
pub const MARGIN_COVERAGE_THRESHOLD: f64 = 0.90;

/// Starting capital assumed when the trade log does not imply one.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Return convention used to build a resample pool or per-trade return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnBasis {
    /// Raw P/L in currency units.
    Dollar,
    /// P/L over equity before the trade.
    #[default]
    Capital,
    /// P/L over margin requirement, floored.
    Margin,
}

/// Return a chronologically sorted copy of the trades.
///
/// Sorting is stable: trades sharing a date and open time keep input order.
#[must_use]
pub fn sort_chronologically(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by_key(Trade::sort_key);
    sorted
}

/// Reject trades that violate the data model.
pub fn validate_trades(trades: &[Trade]) -> Result<(), AnalyticsError> {
    for (index, trade) in trades.iter().enumerate() {
        if let Some(closed) = trade.date_closed
            && closed < trade.date_opened
        {
            return Err(AnalyticsError::MalformedTrade {
                index,
                reason: format!(
                    "date_closed {closed} precedes date_opened {}",
                    trade.date_opened
                ),
            });
        }
    }
    Ok(())
}

/// Raw P/L per trade.
#[must_use]
pub fn dollar_returns(trades: &[Trade]) -> Vec<f64> {
    trades.iter().map(Trade::pl_f64).collect()
}

/// Capital-based return per trade, aligned with the input.
///
/// `None` marks trades whose prior equity was not positive.
#[must_use]
pub fn aligned_capital_returns(trades: &[Trade], initial_capital: f64) -> Vec<Option<f64>> {
    let mut equity = initial_capital;
    let mut skipped = 0usize;

    let returns = trades
        .iter()
        .map(|trade| {
            let pl = trade.pl_f64();
            let ret = if equity > 0.0 {
                Some(pl / equity)
            } else {
                skipped += 1;
                None
            };
            equity += pl;
            ret
        })
        .collect();

    if skipped > 0 {
        warn!(
            skipped,
            initial_capital, "Capital-based returns undefined after equity reached zero"
        );
    }

    returns
}

/// Capital-based returns (`pl / prior_equity`), skipping undefined ones.
#[must_use]
pub fn capital_returns(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    aligned_capital_returns(trades, initial_capital)
        .into_iter()
        .flatten()
        .collect()
}

/// Margin-based return for a single trade, floored at [`MARGIN_RETURN_FLOOR`].
#[must_use]
pub fn margin_return(trade: &Trade) -> Option<f64> {
    let margin = trade.valid_margin()?;
    Some((trade.pl_f64() / margin).max(MARGIN_RETURN_FLOOR))
}

/// Margin-based returns, excluding trades without positive margin.
#[must_use]
pub fn margin_returns(trades: &[Trade]) -> Vec<f64> {
    trades.iter().filter_map(margin_return).collect()
}

/// Per-trade returns aligned with the input under a given basis.
#[must_use]
pub fn per_trade_returns(
    trades: &[Trade],
    basis: ReturnBasis,
    initial_capital: f64,
) -> Vec<Option<f64>> {
    match basis {
        ReturnBasis::Dollar => trades.iter().map(|t| Some(t.pl_f64())).collect(),
        ReturnBasis::Capital => aligned_capital_returns(trades, initial_capital),
        ReturnBasis::Margin => trades.iter().map(margin_return).collect(),
    }
}

/// Fraction of trades with a valid margin requirement (`None` when empty).
#[must_use]
pub fn margin_coverage(trades: &[Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let with_margin = trades.iter().filter(|t| t.valid_margin().is_some()).count();
    Some(with_margin as f64 / trades.len() as f64)
}

/// Whether margin-based returns should replace capital-based ones.
#[must_use]
pub fn should_use_margin_returns(trades: &[Trade]) -> bool {
    margin_coverage(trades).is_some_and(|c| c >= MARGIN_COVERAGE_THRESHOLD)
}

/// Divide each trade's P/L by its contract count.
///
/// Trades with zero contracts pass through unchanged.
#[must_use]
pub fn normalize_per_contract(trades: &[Trade]) -> Vec<Trade> {
    trades
        .iter()
        .map(|trade| {
            if trade.num_contracts == 0 {
                return trade.clone();
            }
            let mut normalized = trade.clone();
            normalized.pl = trade.pl / Decimal::from(trade.num_contracts);
            normalized
        })
        .collect()
}

/// Starting capital implied by the first trade's recorded funds.
///
/// Falls back to [`DEFAULT_INITIAL_CAPITAL`] when funds are missing or the
/// implied value is not positive.
#[must_use]
pub fn estimate_initial_capital(sorted_trades: &[Trade]) -> f64 {
    let implied = sorted_trades
        .first()
        .and_then(|t| t.funds_at_close.map(|funds| funds - t.pl))
        .and_then(|capital| capital.to_f64());

    match implied {
        Some(capital) if capital > 0.0 => capital,
        _ => DEFAULT_INITIAL_CAPITAL,
    }
}

/// Net P/L grouped by settlement date, in date order.
#[must_use]
pub fn daily_pl(trades: &[Trade]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *by_day.entry(trade.settlement_date()).or_insert(0.0) += trade.pl_f64();
    }
    by_day.into_iter().collect()
}

/// Daily returns relative to equity at the start of each day.
///
/// Days starting with non-positive equity are skipped.
#[must_use]
pub fn daily_capital_returns(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    let mut equity = initial_capital;
    let mut returns = Vec::new();
    for (_, pl) in daily_pl(trades) {
        if equity > 0.0 {
            returns.push(pl / equity);
        }
        equity += pl;
    }
    returns
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 1, d) else {
            panic!("invalid test date");
        };
        date
    }

    #[test]
    fn test_margin_floor() {
        let trade = Trade::new(day(2), dec!(-6000)).with_margin(dec!(5000));
        assert_eq!(margin_return(&trade), Some(-0.99));
    }

    #[test_case(dec!(500), dec!(1000), Some(0.5) ; "gain")]
    #[test_case(dec!(-250), dec!(1000), Some(-0.25) ; "loss above floor")]
    #[test_case(dec!(-1000), dec!(1000), Some(-0.99) ; "total loss floored")]
    #[test_case(dec!(100), dec!(0), None ; "zero margin excluded")]
    #[test_case(dec!(100), dec!(-5), None ; "negative margin excluded")]
    fn test_margin_return_cases(pl: Decimal, margin: Decimal, expected: Option<f64>) {
        let trade = Trade::new(day(2), pl).with_margin(margin);
        assert_eq!(margin_return(&trade), expected);
    }

    #[test]
    fn test_margin_returns_skip_but_dollar_keeps() {
        let trades = vec![
            Trade::new(day(2), dec!(100)).with_margin(dec!(1000)),
            Trade::new(day(3), dec!(-50)),
            Trade::new(day(4), dec!(200)).with_margin(dec!(0)),
        ];
        assert_eq!(margin_returns(&trades), vec![0.1]);
        assert_eq!(dollar_returns(&trades), vec![100.0, -50.0, 200.0]);
    }

    #[test]
    fn test_capital_returns_use_prior_equity() {
        let trades = vec![
            Trade::new(day(2), dec!(1000)),
            Trade::new(day(3), dec!(-1100)),
        ];
        let returns = capital_returns(&trades, 10_000.0);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_capital_returns_undefined_after_ruin() {
        let trades = vec![
            Trade::new(day(2), dec!(-1000)),
            Trade::new(day(3), dec!(50)),
        ];
        let aligned = aligned_capital_returns(&trades, 1000.0);
        assert_eq!(aligned, vec![Some(-1.0), None]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let trades = vec![
            Trade::new(day(5), dec!(1)).with_strategy("a"),
            Trade::new(day(2), dec!(2)).with_strategy("b"),
            Trade::new(day(5), dec!(3)).with_strategy("c"),
        ];
        let sorted = sort_chronologically(&trades);
        let labels: Vec<&str> = sorted.iter().map(|t| t.strategy.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        // Input untouched
        assert_eq!(trades[0].strategy, "a");
    }

    #[test]
    fn test_margin_coverage_threshold() {
        let mut trades: Vec<Trade> = (1..=9)
            .map(|d| Trade::new(day(d), dec!(10)).with_margin(dec!(100)))
            .collect();
        trades.push(Trade::new(day(10), dec!(10)));
        assert_eq!(margin_coverage(&trades), Some(0.9));
        assert!(should_use_margin_returns(&trades));

        trades.push(Trade::new(day(11), dec!(10)));
        assert!(!should_use_margin_returns(&trades));
        assert!(margin_coverage(&[]).is_none());
    }

    #[test]
    fn test_normalize_per_contract() {
        let trades = vec![
            Trade::new(day(2), dec!(300)).with_contracts(3),
            Trade::new(day(3), dec!(-40)).with_contracts(0),
        ];
        let normalized = normalize_per_contract(&trades);
        assert_eq!(normalized[0].pl, dec!(100));
        assert_eq!(normalized[1].pl, dec!(-40));
    }

    #[test]
    fn test_estimate_initial_capital() {
        let trades = vec![Trade::new(day(2), dec!(500)).with_funds_at_close(dec!(50500))];
        assert_eq!(estimate_initial_capital(&trades), 50_000.0);

        let no_funds = vec![Trade::new(day(2), dec!(500))];
        assert_eq!(estimate_initial_capital(&no_funds), DEFAULT_INITIAL_CAPITAL);

        let negative = vec![Trade::new(day(2), dec!(500)).with_funds_at_close(dec!(100))];
        assert_eq!(estimate_initial_capital(&negative), DEFAULT_INITIAL_CAPITAL);
    }

    #[test]
    fn test_daily_pl_groups_by_settlement() {
        let trades = vec![
            Trade::new(day(2), dec!(100)).with_date_closed(day(4)),
            Trade::new(day(3), dec!(-30)).with_date_closed(day(4)),
            Trade::new(day(5), dec!(20)),
        ];
        assert_eq!(daily_pl(&trades), vec![(day(4), 70.0), (day(5), 20.0)]);
    }

    #[test]
    fn test_malformed_trade_rejected() {
        let trades = vec![
            Trade::new(day(2), dec!(1)),
            Trade::new(day(9), dec!(1)).with_date_closed(day(3)),
        ];
        let Err(AnalyticsError::MalformedTrade { index, .. }) = validate_trades(&trades) else {
            panic!("expected malformed trade error");
        };
        assert_eq!(index, 1);
    }

    proptest! {
        #[test]
        fn prop_margin_return_never_below_floor(pl in -1_000_000i64..1_000_000, margin in 1i64..100_000) {
            let trade = Trade::new(day(2), Decimal::from(pl)).with_margin(Decimal::from(margin));
            let Some(ret) = margin_return(&trade) else {
                panic!("positive margin must yield a return");
            };
            prop_assert!(ret >= MARGIN_RETURN_FLOOR);
        }
    }
}
