//! Rolling window generation and trade slicing.

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use super::types::{MAX_WINDOWS, WindowBounds, WindowConfig};
use crate::trade::TradeOutcome;

/// Outcomes falling in one window's ranges.
#[derive(Debug, Clone)]
pub struct WindowSlices {
    /// Window bounds.
    pub bounds: WindowBounds,
    /// In-sample outcomes.
    pub in_sample: Vec<TradeOutcome>,
    /// Out-of-sample outcomes.
    pub out_of_sample: Vec<TradeOutcome>,
}

impl WindowSlices {
    /// Whether both slices meet the configured trade minimums.
    #[must_use]
    pub fn is_sufficient(&self, config: &WindowConfig) -> bool {
        self.in_sample.len() >= config.min_in_sample_trades
            && self.out_of_sample.len() >= config.min_out_of_sample_trades
    }
}

/// Generate rolling windows in calendar days from `first`.
///
/// A window is emitted while its out-of-sample start is on or before `last`,
/// so the final out-of-sample range may extend past the data.
#[must_use]
pub fn generate_windows(first: NaiveDate, last: NaiveDate, config: &WindowConfig) -> Vec<WindowBounds> {
    let mut windows = Vec::new();
    let mut cursor = first;

    while windows.len() < MAX_WINDOWS {
        let Some(bounds) = window_at(windows.len(), cursor, config) else {
            break;
        };
        if bounds.out_of_sample_start > last {
            break;
        }
        windows.push(bounds);

        let Some(next) = cursor.checked_add_days(Days::new(u64::from(config.step_days.max(1))))
        else {
            break;
        };
        cursor = next;
    }

    if windows.len() == MAX_WINDOWS {
        warn!(max = MAX_WINDOWS, "Walk-forward window count capped");
    }

    debug!(
        windows = windows.len(),
        first = %first,
        last = %last,
        "Generated walk-forward windows"
    );

    windows
}

fn window_at(index: usize, cursor: NaiveDate, config: &WindowConfig) -> Option<WindowBounds> {
    let in_sample = u64::from(config.in_sample_days.max(1));
    let out_of_sample = u64::from(config.out_of_sample_days.max(1));

    let out_of_sample_start = cursor.checked_add_days(Days::new(in_sample))?;
    Some(WindowBounds {
        index,
        in_sample_start: cursor,
        in_sample_end: cursor.checked_add_days(Days::new(in_sample - 1))?,
        out_of_sample_start,
        out_of_sample_end: out_of_sample_start.checked_add_days(Days::new(out_of_sample - 1))?,
    })
}

/// Split outcomes into the window's in-sample and out-of-sample ranges.
#[must_use]
pub fn slice_window(outcomes: &[TradeOutcome], bounds: &WindowBounds) -> WindowSlices {
    let in_sample = outcomes
        .iter()
        .filter(|o| bounds.in_sample_contains(o.date))
        .cloned()
        .collect();
    let out_of_sample = outcomes
        .iter()
        .filter(|o| bounds.out_of_sample_contains(o.date))
        .cloned()
        .collect();

    WindowSlices {
        bounds: *bounds,
        in_sample,
        out_of_sample,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::trade::{Trade, trade_outcomes};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("invalid test date");
        };
        date
    }

    fn config(is: u32, oos: u32, step: u32) -> WindowConfig {
        WindowConfig {
            in_sample_days: is,
            out_of_sample_days: oos,
            step_days: step,
            min_in_sample_trades: 1,
            min_out_of_sample_trades: 1,
        }
    }

    #[test]
    fn test_window_bounds_are_contiguous() {
        let windows = generate_windows(date(2024, 1, 1), date(2024, 12, 31), &config(90, 30, 30));
        assert!(!windows.is_empty());

        let first = &windows[0];
        assert_eq!(first.in_sample_end, date(2024, 3, 30));
        assert_eq!(first.out_of_sample_start, date(2024, 3, 31));
        assert_eq!(first.out_of_sample_end, date(2024, 4, 29));

        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.index, i);
            assert!(window.in_sample_start <= window.in_sample_end);
            assert!(window.in_sample_end < window.out_of_sample_start);
        }
        assert_eq!(windows[1].in_sample_start, date(2024, 1, 31));
    }

    #[test]
    fn test_trailing_partial_window_allowed() {
        // OOS of the last window starts on the last date and runs past it
        let windows = generate_windows(date(2024, 1, 1), date(2024, 1, 11), &config(10, 30, 30));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].out_of_sample_start, date(2024, 1, 11));
        assert_eq!(windows[0].out_of_sample_end, date(2024, 2, 9));
    }

    #[test]
    fn test_too_short_history_has_no_windows() {
        let windows = generate_windows(date(2024, 1, 1), date(2024, 1, 5), &config(10, 5, 5));
        assert!(windows.is_empty());
    }

    #[test]
    fn test_window_cap() {
        let windows = generate_windows(date(2000, 1, 1), date(2024, 1, 1), &config(1, 1, 1));
        assert_eq!(windows.len(), MAX_WINDOWS);
    }

    #[test]
    fn test_slice_and_sufficiency() {
        let trades: Vec<Trade> = (1..=20)
            .map(|d| Trade::new(date(2024, 1, d), Decimal::from(10)))
            .collect();
        let outcomes = trade_outcomes(&trades, 10_000.0);
        let windows = generate_windows(date(2024, 1, 1), date(2024, 1, 20), &config(10, 5, 5));

        let slices = slice_window(&outcomes, &windows[0]);
        assert_eq!(slices.in_sample.len(), 10);
        assert_eq!(slices.out_of_sample.len(), 5);

        let strict = WindowConfig {
            min_out_of_sample_trades: 6,
            ..config(10, 5, 5)
        };
        assert!(slices.is_sufficient(&config(10, 5, 5)));
        assert!(!slices.is_sufficient(&strict));
    }
}
