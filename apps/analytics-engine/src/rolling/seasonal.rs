//! Quarter-of-year averages of rolling points.

use chrono::Datelike;

use super::types::{RollingPoint, SeasonalAverage};
use crate::metrics::math::mean;

/// Average rolling points by calendar quarter, Q1 through Q4.
///
/// Quarters without points are reported with `points = 0` and no values.
#[must_use]
pub fn seasonal_averages(points: &[RollingPoint]) -> Vec<SeasonalAverage> {
    (1..=4)
        .map(|quarter| {
            let in_quarter: Vec<&RollingPoint> = points
                .iter()
                .filter(|p| p.date.month0() / 3 + 1 == quarter)
                .collect();
            let avg = |field: fn(&RollingPoint) -> Option<f64>| {
                let values: Vec<f64> = in_quarter.iter().filter_map(|p| field(p)).collect();
                mean(&values)
            };

            SeasonalAverage {
                quarter,
                points: in_quarter.len(),
                win_rate: avg(|p| p.win_rate),
                profit_factor: avg(|p| p.profit_factor),
                sharpe: avg(|p| p.sharpe),
                kelly_pct: avg(|p| p.kelly_pct),
                avg_return_pct: avg(|p| p.avg_return_pct),
                net_pl: avg(|p| Some(p.net_pl)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn point(month: u32, win_rate: f64) -> RollingPoint {
        let Some(date) = NaiveDate::from_ymd_opt(2024, month, 1) else {
            panic!("invalid test date");
        };
        RollingPoint {
            index: 0,
            date,
            win_rate: Some(win_rate),
            profit_factor: None,
            sharpe: None,
            kelly_pct: None,
            avg_win: None,
            avg_loss: None,
            avg_return_pct: None,
            net_pl: 100.0,
            volatility: None,
        }
    }

    #[test]
    fn test_quarter_grouping() {
        let seasonal = seasonal_averages(&[point(1, 0.4), point(3, 0.6), point(8, 0.5)]);
        assert_eq!(seasonal.len(), 4);
        assert_eq!(seasonal[0].points, 2);
        assert_eq!(seasonal[0].win_rate, Some(0.5));
        assert_eq!(seasonal[1].points, 0);
        assert!(seasonal[1].win_rate.is_none());
        assert_eq!(seasonal[2].net_pl, Some(100.0));
        assert!(seasonal[0].sharpe.is_none());
    }
}
