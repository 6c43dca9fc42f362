//! Consecutive losing months.

use serde::{Deserialize, Serialize};

use super::segment::PeriodStats;

/// A run of consecutive losing months (months without trades skipped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LosingStreak {
    /// Months in the run.
    pub length: usize,
    /// First month label.
    pub start_month: String,
    /// Last month label.
    pub end_month: String,
    /// Summed loss over the run (positive magnitude).
    pub total_loss: f64,
}

/// Worst and current losing-month runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LosingMonthStreaks {
    /// Longest run; ties go to the larger loss, then the earlier run.
    pub worst: Option<LosingStreak>,
    /// Run ending at the latest traded month, if that month lost money.
    pub current: Option<LosingStreak>,
}

/// Find losing-month runs in chronologically ordered monthly stats.
#[must_use]
pub fn losing_month_streaks(months: &[PeriodStats]) -> LosingMonthStreaks {
    let mut worst: Option<LosingStreak> = None;
    let mut run: Option<LosingStreak> = None;

    for month in months {
        if month.net_pl < 0.0 {
            let streak = run.get_or_insert_with(|| LosingStreak {
                length: 0,
                start_month: month.label.clone(),
                end_month: month.label.clone(),
                total_loss: 0.0,
            });
            streak.length += 1;
            streak.end_month.clone_from(&month.label);
            streak.total_loss += -month.net_pl;
        } else if let Some(finished) = run.take() {
            worst = longer(worst, finished);
        }
    }

    if let Some(open) = &run {
        worst = longer(worst, open.clone());
    }

    LosingMonthStreaks {
        worst,
        current: run,
    }
}

fn longer(best: Option<LosingStreak>, candidate: LosingStreak) -> Option<LosingStreak> {
    match best {
        Some(current)
            if current.length > candidate.length
                || (current.length == candidate.length
                    && current.total_loss >= candidate.total_loss) =>
        {
            Some(current)
        }
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::periods::PeriodKind;

    fn month(label: &str, net_pl: f64) -> PeriodStats {
        let Some(day) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
            panic!("invalid test date");
        };
        PeriodStats {
            kind: PeriodKind::Month,
            label: label.to_string(),
            start: day,
            end: day,
            trade_count: 1,
            win_rate: None,
            profit_factor: None,
            kelly_pct: None,
            sharpe: None,
            avg_return_pct: None,
            net_pl,
            avg_win: None,
            avg_loss: None,
            days_covered: 1,
            partial: false,
        }
    }

    #[test]
    fn test_worst_and_current() {
        let months = vec![
            month("2024-01", -100.0),
            month("2024-02", -50.0),
            month("2024-03", -25.0),
            month("2024-04", 300.0),
            month("2024-06", -10.0),
        ];
        let streaks = losing_month_streaks(&months);

        let Some(worst) = streaks.worst else {
            panic!("worst streak should exist");
        };
        assert_eq!(worst.length, 3);
        assert_eq!(worst.start_month, "2024-01");
        assert_eq!(worst.end_month, "2024-03");
        assert!((worst.total_loss - 175.0).abs() < 1e-12);

        let Some(current) = streaks.current else {
            panic!("current streak should exist");
        };
        assert_eq!(current.length, 1);
        assert_eq!(current.start_month, "2024-06");
    }

    #[test]
    fn test_no_losing_months() {
        let streaks = losing_month_streaks(&[month("2024-01", 10.0), month("2024-02", 0.0)]);
        assert!(streaks.worst.is_none());
        assert!(streaks.current.is_none());
    }

    #[test]
    fn test_tie_prefers_larger_loss() {
        let months = vec![
            month("2024-01", -10.0),
            month("2024-02", 5.0),
            month("2024-03", -90.0),
            month("2024-04", 5.0),
        ];
        let Some(worst) = losing_month_streaks(&months).worst else {
            panic!("worst streak should exist");
        };
        assert_eq!(worst.start_month, "2024-03");
    }
}
