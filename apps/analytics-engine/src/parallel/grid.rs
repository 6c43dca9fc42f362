//! Parameter grid for grid search optimization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One combination of parameter values, keyed by parameter name.
pub type ParameterSet = BTreeMap<String, f64>;

/// Decimal places kept when expanding float ranges.
const RANGE_PRECISION: f64 = 1e10;

/// A parameter grid for grid search optimization.
///
/// Axes keep insertion order; the first axis varies slowest, so a
/// combination's index in [`ParameterGrid::combinations`] is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParameterGrid {
    /// Create a new parameter grid builder.
    #[must_use]
    pub fn builder() -> ParameterGridBuilder {
        ParameterGridBuilder::new()
    }

    /// Parameter names in axis order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(name, _)| name.as_str())
    }

    /// Get the total number of parameter combinations.
    ///
    /// Saturates at `usize::MAX` so oversized grids can be rejected
    /// without overflow.
    #[must_use]
    pub fn total_combinations(&self) -> usize {
        self.axes
            .iter()
            .try_fold(1usize, |acc, (_, values)| acc.checked_mul(values.len()))
            .unwrap_or(usize::MAX)
    }

    /// Generate all parameter combinations.
    ///
    /// A grid without axes yields one empty combination.
    #[must_use]
    pub fn combinations(&self) -> Vec<ParameterSet> {
        let mut result = vec![ParameterSet::new()];

        for (name, values) in &self.axes {
            let mut expanded = Vec::with_capacity(result.len() * values.len());
            for combo in &result {
                for value in values {
                    let mut next = combo.clone();
                    next.insert(name.clone(), *value);
                    expanded.push(next);
                }
            }
            result = expanded;
        }

        result
    }

    /// Check if grid has no axes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Builder for parameter grids.
#[derive(Debug, Default)]
pub struct ParameterGridBuilder {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParameterGridBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add explicit parameter values.
    #[must_use]
    pub fn add_param(mut self, name: &str, values: Vec<f64>) -> Self {
        self.axes.push((name.to_string(), values));
        self
    }

    /// Add an inclusive range `min, min + step, ..., ≤ max`.
    ///
    /// A non-positive step or `max < min` yields the single value `min`.
    #[must_use]
    pub fn add_range(self, name: &str, min: f64, max: f64, step: f64) -> Self {
        self.add_param(name, expand_range(min, max, step))
    }

    /// Build the parameter grid.
    #[must_use]
    pub fn build(self) -> ParameterGrid {
        ParameterGrid { axes: self.axes }
    }
}

/// Number of values an inclusive float range expands to.
///
/// Saturates at `usize::MAX` for ranges too fine to count, so callers can
/// reject them before expansion.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn range_len(min: f64, max: f64, step: f64) -> usize {
    if step <= 0.0 || max < min || !step.is_finite() {
        return 1;
    }
    // Tolerance absorbs float error at the upper bound
    let steps = ((max - min) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= usize::MAX as f64 {
        return usize::MAX;
    }
    (steps as usize).saturating_add(1)
}

fn expand_range(min: f64, max: f64, step: f64) -> Vec<f64> {
    (0..range_len(min, max, step))
        .map(|i| {
            let value = min + step * i as f64;
            (value * RANGE_PRECISION).round() / RANGE_PRECISION
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_grid_builder() {
        let grid = ParameterGrid::builder()
            .add_param("kelly_multiplier", vec![0.25, 0.5, 1.0])
            .add_param("max_drawdown_pct", vec![10.0, 20.0])
            .build();

        assert_eq!(grid.total_combinations(), 6);
        assert_eq!(
            grid.names().collect::<Vec<_>>(),
            vec!["kelly_multiplier", "max_drawdown_pct"]
        );
    }

    #[test]
    fn test_parameter_grid_combinations_order() {
        let grid = ParameterGrid::builder()
            .add_param("a", vec![1.0, 2.0])
            .add_param("b", vec![10.0, 20.0])
            .build();

        let combos = grid.combinations();
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[0].get("a"), Some(&1.0));
        assert_eq!(combos[0].get("b"), Some(&10.0));
        assert_eq!(combos[1].get("b"), Some(&20.0));
        assert_eq!(combos[3].get("a"), Some(&2.0));
    }

    #[test]
    fn test_float_range_inclusive() {
        let grid = ParameterGrid::builder()
            .add_range("kelly_multiplier", 0.1, 0.5, 0.1)
            .build();

        assert_eq!(grid.total_combinations(), 5);
        let combos = grid.combinations();
        assert_eq!(combos[2].get("kelly_multiplier"), Some(&0.3));
        assert_eq!(combos[4].get("kelly_multiplier"), Some(&0.5));
    }

    #[test]
    fn test_degenerate_range_is_single_value() {
        assert_eq!(range_len(1.0, 1.0, 0.5), 1);
        assert_eq!(range_len(1.0, 3.0, 0.0), 1);
        assert_eq!(range_len(3.0, 1.0, 1.0), 1);
    }

    #[test]
    fn test_range_len_saturates_for_tiny_step() {
        assert_eq!(range_len(0.0, 1.0, 1e-300), usize::MAX);
        assert_eq!(range_len(-f64::MAX, f64::MAX, 1.0), usize::MAX);
    }

    #[test]
    fn test_empty_grid_has_one_empty_combination() {
        let grid = ParameterGrid::default();
        assert!(grid.is_empty());
        assert_eq!(grid.combinations(), vec![ParameterSet::new()]);
    }

    #[test]
    fn test_total_combinations_saturates() {
        let big: Vec<f64> = (0..100_000).map(f64::from).collect();
        let grid = ParameterGrid::builder()
            .add_param("a", big.clone())
            .add_param("b", big.clone())
            .add_param("c", big.clone())
            .add_param("d", big)
            .build();
        assert_eq!(grid.total_combinations(), usize::MAX);
    }
}
