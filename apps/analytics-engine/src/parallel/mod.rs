//! Parameter grids for walk-forward optimization.
//!
//! Cartesian combinations in a stable order, with counts that saturate
//! instead of overflowing so oversized grids are rejected before expansion.

mod grid;

pub use grid::{ParameterGrid, ParameterGridBuilder, ParameterSet, range_len};
