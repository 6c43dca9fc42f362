//! Numeric constants for metric calculations.

/// Trading days used to annualize daily Sharpe/Sortino.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;
/// Calendar days per year (Calmar annualization).
pub const DAYS_PER_YEAR: f64 = 365.0;
/// Denominators with magnitude below this are treated as zero.
pub const TOLERANCE: f64 = 1e-12;
/// Percent scale.
pub const HUNDRED: f64 = 100.0;
