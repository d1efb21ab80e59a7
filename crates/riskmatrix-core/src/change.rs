//! Change and distribution statistics over a value sequence.
//!
//! Every function here is pure. Offsets are negative observation counts
//! ("N observations before the last"); insufficient history yields `0.0`
//! so that an unknown change reads as neutral in the dashboard.

use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// How a window change is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMode {
    /// `(current - past) / past * 100`.
    Percent,
    /// `(current - past) * 100`, for series already quoted in percentage points.
    BasisPoints,
    /// `current - past`, for zero-centred index series.
    Absolute,
}

impl ChangeMode {
    pub fn apply(self, values: &[f64], offset: isize) -> f64 {
        match self {
            Self::Percent => percent_change(values, offset),
            Self::BasisPoints => basis_point_change(values, offset),
            Self::Absolute => absolute_change(values, offset),
        }
    }

    /// Statistic key suffix for this mode.
    pub const fn key_suffix(self) -> &'static str {
        match self {
            Self::Percent => "",
            Self::BasisPoints => "_bp",
            Self::Absolute => "_abs",
        }
    }
}

fn current_and_past(values: &[f64], offset: isize) -> Option<(f64, f64)> {
    let back = offset.unsigned_abs();
    if values.len() <= back {
        return None;
    }
    let current = *values.last()?;
    let past = values[values.len() - 1 - back];
    Some((current, past))
}

/// Percentage change between the latest value and the value `|offset|` observations back.
pub fn percent_change(values: &[f64], offset: isize) -> f64 {
    match current_and_past(values, offset) {
        Some((current, past)) if past != 0.0 => (current - past) / past * 100.0,
        _ => 0.0,
    }
}

/// Basis-point change for rate-like series.
pub fn basis_point_change(values: &[f64], offset: isize) -> f64 {
    match current_and_past(values, offset) {
        Some((current, past)) => (current - past) * 100.0,
        None => 0.0,
    }
}

/// Plain difference for series whose ratio is meaningless around zero.
pub fn absolute_change(values: &[f64], offset: isize) -> f64 {
    match current_and_past(values, offset) {
        Some((current, past)) => current - past,
        None => 0.0,
    }
}

/// Share of the trailing `window` observations (current included) at or below the latest value.
pub fn percentile_rank(values: &[f64], window: usize) -> Option<f64> {
    let current = *values.last()?;
    let start = values.len().saturating_sub(window.max(1));
    let trailing = &values[start..];
    let at_or_below = trailing.iter().filter(|value| **value <= current).count();
    Some(at_or_below as f64 / trailing.len() as f64 * 100.0)
}

/// Simple returns between consecutive values; pairs starting at zero are skipped.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

/// Annualized sample standard deviation of returns, in percent.
pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    Some(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Historical value-at-risk: the `pct` percentile of returns (linear interpolation), in percent.
pub fn historical_var(returns: &[f64], pct: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    let value = sorted[lower] + (sorted[upper] - sorted[lower]) * weight;
    Some(value * 100.0)
}

/// Rounds to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_uses_offset_from_last() {
        let values = [100.0, 110.0, 120.0];
        assert!((percent_change(&values, -2) - 20.0).abs() < 1e-9);
        assert!((percent_change(&values, -1) - 9.090909).abs() < 1e-5);
    }

    #[test]
    fn insufficient_history_is_neutral() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(percent_change(&values, -3), 0.0);
        assert_eq!(percent_change(&values, -10), 0.0);
        assert_eq!(basis_point_change(&values, -3), 0.0);
        assert_eq!(percent_change(&[], -1), 0.0);
    }

    #[test]
    fn zero_base_is_neutral() {
        assert_eq!(percent_change(&[0.0, 5.0], -1), 0.0);
    }

    #[test]
    fn basis_points_are_absolute_difference() {
        let values = [4.25, 4.10];
        assert!((basis_point_change(&values, -1) - (-15.0)).abs() < 1e-9);
        assert!((basis_point_change(&[0.0, 0.5], -1) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn percentile_counts_values_at_or_below_current() {
        let values = [1.0, 5.0, 3.0, 3.0];
        assert_eq!(percentile_rank(&values, 4), Some(75.0));
        assert_eq!(percentile_rank(&values, 2), Some(100.0));
        assert_eq!(percentile_rank(&[], 10), None);
    }

    #[test]
    fn volatility_requires_two_returns() {
        assert_eq!(annualized_volatility(&[0.01]), None);
        let flat = annualized_volatility(&[0.01, 0.01, 0.01]).expect("volatility");
        assert!(flat.abs() < 1e-12);
    }

    #[test]
    fn var_interpolates_like_numpy() {
        let returns = [-0.04, -0.02, 0.0, 0.01, 0.03];
        // rank = 0.05 * 4 = 0.2 -> -0.04 + 0.02 * 0.2
        let var = historical_var(&returns, 5.0).expect("var");
        assert!((var - (-3.6)).abs() < 1e-9);
    }
}
