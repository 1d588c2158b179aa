//! Differencing, returns and their inversion.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// Apply differencing to a series.
///
/// # Arguments
/// * `series` - The input values
/// * `order` - Number of times to difference
///
/// # Returns
/// The differenced values, `order` elements shorter than the input
/// (empty when the input is not longer than `order`).
pub fn difference(series: &[f64], order: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..order {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Difference a dated series, dropping the first `order` timestamps.
pub fn difference_series(series: &TimeSeries, order: usize) -> Result<TimeSeries> {
    if series.len() <= order {
        return Err(ForecastError::InsufficientData {
            needed: order + 1,
            got: series.len(),
        });
    }
    series.with_dropped_prefix(order, difference(series.values(), order))
}

/// Reconstruct levels from differenced values.
///
/// `last_levels` holds the `order` levels observed immediately before the
/// first differenced value, oldest first; its length is the differencing
/// order. Seeding with the first `order` levels of a series inverts
/// [`difference`] exactly; seeding with the last `order` training levels
/// turns differenced forecasts into level forecasts.
///
/// # Example
/// ```
/// use anofox_fints::transform::{difference, invert};
///
/// let levels = vec![10.0, 12.0, 15.0, 19.0, 24.0];
/// let diffs = difference(&levels, 2);
/// assert_eq!(invert(&diffs, &levels[..2]), levels[2..].to_vec());
/// ```
pub fn invert(differenced: &[f64], last_levels: &[f64]) -> Vec<f64> {
    let order = last_levels.len();
    let mut result = differenced.to_vec();

    // Undo one difference at a time, innermost (highest) level first.
    for level in (0..order).rev() {
        let seed = difference(last_levels, level).last().copied().unwrap_or(0.0);
        let mut cumsum = seed;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}

/// Percentage returns `(y_t / y_{t-1} - 1) * 100`.
///
/// Fails on a zero price, which would produce an infinite return.
pub fn percent_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if let Some(pos) = prices[..prices.len().saturating_sub(1)]
        .iter()
        .position(|&p| p == 0.0)
    {
        return Err(ForecastError::InvalidParameter(format!(
            "zero price at index {} makes the next return undefined",
            pos
        )));
    }
    Ok(prices
        .windows(2)
        .map(|w| (w[1] / w[0] - 1.0) * 100.0)
        .collect())
}

/// Percentage returns of a dated price series; the first date is dropped.
pub fn percent_returns_series(prices: &TimeSeries) -> Result<TimeSeries> {
    if prices.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }
    prices.with_dropped_prefix(1, percent_returns(prices.values())?)
}

/// Log returns `ln(y_t / y_{t-1}) * 100`. Prices must be strictly positive.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.iter().any(|&p| p <= 0.0) {
        return Err(ForecastError::InvalidParameter(
            "log returns need strictly positive prices".to_string(),
        ));
    }
    Ok(prices
        .windows(2)
        .map(|w| (w[1] / w[0]).ln() * 100.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn difference_order_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_too_short() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[1.0, 2.0], 2).is_empty());
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn invert_continues_from_last_level() {
        let original = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let integrated = invert(&[6.0, 7.0], &original[original.len() - 1..]);
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn invert_order_2_continues_quadratic() {
        // Second differences of i^2 are constant 2
        let original: Vec<f64> = (0..6).map(|i| (i * i) as f64).collect();
        let integrated = invert(&[2.0, 2.0], &original[4..]);
        assert_relative_eq!(integrated[0], 36.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 49.0, epsilon = 1e-10);
    }

    #[test]
    fn invert_round_trips_difference() {
        let original = vec![101.3, 99.8, 102.4, 103.0, 101.1, 104.9, 106.2];
        for d in 0..=3 {
            let diffs = difference(&original, d);
            let rebuilt = invert(&diffs, &original[..d]);
            assert_eq!(rebuilt.len(), original.len() - d);
            for (a, b) in rebuilt.iter().zip(&original[d..]) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn percent_returns_matches_definition() {
        let returns = percent_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert_relative_eq!(returns[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(returns[1], -10.0, epsilon = 1e-12);
    }

    #[test]
    fn percent_returns_rejects_zero_price() {
        assert!(percent_returns(&[100.0, 0.0, 5.0]).is_err());
        // A trailing zero only appears as a numerator
        assert!(percent_returns(&[100.0, 0.0]).is_ok());
    }

    #[test]
    fn log_returns_rejects_non_positive() {
        assert!(log_returns(&[1.0, -1.0]).is_err());
        let r = log_returns(&[100.0, 101.0]).unwrap();
        assert_relative_eq!(r[0], 100.0 * 1.01_f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn series_transforms_drop_leading_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let prices =
            TimeSeries::from_business_days(start, vec![100.0, 102.0, 101.0, 103.0]).unwrap();

        let diff = difference_series(&prices, 1).unwrap();
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.timestamps()[0], prices.timestamps()[1]);
        assert_eq!(diff.values(), &[2.0, -1.0, 2.0]);

        let returns = percent_returns_series(&prices).unwrap();
        assert_eq!(returns.timestamps(), &prices.timestamps()[1..]);

        assert!(matches!(
            difference_series(&prices, 4),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
