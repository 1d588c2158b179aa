//! Accuracy metrics for out-of-sample forecast evaluation.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};

/// Error metrics over aligned actual and forecast values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Number of compared points
    pub n: usize,
}

/// Compare forecasts against held-out actuals.
///
/// # Example
/// ```
/// use anofox_fints::utils::evaluate;
///
/// let report = evaluate(&[1.0, 2.0, 3.0], &[1.5, 2.0, 2.0]).unwrap();
/// assert!((report.mae - 0.5).abs() < 1e-12);
/// ```
pub fn evaluate(actual: &[f64], forecast: &[f64]) -> Result<EvaluationReport> {
    if actual.len() != forecast.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            got: forecast.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.iter().chain(forecast).any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }

    Ok(EvaluationReport {
        mae: mae(actual, forecast),
        rmse: rmse(actual, forecast),
        n: actual.len(),
    })
}

/// Compare a point forecast against the held-out part of a series.
///
/// Besides lengths, the forecast timestamps must match the actual timestamps
/// one to one.
pub fn evaluate_series(actual: &TimeSeries, forecast: &Forecast) -> Result<EvaluationReport> {
    if actual.len() != forecast.horizon() {
        return Err(ForecastError::LengthMismatch {
            expected: actual.len(),
            got: forecast.horizon(),
        });
    }
    if let Some((a, f)) = actual
        .timestamps()
        .iter()
        .zip(forecast.timestamps())
        .find(|(a, f)| a != f)
    {
        return Err(ForecastError::TimestampError(format!(
            "forecast date {} does not match actual date {}",
            f, a
        )));
    }
    evaluate(actual.values(), forecast.point())
}

/// Absolute returns, the realized-volatility proxy volatility forecasts are
/// scored against.
pub fn realized_volatility(returns: &[f64]) -> Vec<f64> {
    returns.iter().map(|r| r.abs()).collect()
}

/// Mean Absolute Error; NaN for empty or unequal inputs.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Root Mean Squared Error; NaN for empty or unequal inputs.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}
