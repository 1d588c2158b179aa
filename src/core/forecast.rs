//! Forecast result structure for holding dated predictions.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// One dated forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub timestamp: NaiveDate,
    pub point: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// A forecast: point predictions with optional prediction intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    timestamps: Vec<NaiveDate>,
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    /// Confidence level of the interval, e.g. 0.95.
    level: Option<f64>,
}

impl Forecast {
    /// Create a forecast from point predictions.
    pub fn from_values(timestamps: Vec<NaiveDate>, point: Vec<f64>) -> Result<Self> {
        if timestamps.len() != point.len() {
            return Err(ForecastError::LengthMismatch {
                expected: timestamps.len(),
                got: point.len(),
            });
        }
        Ok(Self {
            timestamps,
            point,
            lower: None,
            upper: None,
            level: None,
        })
    }

    /// Create a forecast with prediction intervals at `level`.
    pub fn from_values_with_intervals(
        timestamps: Vec<NaiveDate>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        let n = timestamps.len();
        for len in [point.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(ForecastError::LengthMismatch {
                    expected: n,
                    got: len,
                });
            }
        }
        Ok(Self {
            timestamps,
            point,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Interval widths `upper - lower` per step, when intervals exist.
    pub fn interval_widths(&self) -> Option<Vec<f64>> {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(up)) => Some(up.iter().zip(lo).map(|(u, l)| u - l).collect()),
            _ => None,
        }
    }

    /// Iterate over dated rows.
    pub fn rows(&self) -> impl Iterator<Item = ForecastRow> + '_ {
        (0..self.horizon()).map(move |i| ForecastRow {
            timestamp: self.timestamps[i],
            point: self.point[i],
            lower: self.lower.as_ref().map(|l| l[i]),
            upper: self.upper.as_ref().map(|u| u[i]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::business_days_after;

    fn dates(n: usize) -> Vec<NaiveDate> {
        business_days_after(NaiveDate::from_ymd_opt(2025, 5, 16).unwrap(), n)
    }

    #[test]
    fn rows_carry_intervals() {
        let forecast = Forecast::from_values_with_intervals(
            dates(2),
            vec![10.0, 11.0],
            vec![9.0, 9.5],
            vec![11.0, 12.5],
            0.95,
        )
        .unwrap();

        let rows: Vec<_> = forecast.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].lower, Some(9.5));
        assert_eq!(rows[0].timestamp, NaiveDate::from_ymd_opt(2025, 5, 19).unwrap());
        assert_eq!(forecast.interval_widths(), Some(vec![2.0, 3.0]));
        assert_eq!(forecast.level(), Some(0.95));
    }

    #[test]
    fn point_only_forecast_has_no_intervals() {
        let forecast = Forecast::from_values(dates(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(!forecast.has_intervals());
        assert!(forecast.interval_widths().is_none());
        assert!(forecast.rows().all(|r| r.lower.is_none()));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(matches!(
            Forecast::from_values(dates(2), vec![1.0]),
            Err(ForecastError::LengthMismatch { .. })
        ));
        assert!(Forecast::from_values_with_intervals(
            dates(2),
            vec![1.0, 2.0],
            vec![0.0],
            vec![3.0, 4.0],
            0.9
        )
        .is_err());
    }
}
