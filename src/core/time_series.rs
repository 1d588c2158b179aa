//! TimeSeries data structure for date-indexed observations.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Check whether a date falls on a weekday (Monday to Friday).
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while !is_business_day(next) {
        next += Duration::days(1);
    }
    next
}

/// The `count` business days following `date`, excluding `date` itself.
///
/// Matches a `freq='B'` date range started the day after the last observation.
pub fn business_days_after(date: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = date;
    for _ in 0..count {
        current = next_business_day(current);
        dates.push(current);
    }
    dates
}

/// A univariate series of values indexed by business dates.
///
/// Timestamps are strictly increasing, fall on weekdays, and every value is
/// finite. Exchange holidays may leave gaps between consecutive business days;
/// use [`TimeSeries::is_gap_free`] when a strict calendar is required.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series from parallel timestamp and value vectors.
    pub fn new(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::LengthMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for (i, date) in timestamps.iter().enumerate() {
            if !is_business_day(*date) {
                return Err(ForecastError::TimestampError(format!(
                    "{} is not a business day",
                    date
                )));
            }
            if i > 0 && *date <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Create a series from `(date, value)` pairs.
    pub fn from_observations(observations: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let (timestamps, values) = observations.into_iter().unzip();
        Self::new(timestamps, values)
    }

    /// Create a gap-free series on consecutive business days.
    ///
    /// A weekend `start` is rolled forward to the following Monday.
    pub fn from_business_days(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Self::new(Vec::new(), values);
        }
        let first = if is_business_day(start) {
            start
        } else {
            next_business_day(start)
        };
        let mut timestamps = Vec::with_capacity(values.len());
        timestamps.push(first);
        timestamps.extend(business_days_after(first, values.len() - 1));
        Self::new(timestamps, values)
    }

    /// Attach a label (typically the ticker symbol).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate over `(date, value)` pairs in time order.
    pub fn observations(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// True when every step advances exactly one business day.
    pub fn is_gap_free(&self) -> bool {
        self.timestamps
            .windows(2)
            .all(|w| next_business_day(w[0]) == w[1])
    }

    /// Extract observations `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: end,
                got: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// The last `n` observations.
    pub fn tail(&self, n: usize) -> Result<TimeSeries> {
        if n > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: n,
                got: self.len(),
            });
        }
        self.slice(self.len() - n, self.len())
    }

    /// Split into a training head and a held-out tail of `holdout` observations.
    pub fn train_test_split(&self, holdout: usize) -> Result<(TimeSeries, TimeSeries)> {
        if holdout == 0 {
            return Err(ForecastError::InvalidParameter(
                "holdout must be positive".to_string(),
            ));
        }
        if holdout >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: holdout + 1,
                got: self.len(),
            });
        }
        let cut = self.len() - holdout;
        Ok((self.slice(0, cut)?, self.slice(cut, self.len())?))
    }

    /// Build a series that keeps the dates from `skip` onward with new values.
    ///
    /// Used by transforms that shorten the series from the front.
    pub(crate) fn with_dropped_prefix(&self, skip: usize, values: Vec<f64>) -> Result<TimeSeries> {
        let timestamps = self.timestamps.get(skip..).unwrap_or(&[]).to_vec();
        let mut series = TimeSeries::new(timestamps, values)?;
        series.label = self.label.clone();
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn business_day_arithmetic_skips_weekends() {
        // 2025-05-16 is a Friday
        assert!(is_business_day(date(2025, 5, 16)));
        assert!(!is_business_day(date(2025, 5, 17)));
        assert_eq!(next_business_day(date(2025, 5, 16)), date(2025, 5, 19));

        let days = business_days_after(date(2025, 5, 16), 6);
        assert_eq!(days[0], date(2025, 5, 19));
        assert_eq!(days[4], date(2025, 5, 23));
        assert_eq!(days[5], date(2025, 5, 26));
    }

    #[test]
    fn from_business_days_rolls_weekend_start() {
        let ts = TimeSeries::from_business_days(date(2024, 6, 1), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.first_timestamp(), Some(date(2024, 6, 3)));
        assert_eq!(ts.last_timestamp(), Some(date(2024, 6, 5)));
        assert!(ts.is_gap_free());
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let result = TimeSeries::new(vec![date(2024, 6, 4), date(2024, 6, 3)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));

        let result = TimeSeries::new(vec![date(2024, 6, 4), date(2024, 6, 4)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn rejects_weekend_timestamps() {
        let result = TimeSeries::new(vec![date(2024, 6, 7), date(2024, 6, 8)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn rejects_missing_values() {
        let result =
            TimeSeries::from_business_days(date(2024, 6, 3), vec![1.0, f64::NAN, 3.0]);
        assert!(matches!(result, Err(ForecastError::MissingValues)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = TimeSeries::new(vec![date(2024, 6, 3)], vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::LengthMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn holiday_gap_is_accepted_but_reported() {
        // 2024-07-04 (Thursday) missing
        let ts = TimeSeries::new(
            vec![date(2024, 7, 2), date(2024, 7, 3), date(2024, 7, 5)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        assert!(!ts.is_gap_free());
    }

    #[test]
    fn train_test_split_keeps_tail() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ts = TimeSeries::from_business_days(date(2024, 1, 1), values)
            .unwrap()
            .with_label("AAPL");

        let (train, test) = ts.train_test_split(3).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(test.values(), &[7.0, 8.0, 9.0]);
        assert_eq!(test.label(), Some("AAPL"));
        assert_eq!(next_business_day(train.last_timestamp().unwrap()), test.timestamps()[0]);

        assert!(ts.train_test_split(10).is_err());
        assert!(ts.train_test_split(0).is_err());
    }

    #[test]
    fn tail_and_slice_bounds() {
        let ts =
            TimeSeries::from_business_days(date(2024, 1, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ts.tail(2).unwrap().values(), &[3.0, 4.0]);
        assert!(ts.tail(5).is_err());
        assert!(ts.slice(3, 2).is_err());
        assert_eq!(ts.observations().count(), 4);
    }
}
