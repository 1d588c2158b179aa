//! Core data structures for time series forecasting.

mod forecast;
mod time_series;

pub use forecast::{Forecast, ForecastRow};
pub use time_series::{business_days_after, is_business_day, next_business_day, TimeSeries};
