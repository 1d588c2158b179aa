//! # anofox-fints
//!
//! ARIMA and GARCH forecasting for daily financial series.
//!
//! The pipeline runs leaf-first:
//! [`TimeSeries`](core::TimeSeries) → stationarity tests and differencing
//! ([`validation`], [`transform`]) → estimation ([`models::arima`],
//! [`models::garch`]) → forecasting → out-of-sample evaluation ([`utils`]).
//!
//! ```
//! use anofox_fints::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let prices: Vec<f64> = (0..200)
//!     .map(|i| 100.0 + 0.05 * i as f64 + ((i * 31) % 17) as f64 * 0.1)
//!     .collect();
//! let series = TimeSeries::from_business_days(start, prices).unwrap();
//! let (train, test) = series.train_test_split(20).unwrap();
//!
//! let model = ArimaEstimator::new(ArimaOrder::new(1, 1, 1)).fit(&train).unwrap();
//! let forecast = ArimaForecaster::default().forecast(&model, 20).unwrap();
//! let report = evaluate(test.values(), forecast.point()).unwrap();
//! assert!(report.rmse.is_finite());
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{ArimaEstimator, ArimaForecaster, ArimaModel, ArimaOrder};
    pub use crate::models::garch::{
        GarchEstimator, GarchForecaster, GarchModel, GarchOrder, MeanSpec, VolatilityMethod,
    };
    pub use crate::models::{Estimator, FittedModel};
    pub use crate::transform::{difference, invert, percent_returns};
    pub use crate::utils::{evaluate, EvaluationReport};
    pub use crate::validation::StationarityTester;
}
