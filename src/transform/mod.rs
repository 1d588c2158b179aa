//! Data transformations for price series.
//!
//! Provides differencing (and its inverse) for ARIMA and return
//! calculations for GARCH.
//!
//! # Example
//!
//! ```
//! use anofox_fints::transform::{difference, invert, percent_returns};
//!
//! let prices = vec![100.0, 101.0, 99.5, 102.0];
//!
//! // First differences and back
//! let diffs = difference(&prices, 1);
//! let levels = invert(&diffs, &prices[..1]);
//! assert_eq!(levels.len(), 3);
//!
//! // Daily percentage returns
//! let returns = percent_returns(&prices).unwrap();
//! assert!((returns[0] - 1.0).abs() < 1e-12);
//! ```

mod diff;

pub use diff::{
    difference, difference_series, invert, log_returns, percent_returns, percent_returns_series,
};
