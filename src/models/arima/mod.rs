//! ARIMA (Autoregressive Integrated Moving Average) models for price levels.
//!
//! This module provides:
//! - [`ArimaEstimator`]: maximum-likelihood fitting for a fixed `(p, d, q)`
//! - [`ArimaModel`]: the fitted, immutable model
//! - [`ArimaForecaster`]: multi-step forecasts with widening intervals
//! - [`params`]: stationarity/invertibility transforms, MA root reflection
//!   and ψ-weights

mod estimator;
mod likelihood;
mod model;
pub mod params;

pub use estimator::{ArimaEstimator, InvertibilityPolicy, DEFAULT_TOLERANCE};
pub use model::{ArimaForecaster, ArimaModel, ArimaOrder, EstimationMethod, DEFAULT_LEVEL};
