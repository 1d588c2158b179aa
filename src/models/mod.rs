//! Statistical models: ARIMA for price levels, GARCH for volatility.

mod traits;

pub mod arima;
pub mod garch;

pub use traits::{Estimator, FittedModel};
