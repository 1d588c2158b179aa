//! GARCH(p, q) volatility models for return series.
//!
//! - [`GarchEstimator`]: Gaussian maximum likelihood with a configurable
//!   conditional mean ([`MeanSpec`])
//! - [`GarchModel`]: fitted parameters, conditional variances and
//!   standardized residuals
//! - [`GarchForecaster`]: analytic or seeded Monte-Carlo variance forecasts

mod estimator;
mod forecast;
mod model;

pub use estimator::{GarchEstimator, MAX_PERSISTENCE};
pub use forecast::{GarchForecaster, VolatilityForecast, VolatilityMethod};
pub use model::{GarchModel, GarchOrder, GarchParams, MeanParams, MeanSpec};
