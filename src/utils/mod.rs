//! Numerical utilities: optimizers, distributions, regression and
//! out-of-sample evaluation.

pub mod holdout;
pub mod linalg;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use holdout::{holdout_arima, holdout_garch, ArimaHoldout, GarchHoldout};
pub use metrics::{evaluate, evaluate_series, mae, realized_volatility, rmse, EvaluationReport};
pub use ols::{ols_fit, OLSResult};
pub use optimization::{
    Bfgs, BfgsConfig, Bounded, NelderMead, NelderMeadConfig, Objective, OptimizationResult,
    Optimizer,
};
pub use stats::{acf, chi_squared_sf, normal_cdf, normal_quantile, pacf, z_for_level};
