//! Estimator and fitted-model traits shared by ARIMA and GARCH.

use crate::core::TimeSeries;
use crate::error::Result;

/// Fits a model to a series.
///
/// Estimators hold configuration only; every call to [`Estimator::fit`]
/// produces a fresh, immutable model.
pub trait Estimator {
    /// The fitted model type.
    type Model: FittedModel;

    /// Estimate model parameters from `series`.
    fn fit(&self, series: &TimeSeries) -> Result<Self::Model>;

    /// Get the model name.
    fn name(&self) -> String;
}

/// Summary statistics common to maximum-likelihood fits.
pub trait FittedModel {
    /// Maximized Gaussian log-likelihood.
    fn log_likelihood(&self) -> f64;

    /// Number of estimated parameters, including the innovation variance.
    fn num_params(&self) -> usize;

    /// Number of observations entering the likelihood.
    fn nobs(&self) -> usize;

    /// Residuals on the scale the likelihood was evaluated on.
    fn residuals(&self) -> &[f64];

    /// Whether the optimizer met its convergence criterion.
    fn converged(&self) -> bool;

    /// Get the model name.
    fn name(&self) -> String;

    /// Akaike information criterion.
    fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    /// Bayesian information criterion.
    fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.num_params() as f64 * (self.nobs() as f64).ln()
    }
}
