//! Fitted ARIMA model and its forecaster.

use crate::core::{business_days_after, Forecast};
use crate::error::{ForecastError, Result};
use crate::models::arima::params::psi_weights;
use crate::models::FittedModel;
use crate::transform::invert;
use crate::utils::stats::z_for_level;
use chrono::NaiveDate;
use std::fmt;

/// Default confidence level for prediction intervals.
pub const DEFAULT_LEVEL: f64 = 0.95;

/// ARIMA model order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new ARIMA order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Likelihood used during estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimationMethod {
    /// Exact Gaussian likelihood from a Kalman filter.
    #[default]
    Exact,
    /// Conditional sum of squares.
    Css,
}

/// A fitted ARIMA(p, d, q) model.
///
/// Produced by [`ArimaEstimator::fit`](crate::models::arima::ArimaEstimator);
/// parameters never change afterwards.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    pub(crate) order: ArimaOrder,
    pub(crate) ar: Vec<f64>,
    pub(crate) ma: Vec<f64>,
    pub(crate) intercept: Option<f64>,
    pub(crate) sigma2: f64,
    pub(crate) loglik: f64,
    pub(crate) method: EstimationMethod,
    pub(crate) differenced: Vec<f64>,
    pub(crate) residuals: Vec<f64>,
    pub(crate) final_state: Option<Vec<f64>>,
    pub(crate) fitted: Vec<f64>,
    pub(crate) fitted_timestamps: Vec<NaiveDate>,
    pub(crate) last_levels: Vec<f64>,
    pub(crate) last_timestamp: NaiveDate,
    pub(crate) nobs: usize,
    pub(crate) converged: bool,
    pub(crate) iterations: usize,
}

impl ArimaModel {
    /// Get the model order.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// AR coefficients `φ₁..φₚ`.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// MA coefficients `θ₁..θ_q`.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Mean of the differenced series, when the model includes one.
    ///
    /// For `d = 1` this is the drift per business day.
    pub fn intercept(&self) -> Option<f64> {
        self.intercept
    }

    /// Innovation variance `σ²`.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Likelihood the parameters were estimated with.
    pub fn method(&self) -> EstimationMethod {
        self.method
    }

    /// The differenced training series.
    pub fn differenced(&self) -> &[f64] {
        &self.differenced
    }

    /// In-sample one-step predictions on the level scale.
    ///
    /// Aligned with [`ArimaModel::fitted_timestamps`]; the first `d`
    /// observations have no prediction.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Dates of [`ArimaModel::fitted_values`].
    pub fn fitted_timestamps(&self) -> &[NaiveDate] {
        &self.fitted_timestamps
    }

    /// Date of the last training observation.
    pub fn last_timestamp(&self) -> NaiveDate {
        self.last_timestamp
    }

    /// Optimizer iterations spent.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Forecast `horizon` business days ahead with 95% intervals.
    pub fn forecast(&self, horizon: usize) -> Result<Forecast> {
        ArimaForecaster::default().forecast(self, horizon)
    }

    /// Point forecasts on the differenced scale.
    ///
    /// Exact fits propagate the final Kalman state; CSS fits run the
    /// residual recursion forward.
    fn forecast_differenced(&self, horizon: usize) -> Vec<f64> {
        let mu = self.intercept.unwrap_or(0.0);
        if let Some(state) = &self.final_state {
            return propagate_state(state, &self.ar, mu, horizon);
        }
        let n = self.differenced.len();

        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        w.reserve(horizon);
        e.reserve(horizon);

        for _ in 0..horizon {
            let t = w.len();
            let mut pred = mu;
            for (i, &phi) in self.ar.iter().enumerate() {
                if t > i {
                    pred += phi * (w[t - 1 - i] - mu);
                }
            }
            for (j, &theta) in self.ma.iter().enumerate() {
                if t > j {
                    pred += theta * e[t - 1 - j];
                }
            }
            w.push(pred);
            // Future innovations have zero expectation
            e.push(0.0);
        }

        w.split_off(n)
    }
}

/// Iterate `a <- T a` from the predicted state, reading `μ + a[0]` each step.
fn propagate_state(state: &[f64], ar: &[f64], mu: f64, horizon: usize) -> Vec<f64> {
    let r = state.len();
    let mut a = state.to_vec();
    let mut out = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        out.push(mu + a[0]);
        let head = a[0];
        let next: Vec<f64> = (0..r)
            .map(|i| {
                let phi = ar.get(i).copied().unwrap_or(0.0);
                phi * head + a.get(i + 1).copied().unwrap_or(0.0)
            })
            .collect();
        a = next;
    }
    out
}

impl FittedModel for ArimaModel {
    fn log_likelihood(&self) -> f64 {
        self.loglik
    }

    fn num_params(&self) -> usize {
        self.order.p + self.order.q + usize::from(self.intercept.is_some()) + 1
    }

    fn nobs(&self) -> usize {
        self.nobs
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn converged(&self) -> bool {
        self.converged
    }

    fn name(&self) -> String {
        format!("ARIMA{}", self.order)
    }
}

/// Multi-step ARIMA forecaster.
///
/// Point forecasts set future innovations to zero; interval half-widths are
/// `z·σ·sqrt(Σψ²)` using the ψ-weights of the integrated process, so they
/// widen with the horizon.
///
/// # Example
/// ```
/// use anofox_fints::core::TimeSeries;
/// use anofox_fints::models::arima::{ArimaEstimator, ArimaForecaster, ArimaOrder};
/// use anofox_fints::models::Estimator;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let prices: Vec<f64> = (0..120)
///     .map(|i| 100.0 + 0.1 * i as f64 + ((i * 7919) % 13) as f64 * 0.2)
///     .collect();
/// let series = TimeSeries::from_business_days(start, prices).unwrap();
///
/// let model = ArimaEstimator::new(ArimaOrder::new(1, 1, 0)).fit(&series).unwrap();
/// let forecast = ArimaForecaster::new().with_level(0.8).forecast(&model, 5).unwrap();
/// assert_eq!(forecast.horizon(), 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArimaForecaster {
    level: f64,
}

impl Default for ArimaForecaster {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl ArimaForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval confidence level, in (0, 1).
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Forecast `horizon` business days after the last training date.
    pub fn forecast(&self, model: &ArimaModel, horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be positive".to_string(),
            ));
        }
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                self.level
            )));
        }

        let differenced = model.forecast_differenced(horizon);
        let point = if model.order.d > 0 {
            invert(&differenced, &model.last_levels)
        } else {
            differenced
        };

        let z = z_for_level(self.level);
        let psi = psi_weights(&model.ar, &model.ma, model.order.d, horizon);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, &pred) in point.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let half_width = z * (model.sigma2 * cumulative).sqrt();
            lower.push(pred - half_width);
            upper.push(pred + half_width);
        }

        let timestamps = business_days_after(model.last_timestamp, horizon);
        Forecast::from_values_with_intervals(timestamps, point, lower, upper, self.level)
    }
}
