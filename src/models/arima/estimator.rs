//! Maximum-likelihood estimation of ARIMA(p, d, q) models.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::likelihood::{self, Evaluation};
use crate::models::arima::model::{ArimaModel, ArimaOrder, EstimationMethod};
use crate::models::arima::params::{
    constrain_invertible, constrain_stationary, is_invertible, is_stationary,
    ma_min_root_modulus, reflect_ma_roots, unconstrain_invertible, unconstrain_stationary,
};
use crate::models::Estimator;
use crate::transform::difference;
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{NelderMead, NelderMeadConfig, Objective, Optimizer};
use crate::utils::stats::{mean, population_variance};
use log::{debug, warn};
use std::sync::Arc;

/// Default relative tolerance on the objective.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// What to do when the fitted MA polynomial has roots inside the unit circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvertibilityPolicy {
    /// Replace each offending root by its reciprocal; `σ²` is re-estimated
    /// at the reflected coefficients.
    #[default]
    Reflect,
    /// Fail with [`ForecastError::NonInvertibleModel`].
    Reject,
}

/// ARIMA estimator configuration.
///
/// # Example
/// ```
/// use anofox_fints::core::TimeSeries;
/// use anofox_fints::models::arima::{ArimaEstimator, ArimaOrder, EstimationMethod};
/// use anofox_fints::models::{Estimator, FittedModel};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let values: Vec<f64> = (0..150).map(|i| ((i * 37 % 101) as f64 / 50.0) - 1.0).collect();
/// let series = TimeSeries::from_business_days(start, values).unwrap();
///
/// let model = ArimaEstimator::new(ArimaOrder::new(1, 0, 1))
///     .with_method(EstimationMethod::Css)
///     .fit(&series)
///     .unwrap();
/// assert!(model.aic().is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct ArimaEstimator {
    order: ArimaOrder,
    method: EstimationMethod,
    constant: Option<bool>,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
    invertibility: InvertibilityPolicy,
    optimizer: Arc<dyn Optimizer>,
}

impl ArimaEstimator {
    /// Create an estimator for the given order with default settings.
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            order,
            method: EstimationMethod::default(),
            constant: None,
            enforce_stationarity: true,
            enforce_invertibility: true,
            invertibility: InvertibilityPolicy::default(),
            optimizer: Arc::new(NelderMead::new(NelderMeadConfig {
                max_iter: 2000,
                tolerance: DEFAULT_TOLERANCE,
                ..Default::default()
            })),
        }
    }

    /// Choose the likelihood (exact Kalman filter or CSS).
    pub fn with_method(mut self, method: EstimationMethod) -> Self {
        self.method = method;
        self
    }

    /// Force the intercept on or off. By default it is included iff `d == 0`.
    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Restrict the AR search to the stationary region (default on).
    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = enforce;
        self
    }

    /// Restrict the MA search to the invertible region (default on).
    pub fn with_enforce_invertibility(mut self, enforce: bool) -> Self {
        self.enforce_invertibility = enforce;
        self
    }

    /// Choose how non-invertible MA estimates are handled.
    pub fn with_invertibility_policy(mut self, policy: InvertibilityPolicy) -> Self {
        self.invertibility = policy;
        self
    }

    /// Use a different numerical optimizer.
    pub fn with_optimizer(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.optimizer = Arc::new(optimizer);
        self
    }

    /// Model order being estimated.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    fn includes_constant(&self) -> bool {
        self.constant.unwrap_or(self.order.d == 0)
    }

    fn layout(&self) -> Layout {
        Layout {
            p: self.order.p,
            q: self.order.q,
            constant: self.includes_constant(),
            enforce_stationarity: self.enforce_stationarity,
            enforce_invertibility: self.enforce_invertibility,
        }
    }
}

impl Default for ArimaEstimator {
    fn default() -> Self {
        Self::new(ArimaOrder::default())
    }
}

impl Estimator for ArimaEstimator {
    type Model = ArimaModel;

    fn fit(&self, series: &TimeSeries) -> Result<ArimaModel> {
        let ArimaOrder { p, d, q } = self.order;
        let values = series.values();
        let last_timestamp = series.last_timestamp().ok_or(ForecastError::EmptyData)?;

        if values.len() <= d + 1 {
            return Err(ForecastError::InsufficientData {
                needed: d + 2,
                got: values.len(),
            });
        }

        let w = difference(values, d);
        let layout = self.layout();
        let effective = match self.method {
            EstimationMethod::Exact => w.len(),
            EstimationMethod::Css => w.len().saturating_sub(p),
        };
        let k = p + q + usize::from(layout.constant);
        if p + q >= effective || k >= effective {
            return Err(ForecastError::InvalidOrder(format!(
                "ARIMA{} needs more than {} observations after differencing, got {}",
                self.order, k, effective
            )));
        }
        if population_variance(&w) <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "differenced series is constant".to_string(),
            ));
        }

        let initial = layout.initial_point(&w);
        let objective = ArmaObjective {
            data: &w,
            layout,
            method: self.method,
        };

        let (point, converged, iterations) = if initial.is_empty() {
            (initial, true, 0)
        } else {
            let result = self.optimizer.minimize(&objective, &initial);
            if !result.optimal_value.is_finite() {
                return Err(ForecastError::OptimizationDiverged(format!(
                    "{} ended at a non-finite likelihood after {} iterations",
                    self.optimizer.name(),
                    result.iterations
                )));
            }
            if !result.converged {
                warn!(
                    "ARIMA{} did not converge after {} iterations",
                    self.order, result.iterations
                );
            }
            (result.optimal_point, result.converged, result.iterations)
        };

        let (mu, ar, mut ma) = layout.unpack(&point);

        let min_modulus = ma_min_root_modulus(&ma);
        if min_modulus < 1.0 {
            match self.invertibility {
                InvertibilityPolicy::Reject => {
                    return Err(ForecastError::NonInvertibleModel { min_modulus });
                }
                InvertibilityPolicy::Reflect => {
                    warn!(
                        "reflecting MA roots inside the unit circle (smallest modulus {:.4})",
                        min_modulus
                    );
                    ma = reflect_ma_roots(&ma).0;
                }
            }
        }

        let eval = evaluate(&w, mu, &ar, &ma, self.method).ok_or_else(|| {
            ForecastError::OptimizationDiverged(
                "likelihood is undefined at the estimated parameters".to_string(),
            )
        })?;

        debug!(
            "ARIMA{} fit: loglik {:.4}, sigma2 {:.6}, ar {:?}, ma {:?}",
            self.order, eval.loglik, eval.sigma2, ar, ma
        );

        let fitted: Vec<f64> = values[d..]
            .iter()
            .zip(&eval.residuals)
            .map(|(y, e)| y - e)
            .collect();

        Ok(ArimaModel {
            order: self.order,
            ar,
            ma,
            intercept: layout.constant.then_some(mu),
            sigma2: eval.sigma2,
            loglik: eval.loglik,
            method: self.method,
            differenced: w,
            residuals: eval.residuals,
            final_state: eval.state,
            fitted,
            fitted_timestamps: series.timestamps()[d..].to_vec(),
            last_levels: values[values.len() - d..].to_vec(),
            last_timestamp,
            nobs: eval.nobs,
            converged,
            iterations,
        })
    }

    fn name(&self) -> String {
        format!("ARIMA{}", self.order)
    }
}

/// Position of each parameter in the optimizer's vector:
/// `[mean?, ar.., ma..]`, with AR/MA in transformed space when enforced.
#[derive(Debug, Clone, Copy)]
struct Layout {
    p: usize,
    q: usize,
    constant: bool,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
}

impl Layout {
    fn offset(&self) -> usize {
        usize::from(self.constant)
    }

    fn unpack(&self, x: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let offset = self.offset();
        let mu = if self.constant { x[0] } else { 0.0 };
        let raw_ar = &x[offset..offset + self.p];
        let raw_ma = &x[offset + self.p..offset + self.p + self.q];

        let ar = if self.enforce_stationarity {
            constrain_stationary(raw_ar)
        } else {
            raw_ar.to_vec()
        };
        let ma = if self.enforce_invertibility {
            constrain_invertible(raw_ma)
        } else {
            raw_ma.to_vec()
        };
        (mu, ar, ma)
    }

    fn pack(&self, mu: f64, ar: &[f64], ma: &[f64]) -> Option<Vec<f64>> {
        let mut x = Vec::with_capacity(self.offset() + self.p + self.q);
        if self.constant {
            x.push(mu);
        }
        if self.enforce_stationarity {
            x.extend(unconstrain_stationary(ar)?);
        } else {
            x.extend_from_slice(ar);
        }
        if self.enforce_invertibility {
            x.extend(unconstrain_invertible(ma)?);
        } else {
            x.extend_from_slice(ma);
        }
        Some(x)
    }

    /// Hannan-Rissanen starting values, or zeros when they are unusable.
    fn initial_point(&self, w: &[f64]) -> Vec<f64> {
        let mu = if self.constant { mean(w) } else { 0.0 };
        let centered: Vec<f64> = w.iter().map(|v| v - mu).collect();

        let start = hannan_rissanen(&centered, self.p, self.q)
            .filter(|(ar, ma)| is_stationary(ar) && is_invertible(ma))
            .and_then(|(ar, ma)| self.pack(mu, &ar, &ma));

        match start {
            Some(x) => x,
            None => {
                debug!("Hannan-Rissanen start unusable, starting from zero coefficients");
                let zeros_ar = vec![0.0; self.p];
                let zeros_ma = vec![0.0; self.q];
                self.pack(mu, &zeros_ar, &zeros_ma)
                    .unwrap_or_else(|| vec![0.0; self.offset() + self.p + self.q])
            }
        }
    }
}

/// Negative log-likelihood over the packed parameter vector.
struct ArmaObjective<'a> {
    data: &'a [f64],
    layout: Layout,
    method: EstimationMethod,
}

impl Objective for ArmaObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        let (mu, ar, ma) = self.layout.unpack(x);
        evaluate(self.data, mu, &ar, &ma, self.method)
            .map(|e| -e.loglik)
            .unwrap_or(f64::INFINITY)
    }
}

fn evaluate(
    data: &[f64],
    mu: f64,
    ar: &[f64],
    ma: &[f64],
    method: EstimationMethod,
) -> Option<Evaluation> {
    if !mu.is_finite() || ar.iter().chain(ma).any(|c| !c.is_finite()) {
        return None;
    }
    let centered: Vec<f64> = data.iter().map(|v| v - mu).collect();
    match method {
        EstimationMethod::Exact => likelihood::exact(&centered, ar, ma),
        EstimationMethod::Css => likelihood::conditional(&centered, ar, ma),
    }
}

/// Two-stage Hannan-Rissanen regression on a zero-mean series.
///
/// A long autoregression supplies innovation estimates, then the series is
/// regressed on its own lags and the lagged innovations.
fn hannan_rissanen(z: &[f64], p: usize, q: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    if p + q == 0 {
        return Some((Vec::new(), Vec::new()));
    }
    let n = z.len();

    let (innovations, long_order) = if q > 0 {
        let m = (p.max(q) + 3).min(n / 4);
        if m == 0 {
            return None;
        }
        let design: Vec<Vec<f64>> = (m..n)
            .map(|t| (1..=m).map(|i| z[t - i]).collect())
            .collect();
        let fit = ols_fit(&z[m..], &design).ok()?;
        let mut e = vec![0.0; n];
        e[m..].copy_from_slice(&fit.residuals);
        (e, m)
    } else {
        (Vec::new(), 0)
    };

    let start = p.max(if q > 0 { long_order + q } else { 0 });
    if n <= start + p + q {
        return None;
    }

    let design: Vec<Vec<f64>> = (start..n)
        .map(|t| {
            let mut row: Vec<f64> = (1..=p).map(|i| z[t - i]).collect();
            row.extend((1..=q).map(|j| innovations[t - j]));
            row
        })
        .collect();
    let fit = ols_fit(&z[start..], &design).ok()?;

    let ar = fit.coefficients[..p].to_vec();
    let ma = fit.coefficients[p..].to_vec();
    Some((ar, ma))
}
