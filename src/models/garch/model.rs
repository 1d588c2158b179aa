//! GARCH parameter types and the fitted model.

use crate::error::{ForecastError, Result};
use crate::models::FittedModel;
use chrono::NaiveDate;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;

/// Conditional-mean specification for the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeanSpec {
    /// Returns have zero mean.
    Zero,
    /// Constant mean `μ`.
    #[default]
    Constant,
    /// `r_t = μ + φ·r_{t-1} + ε_t`.
    ConstantAr1,
}

impl MeanSpec {
    /// Number of mean parameters.
    pub fn num_params(self) -> usize {
        match self {
            MeanSpec::Zero => 0,
            MeanSpec::Constant => 1,
            MeanSpec::ConstantAr1 => 2,
        }
    }

    /// Observations consumed as pre-sample by the mean equation.
    pub fn lags(self) -> usize {
        match self {
            MeanSpec::ConstantAr1 => 1,
            _ => 0,
        }
    }
}

/// GARCH order `(p, q)`: `p` lagged variances (β terms) and `q` lagged
/// squared residuals (α terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GarchOrder {
    /// Number of β (lagged variance) terms
    pub p: usize,
    /// Number of α (lagged squared residual) terms
    pub q: usize,
}

impl GarchOrder {
    pub fn new(p: usize, q: usize) -> Self {
        Self { p, q }
    }
}

impl Default for GarchOrder {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for GarchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.p, self.q)
    }
}

/// Fitted conditional-mean parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanParams {
    /// Intercept (zero for [`MeanSpec::Zero`])
    pub mu: f64,
    /// AR(1) coefficient for [`MeanSpec::ConstantAr1`]
    pub phi: Option<f64>,
}

impl MeanParams {
    /// Expected return given the previous return.
    pub fn predict(&self, previous: f64) -> f64 {
        self.mu + self.phi.map_or(0.0, |phi| phi * previous)
    }
}

/// Variance equation `σ²_t = ω + Σα_i ε²_{t-i} + Σβ_j σ²_{t-j}`.
#[derive(Debug, Clone, PartialEq)]
pub struct GarchParams {
    pub omega: f64,
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
}

impl GarchParams {
    /// Create validated parameters: `ω > 0`, `α, β ≥ 0`, `Σα + Σβ < 1`.
    pub fn new(omega: f64, alpha: Vec<f64>, beta: Vec<f64>) -> Result<Self> {
        if omega <= 0.0 || !omega.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "omega must be positive, got {}",
                omega
            )));
        }
        if alpha.iter().chain(&beta).any(|c| *c < 0.0 || !c.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "alpha and beta must be non-negative".to_string(),
            ));
        }
        let params = Self { omega, alpha, beta };
        let persistence = params.persistence();
        if persistence >= 1.0 {
            return Err(ForecastError::NonStationaryVariance { persistence });
        }
        Ok(params)
    }

    /// `Σα + Σβ`.
    pub fn persistence(&self) -> f64 {
        self.alpha.iter().sum::<f64>() + self.beta.iter().sum::<f64>()
    }

    /// Long-run variance `ω / (1 - Σα - Σβ)`.
    pub fn unconditional_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// One step of the variance recursion.
    ///
    /// `eps2` and `sigma2` hold the history, most recent last; lags reaching
    /// before the history use `presample`.
    pub(crate) fn next_variance(&self, eps2: &[f64], sigma2: &[f64], presample: f64) -> f64 {
        let mut value = self.omega;
        for (i, &a) in self.alpha.iter().enumerate() {
            value += a * lagged(eps2, i + 1, presample);
        }
        for (j, &b) in self.beta.iter().enumerate() {
            value += b * lagged(sigma2, j + 1, presample);
        }
        value
    }

    /// Conditional variances for a residual path, pre-sample terms set to
    /// `presample`.
    pub fn variance_path(&self, residuals: &[f64], presample: f64) -> Vec<f64> {
        let mut eps2 = Vec::with_capacity(residuals.len());
        let mut sigma2 = Vec::with_capacity(residuals.len());
        for &e in residuals {
            let s2 = self.next_variance(&eps2, &sigma2, presample);
            sigma2.push(s2);
            eps2.push(e * e);
        }
        sigma2
    }

    /// Simulate `n` Gaussian GARCH innovations started at the long-run variance.
    pub fn simulate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let start = self.unconditional_variance();
        let mut eps2 = Vec::with_capacity(n);
        let mut sigma2 = Vec::with_capacity(n);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let s2 = self.next_variance(&eps2, &sigma2, start);
            let z: f64 = StandardNormal.sample(rng);
            let e = s2.sqrt() * z;
            sigma2.push(s2);
            eps2.push(e * e);
            out.push(e);
        }
        out
    }
}

fn lagged(history: &[f64], lag: usize, presample: f64) -> f64 {
    if history.len() >= lag {
        history[history.len() - lag]
    } else {
        presample
    }
}

/// A fitted GARCH model with its conditional-mean equation.
#[derive(Debug, Clone)]
pub struct GarchModel {
    pub(crate) mean_spec: MeanSpec,
    pub(crate) order: GarchOrder,
    pub(crate) mean: MeanParams,
    pub(crate) params: GarchParams,
    pub(crate) residuals: Vec<f64>,
    pub(crate) conditional_variance: Vec<f64>,
    pub(crate) timestamps: Vec<NaiveDate>,
    pub(crate) last_return: f64,
    pub(crate) loglik: f64,
    pub(crate) converged: bool,
    pub(crate) iterations: usize,
}

impl GarchModel {
    pub fn mean_spec(&self) -> MeanSpec {
        self.mean_spec
    }

    pub fn order(&self) -> GarchOrder {
        self.order
    }

    /// Conditional-mean parameters.
    pub fn mean(&self) -> MeanParams {
        self.mean
    }

    /// Variance-equation parameters.
    pub fn params(&self) -> &GarchParams {
        &self.params
    }

    pub fn omega(&self) -> f64 {
        self.params.omega
    }

    pub fn alpha(&self) -> &[f64] {
        &self.params.alpha
    }

    pub fn beta(&self) -> &[f64] {
        &self.params.beta
    }

    pub fn persistence(&self) -> f64 {
        self.params.persistence()
    }

    pub fn unconditional_variance(&self) -> f64 {
        self.params.unconditional_variance()
    }

    /// In-sample conditional variances `σ²_t`.
    pub fn conditional_variance(&self) -> &[f64] {
        &self.conditional_variance
    }

    /// In-sample conditional volatilities `σ_t`.
    pub fn conditional_volatility(&self) -> Vec<f64> {
        self.conditional_variance.iter().map(|v| v.sqrt()).collect()
    }

    /// Residuals divided by their conditional volatility.
    pub fn standardized_residuals(&self) -> Vec<f64> {
        self.residuals
            .iter()
            .zip(&self.conditional_variance)
            .map(|(e, v)| e / v.sqrt())
            .collect()
    }

    /// Dates of the residuals and conditional variances.
    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    /// Date of the last training observation.
    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl FittedModel for GarchModel {
    fn log_likelihood(&self) -> f64 {
        self.loglik
    }

    fn num_params(&self) -> usize {
        self.mean_spec.num_params() + 1 + self.order.p + self.order.q
    }

    fn nobs(&self) -> usize {
        self.residuals.len()
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn converged(&self) -> bool {
        self.converged
    }

    fn name(&self) -> String {
        format!("GARCH{}", self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn params_validation() {
        assert!(GarchParams::new(0.1, vec![0.1], vec![0.8]).is_ok());
        assert!(GarchParams::new(0.0, vec![0.1], vec![0.8]).is_err());
        assert!(GarchParams::new(0.1, vec![-0.1], vec![0.8]).is_err());
        assert!(matches!(
            GarchParams::new(0.1, vec![0.4], vec![0.7]),
            Err(ForecastError::NonStationaryVariance { .. })
        ));
    }

    #[test]
    fn unconditional_variance() {
        let params = GarchParams::new(0.1, vec![0.1], vec![0.8]).unwrap();
        assert_relative_eq!(params.persistence(), 0.9, epsilon = 1e-12);
        assert_relative_eq!(params.unconditional_variance(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn variance_path_recursion() {
        let params = GarchParams::new(0.2, vec![0.1], vec![0.7]).unwrap();
        let path = params.variance_path(&[1.0, -2.0], 1.5);
        assert_relative_eq!(path[0], 0.2 + 0.1 * 1.5 + 0.7 * 1.5, epsilon = 1e-12);
        assert_relative_eq!(path[1], 0.2 + 0.1 * 1.0 + 0.7 * path[0], epsilon = 1e-12);
    }

    #[test]
    fn arch_only_has_no_beta_terms() {
        let params = GarchParams::new(0.5, vec![0.3, 0.2], vec![]).unwrap();
        let path = params.variance_path(&[1.0, 2.0, 0.5], 1.0);
        assert_relative_eq!(path[2], 0.5 + 0.3 * 4.0 + 0.2 * 1.0, epsilon = 1e-12);
    }

    #[test]
    fn simulation_matches_long_run_variance() {
        let params = GarchParams::new(0.05, vec![0.08], vec![0.87]).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let draws = params.simulate(20_000, &mut rng);
        let var = draws.iter().map(|e| e * e).sum::<f64>() / draws.len() as f64;
        assert!((var - 1.0).abs() < 0.15, "sample variance {}", var);
    }

    #[test]
    fn mean_prediction() {
        let constant = MeanParams { mu: 0.1, phi: None };
        assert_relative_eq!(constant.predict(5.0), 0.1);
        let ar = MeanParams {
            mu: 0.1,
            phi: Some(0.5),
        };
        assert_relative_eq!(ar.predict(2.0), 1.1);
    }
}
