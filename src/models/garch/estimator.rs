//! Maximum-likelihood estimation of GARCH(p, q) models.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::garch::model::{GarchModel, GarchOrder, GarchParams, MeanParams, MeanSpec};
use crate::models::Estimator;
use crate::utils::optimization::{NelderMead, NelderMeadConfig, Objective, Optimizer};
use crate::utils::stats::{autocorrelation, mean, population_variance};
use log::{debug, warn};
use std::f64::consts::PI;
use std::sync::Arc;

/// Upper bound the projection enforces on `Σα + Σβ`.
pub const MAX_PERSISTENCE: f64 = 0.9999;

/// Bound on the AR(1) mean coefficient.
const MAX_AR: f64 = 0.9999;

/// `(Σα, Σβ)` profiles the multi-start search begins from.
const START_PROFILES: [(f64, f64); 5] = [
    (0.05, 0.90),
    (0.10, 0.80),
    (0.15, 0.60),
    (0.02, 0.95),
    (0.10, 0.10),
];

/// GARCH estimator configuration.
///
/// # Example
/// ```
/// use anofox_fints::core::TimeSeries;
/// use anofox_fints::models::garch::{GarchEstimator, GarchOrder, GarchParams, MeanSpec};
/// use anofox_fints::models::Estimator;
/// use chrono::NaiveDate;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let truth = GarchParams::new(0.1, vec![0.1], vec![0.8]).unwrap();
/// let returns = truth.simulate(500, &mut StdRng::seed_from_u64(1));
/// let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
/// let series = TimeSeries::from_business_days(start, returns).unwrap();
///
/// let model = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(1, 1))
///     .fit(&series)
///     .unwrap();
/// assert!(model.persistence() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct GarchEstimator {
    mean: MeanSpec,
    order: GarchOrder,
    optimizer: Arc<dyn Optimizer>,
}

impl GarchEstimator {
    /// Create an estimator for the given mean equation and GARCH order.
    pub fn new(mean: MeanSpec, order: GarchOrder) -> Self {
        Self {
            mean,
            order,
            optimizer: Arc::new(NelderMead::new(NelderMeadConfig {
                max_iter: 3000,
                tolerance: 1e-8,
                ..Default::default()
            })),
        }
    }

    /// Use a different numerical optimizer.
    pub fn with_optimizer(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.optimizer = Arc::new(optimizer);
        self
    }

    /// Conditional-mean specification.
    pub fn mean_spec(&self) -> MeanSpec {
        self.mean
    }

    /// GARCH order being estimated.
    pub fn order(&self) -> GarchOrder {
        self.order
    }

    fn starting_points(&self, returns: &[f64]) -> Vec<Vec<f64>> {
        let GarchOrder { p, q } = self.order;
        let sample_var = population_variance(returns);
        let mu = mean(returns);
        let phi = autocorrelation(returns, 1).clamp(-0.5, 0.5);

        START_PROFILES
            .iter()
            .map(|&(alpha_total, beta_total)| {
                let beta_total = if p == 0 { 0.0 } else { beta_total };
                let mut x = Vec::with_capacity(self.mean.num_params() + 1 + p + q);
                match self.mean {
                    MeanSpec::Zero => {}
                    MeanSpec::Constant => x.push(mu),
                    MeanSpec::ConstantAr1 => {
                        x.push(mu * (1.0 - phi));
                        x.push(phi);
                    }
                }
                x.push(sample_var * (1.0 - alpha_total - beta_total));
                x.extend(std::iter::repeat_n(alpha_total / q as f64, q));
                if p > 0 {
                    x.extend(std::iter::repeat_n(beta_total / p as f64, p));
                }
                x
            })
            .collect()
    }
}

impl Default for GarchEstimator {
    fn default() -> Self {
        Self::new(MeanSpec::default(), GarchOrder::default())
    }
}

impl Estimator for GarchEstimator {
    type Model = GarchModel;

    fn fit(&self, series: &TimeSeries) -> Result<GarchModel> {
        let GarchOrder { p, q } = self.order;
        if q == 0 {
            return Err(ForecastError::InvalidOrder(
                "GARCH needs at least one lagged squared residual (q >= 1)".to_string(),
            ));
        }

        let returns = series.values();
        let min_obs = p + q + self.mean.num_params() + 10;
        if returns.len() < min_obs {
            return Err(ForecastError::InsufficientData {
                needed: min_obs,
                got: returns.len(),
            });
        }

        let sample_var = population_variance(returns);
        if sample_var <= 0.0 || !sample_var.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "return series has zero variance".to_string(),
            ));
        }

        let objective = GarchObjective {
            returns,
            mean: self.mean,
            order: self.order,
            omega_floor: 1e-8 * sample_var,
        };

        let mut best: Option<(f64, Vec<f64>, bool, usize)> = None;
        for start in self.starting_points(returns) {
            let result = self.optimizer.minimize(&objective, &start);
            debug!(
                "GARCH start {:?}: value {:.6}, converged {}",
                start, result.optimal_value, result.converged
            );
            if best
                .as_ref()
                .map_or(true, |(value, ..)| result.optimal_value < *value)
            {
                best = Some((
                    result.optimal_value,
                    result.optimal_point,
                    result.converged,
                    result.iterations,
                ));
            }
        }

        let (value, point, converged, iterations) = best
            .filter(|(value, ..)| value.is_finite())
            .ok_or_else(|| {
                ForecastError::OptimizationDiverged(
                    "no starting point produced a finite likelihood".to_string(),
                )
            })?;

        if !converged {
            warn!(
                "GARCH{} did not converge after {} iterations",
                self.order, iterations
            );
        }

        let (mean_params, omega, alpha, beta) = objective.unpack(&point);
        let persistence: f64 = alpha.iter().sum::<f64>() + beta.iter().sum::<f64>();
        if persistence >= MAX_PERSISTENCE - 1e-9 {
            return Err(ForecastError::NonStationaryVariance { persistence });
        }
        let params = GarchParams::new(omega, alpha, beta)?;

        let residuals = objective.residuals(&mean_params);
        let presample = population_variance(&residuals);
        let conditional_variance = params.variance_path(&residuals, presample);
        let offset = self.mean.lags();

        debug!(
            "GARCH{} fit: loglik {:.4}, omega {:.6}, alpha {:?}, beta {:?}",
            self.order, -value, params.omega, params.alpha, params.beta
        );

        Ok(GarchModel {
            mean_spec: self.mean,
            order: self.order,
            mean: mean_params,
            params,
            residuals,
            conditional_variance,
            timestamps: series.timestamps()[offset..].to_vec(),
            last_return: returns[returns.len() - 1],
            loglik: -value,
            converged,
            iterations,
        })
    }

    fn name(&self) -> String {
        format!("GARCH{}", self.order)
    }
}

/// Gaussian negative log-likelihood over `[mean.., ω, α.., β..]`.
struct GarchObjective<'a> {
    returns: &'a [f64],
    mean: MeanSpec,
    order: GarchOrder,
    omega_floor: f64,
}

impl GarchObjective<'_> {
    fn unpack(&self, x: &[f64]) -> (MeanParams, f64, Vec<f64>, Vec<f64>) {
        let k = self.mean.num_params();
        let mean = match self.mean {
            MeanSpec::Zero => MeanParams { mu: 0.0, phi: None },
            MeanSpec::Constant => MeanParams {
                mu: x[0],
                phi: None,
            },
            MeanSpec::ConstantAr1 => MeanParams {
                mu: x[0],
                phi: Some(x[1]),
            },
        };
        let omega = x[k];
        let alpha = x[k + 1..k + 1 + self.order.q].to_vec();
        let beta = x[k + 1 + self.order.q..k + 1 + self.order.q + self.order.p].to_vec();
        (mean, omega, alpha, beta)
    }

    fn residuals(&self, mean: &MeanParams) -> Vec<f64> {
        match mean.phi {
            Some(_) => self
                .returns
                .windows(2)
                .map(|w| w[1] - mean.predict(w[0]))
                .collect(),
            None => self.returns.iter().map(|r| r - mean.mu).collect(),
        }
    }
}

impl Objective for GarchObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        let (mean, omega, alpha, beta) = self.unpack(x);
        let params = GarchParams { omega, alpha, beta };

        let residuals = self.residuals(&mean);
        let presample = population_variance(&residuals);
        let sigma2 = params.variance_path(&residuals, presample);

        let mut nll = 0.0;
        for (e, s2) in residuals.iter().zip(&sigma2) {
            if *s2 <= 0.0 || !s2.is_finite() {
                return f64::INFINITY;
            }
            nll += 0.5 * ((2.0 * PI).ln() + s2.ln() + e * e / s2);
        }
        nll
    }

    fn project(&self, x: &mut [f64]) {
        let k = self.mean.num_params();
        if self.mean == MeanSpec::ConstantAr1 {
            x[1] = x[1].clamp(-MAX_AR, MAX_AR);
        }
        x[k] = x[k].max(self.omega_floor);

        let coefficients = &mut x[k + 1..];
        for c in coefficients.iter_mut() {
            *c = c.max(0.0);
        }
        let total: f64 = coefficients.iter().sum();
        if total > MAX_PERSISTENCE {
            let scale = MAX_PERSISTENCE / total;
            for c in coefficients.iter_mut() {
                *c *= scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FittedModel;
    use crate::utils::optimization::OptimizationResult;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Returns a fixed point and value regardless of the objective.
    #[derive(Debug)]
    struct FixedOptimizer {
        point: Option<Vec<f64>>,
        value: f64,
    }

    impl Optimizer for FixedOptimizer {
        fn minimize(&self, _objective: &dyn Objective, initial: &[f64]) -> OptimizationResult {
            OptimizationResult {
                optimal_point: self.point.clone().unwrap_or_else(|| initial.to_vec()),
                optimal_value: self.value,
                iterations: 1,
                evaluations: 1,
                converged: true,
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn series_from(values: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        TimeSeries::from_business_days(start, values).unwrap()
    }

    fn simulated(n: usize, seed: u64) -> Vec<f64> {
        let params = GarchParams::new(0.1, vec![0.1], vec![0.8]).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        params.simulate(n, &mut rng)
    }

    #[test]
    fn garch11_recovers_parameters() {
        let returns: Vec<f64> = simulated(3000, 7).iter().map(|e| e + 0.05).collect();
        let model = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(1, 1))
            .fit(&series_from(returns))
            .unwrap();

        assert!((model.alpha()[0] - 0.1).abs() < 0.05, "alpha {}", model.alpha()[0]);
        assert!((model.beta()[0] - 0.8).abs() < 0.1, "beta {}", model.beta()[0]);
        assert!(model.persistence() < 1.0);
        assert!((model.mean().mu - 0.05).abs() < 0.1);
        assert!((model.unconditional_variance() - 1.0).abs() < 0.3);
    }

    #[test]
    fn fitted_parameters_satisfy_constraints() {
        let model = GarchEstimator::default()
            .fit(&series_from(simulated(400, 3)))
            .unwrap();
        assert!(model.omega() > 0.0);
        assert!(model.alpha().iter().all(|&a| a >= 0.0));
        assert!(model.beta().iter().all(|&b| b >= 0.0));
        assert!(model.persistence() < 1.0);
        assert!(model.conditional_variance().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn ar1_mean_drops_first_observation() {
        let returns = simulated(300, 11);
        let series = series_from(returns);
        let model = GarchEstimator::new(MeanSpec::ConstantAr1, GarchOrder::new(1, 1))
            .fit(&series)
            .unwrap();

        assert_eq!(model.residuals().len(), 299);
        assert_eq!(model.timestamps()[0], series.timestamps()[1]);
        let phi = model.mean().phi.unwrap();
        assert!(phi.abs() < 0.2);
        assert_eq!(model.num_params(), 5);
    }

    #[test]
    fn zero_mean_residuals_are_returns() {
        let returns = simulated(200, 5);
        let model = GarchEstimator::new(MeanSpec::Zero, GarchOrder::new(1, 1))
            .fit(&series_from(returns.clone()))
            .unwrap();
        assert_eq!(model.residuals(), returns.as_slice());
        assert_eq!(model.mean().mu, 0.0);
    }

    #[test]
    fn arch_model_without_beta() {
        let model = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(0, 2))
            .fit(&series_from(simulated(500, 17)))
            .unwrap();
        assert!(model.beta().is_empty());
        assert_eq!(model.alpha().len(), 2);
    }

    #[test]
    fn loglik_matches_objective() {
        let returns = simulated(250, 23);
        let model = GarchEstimator::default()
            .fit(&series_from(returns.clone()))
            .unwrap();

        let residuals = model.residuals();
        let expected: f64 = residuals
            .iter()
            .zip(model.conditional_variance())
            .map(|(e, s2)| -0.5 * ((2.0 * PI).ln() + s2.ln() + e * e / s2))
            .sum();
        assert_relative_eq!(model.log_likelihood(), expected, epsilon = 1e-8);
        assert!(model.aic() > -2.0 * model.log_likelihood());
    }

    #[test]
    fn projection_keeps_iterates_feasible() {
        let returns = simulated(100, 1);
        let objective = GarchObjective {
            returns: &returns,
            mean: MeanSpec::ConstantAr1,
            order: GarchOrder::new(1, 1),
            omega_floor: 1e-8,
        };
        let mut x = vec![0.0, 1.5, -1.0, 0.9, 0.6];
        objective.project(&mut x);
        assert_eq!(x[1], MAX_AR);
        assert_eq!(x[2], 1e-8);
        assert!(x[3] + x[4] <= MAX_PERSISTENCE + 1e-12);
        assert!(objective.value(&x).is_finite());
    }

    #[test]
    fn invalid_inputs() {
        let short = series_from(vec![0.1, -0.2, 0.3]);
        assert!(matches!(
            GarchEstimator::default().fit(&short),
            Err(ForecastError::InsufficientData { .. })
        ));

        let flat = series_from(vec![0.5; 50]);
        assert!(matches!(
            GarchEstimator::default().fit(&flat),
            Err(ForecastError::InvalidParameter(_))
        ));

        let no_arch = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(1, 0));
        assert!(matches!(
            no_arch.fit(&series_from(simulated(100, 2))),
            Err(ForecastError::InvalidOrder(_))
        ));
    }

    #[test]
    fn non_finite_optimum_is_diverged() {
        let estimator = GarchEstimator::default().with_optimizer(FixedOptimizer {
            point: None,
            value: f64::INFINITY,
        });
        assert!(matches!(
            estimator.fit(&series_from(simulated(200, 4))),
            Err(ForecastError::OptimizationDiverged(_))
        ));
    }

    #[test]
    fn persistence_at_bound_is_non_stationary() {
        let estimator = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(1, 1))
            .with_optimizer(FixedOptimizer {
                point: Some(vec![0.0, 0.1, 0.05, MAX_PERSISTENCE - 0.05]),
                value: 100.0,
            });
        match estimator.fit(&series_from(simulated(200, 4))) {
            Err(ForecastError::NonStationaryVariance { persistence }) => {
                assert_relative_eq!(persistence, MAX_PERSISTENCE, epsilon = 1e-12);
            }
            other => panic!("expected NonStationaryVariance, got {:?}", other),
        }
    }
}
