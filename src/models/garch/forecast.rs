//! Multi-step volatility forecasts from a fitted GARCH model.

use crate::core::business_days_after;
use crate::error::{ForecastError, Result};
use crate::models::garch::model::GarchModel;
use chrono::NaiveDate;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// How variance forecasts are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolatilityMethod {
    /// Closed-form recursion with `E[ε²] = σ²` for future residuals.
    #[default]
    Analytic,
    /// Average of `simulations` Monte-Carlo paths drawn with a seeded
    /// generator.
    Simulation { simulations: usize, seed: u64 },
}

/// Forecast of the conditional mean and variance of future returns.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityForecast {
    timestamps: Vec<NaiveDate>,
    mean: Vec<f64>,
    variance: Vec<f64>,
}

impl VolatilityForecast {
    pub fn horizon(&self) -> usize {
        self.variance.len()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    /// Expected returns.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Expected conditional variances of the residuals.
    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    /// Square roots of [`VolatilityForecast::variance`].
    pub fn volatility(&self) -> Vec<f64> {
        self.variance.iter().map(|v| v.sqrt()).collect()
    }

    /// `(date, volatility)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.variance.iter().map(|v| v.sqrt()))
    }
}

/// GARCH volatility forecaster.
///
/// # Example
/// ```
/// use anofox_fints::core::TimeSeries;
/// use anofox_fints::models::garch::{
///     GarchEstimator, GarchForecaster, GarchParams, VolatilityMethod,
/// };
/// use anofox_fints::models::Estimator;
/// use chrono::NaiveDate;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let truth = GarchParams::new(0.05, vec![0.1], vec![0.85]).unwrap();
/// let returns = truth.simulate(400, &mut StdRng::seed_from_u64(4));
/// let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
/// let series = TimeSeries::from_business_days(start, returns).unwrap();
/// let model = GarchEstimator::default().fit(&series).unwrap();
///
/// let forecaster = GarchForecaster::new(VolatilityMethod::Simulation {
///     simulations: 200,
///     seed: 42,
/// });
/// let forecast = forecaster.forecast(&model, 10).unwrap();
/// assert_eq!(forecast.horizon(), 10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GarchForecaster {
    method: VolatilityMethod,
}

impl GarchForecaster {
    pub fn new(method: VolatilityMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> VolatilityMethod {
        self.method
    }

    /// Forecast `horizon` business days after the last training date.
    pub fn forecast(&self, model: &GarchModel, horizon: usize) -> Result<VolatilityForecast> {
        match self.method {
            VolatilityMethod::Analytic => {
                check_horizon(horizon)?;
                let variance = analytic_variance(model, horizon);
                Ok(assemble(model, horizon, variance))
            }
            VolatilityMethod::Simulation { simulations, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                self.forecast_with_rng(model, horizon, simulations, &mut rng)
            }
        }
    }

    /// Simulation forecast drawing shocks from a caller-supplied generator.
    pub fn forecast_with_rng<R: Rng + ?Sized>(
        &self,
        model: &GarchModel,
        horizon: usize,
        simulations: usize,
        rng: &mut R,
    ) -> Result<VolatilityForecast> {
        check_horizon(horizon)?;
        if simulations == 0 {
            return Err(ForecastError::InvalidParameter(
                "number of simulations must be positive".to_string(),
            ));
        }
        let variance = simulated_variance(model, horizon, simulations, rng);
        debug!(
            "GARCH simulation: {} paths, horizon {}",
            simulations, horizon
        );
        Ok(assemble(model, horizon, variance))
    }
}

fn check_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast horizon must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Squared residuals and variances the recursion needs, most recent last.
fn history(model: &GarchModel) -> (Vec<f64>, Vec<f64>) {
    let eps2 = model.residuals.iter().map(|e| e * e).collect();
    (eps2, model.conditional_variance.clone())
}

fn analytic_variance(model: &GarchModel, horizon: usize) -> Vec<f64> {
    let params = &model.params;
    let presample = params.unconditional_variance();
    let (mut eps2, mut sigma2) = history(model);

    let mut out = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let s2 = params.next_variance(&eps2, &sigma2, presample);
        sigma2.push(s2);
        eps2.push(s2);
        out.push(s2);
    }
    out
}

fn simulated_variance<R: Rng + ?Sized>(
    model: &GarchModel,
    horizon: usize,
    simulations: usize,
    rng: &mut R,
) -> Vec<f64> {
    let params = &model.params;
    let presample = params.unconditional_variance();
    let memory = params.alpha.len().max(params.beta.len());
    let (eps2, sigma2) = history(model);
    let eps2_tail = &eps2[eps2.len().saturating_sub(memory)..];
    let sigma2_tail = &sigma2[sigma2.len().saturating_sub(memory)..];

    let mut totals = vec![0.0; horizon];
    let mut path_eps2 = Vec::with_capacity(memory + horizon);
    let mut path_sigma2 = Vec::with_capacity(memory + horizon);
    for _ in 0..simulations {
        path_eps2.clear();
        path_eps2.extend_from_slice(eps2_tail);
        path_sigma2.clear();
        path_sigma2.extend_from_slice(sigma2_tail);

        for total in totals.iter_mut() {
            let s2 = params.next_variance(&path_eps2, &path_sigma2, presample);
            let z: f64 = StandardNormal.sample(rng);
            path_sigma2.push(s2);
            path_eps2.push(s2 * z * z);
            *total += s2;
        }
    }

    totals
        .into_iter()
        .map(|t| t / simulations as f64)
        .collect()
}

fn mean_path(model: &GarchModel, horizon: usize) -> Vec<f64> {
    let mut previous = model.last_return;
    (0..horizon)
        .map(|_| {
            previous = model.mean.predict(previous);
            previous
        })
        .collect()
}

fn assemble(model: &GarchModel, horizon: usize, variance: Vec<f64>) -> VolatilityForecast {
    let timestamps = match model.last_timestamp() {
        Some(last) => business_days_after(last, horizon),
        None => Vec::new(),
    };
    VolatilityForecast {
        timestamps,
        mean: mean_path(model, horizon),
        variance,
    }
}
