//! Train/test holdout evaluation.
//!
//! Fits a model on all but the last `holdout` observations, forecasts the
//! held-out span and scores the forecast against it.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::models::arima::{ArimaEstimator, ArimaForecaster, ArimaModel};
use crate::models::garch::{GarchEstimator, GarchForecaster, GarchModel, VolatilityForecast};
use crate::models::Estimator;
use crate::utils::metrics::{evaluate, realized_volatility, EvaluationReport};
use log::debug;

/// Outcome of an ARIMA price holdout.
#[derive(Debug, Clone)]
pub struct ArimaHoldout {
    /// Model fitted on the training span
    pub model: ArimaModel,
    /// Forecast covering the held-out span
    pub forecast: Forecast,
    /// Held-out prices
    pub test: TimeSeries,
    /// Forecast accuracy against `test`
    pub report: EvaluationReport,
}

/// Outcome of a GARCH volatility holdout.
#[derive(Debug, Clone)]
pub struct GarchHoldout {
    pub model: GarchModel,
    pub forecast: VolatilityForecast,
    /// Absolute held-out returns
    pub realized: TimeSeries,
    /// Forecast volatility against `realized`
    pub report: EvaluationReport,
}

/// Fit ARIMA on the training prices and score a `holdout`-day forecast.
///
/// Forecasts and actuals are paired by position; holidays in the test span
/// shift the forecast dates but not the comparison.
pub fn holdout_arima(
    prices: &TimeSeries,
    estimator: &ArimaEstimator,
    forecaster: &ArimaForecaster,
    holdout: usize,
) -> Result<ArimaHoldout> {
    let (train, test) = prices.train_test_split(holdout)?;
    let model = estimator.fit(&train)?;
    let forecast = forecaster.forecast(&model, holdout)?;
    let report = evaluate(test.values(), forecast.point())?;
    debug!(
        "{} holdout over {} days: MAE {:.4}, RMSE {:.4}",
        estimator.name(),
        holdout,
        report.mae,
        report.rmse
    );

    Ok(ArimaHoldout {
        model,
        forecast,
        test,
        report,
    })
}

/// Fit GARCH on the training returns and score forecast volatility against
/// absolute held-out returns.
pub fn holdout_garch(
    returns: &TimeSeries,
    estimator: &GarchEstimator,
    forecaster: &GarchForecaster,
    holdout: usize,
) -> Result<GarchHoldout> {
    let (train, test) = returns.train_test_split(holdout)?;
    let model = estimator.fit(&train)?;
    let forecast = forecaster.forecast(&model, holdout)?;
    let realized = test.with_dropped_prefix(0, realized_volatility(test.values()))?;
    let report = evaluate(realized.values(), &forecast.volatility())?;
    debug!(
        "{} holdout over {} days: MAE {:.4}, RMSE {:.4}",
        estimator.name(),
        holdout,
        report.mae,
        report.rmse
    );

    Ok(GarchHoldout {
        model,
        forecast,
        realized,
        report,
    })
}
