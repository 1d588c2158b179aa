//! Augmented Dickey-Fuller unit-root test.
//!
//! The regression is
//!
//! ```text
//! Δy_t = β·y_{t-1} + Σ_{i=1..k} γ_i·Δy_{t-i} + [α] + [δ·t] + ε_t
//! ```
//!
//! and the statistic is the t-ratio of `β`. P-values follow MacKinnon (1994)
//! and critical values the MacKinnon (2010) response surfaces.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::normal_cdf;
use log::{debug, warn};

/// Significance level used by [`AdfResult::is_stationary`].
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Deterministic terms included in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdfRegression {
    /// No constant, no trend.
    NoConstant,
    /// Constant only.
    #[default]
    Constant,
    /// Constant and linear trend.
    ConstantTrend,
}

impl AdfRegression {
    fn trend_terms(self) -> usize {
        match self {
            AdfRegression::NoConstant => 0,
            AdfRegression::Constant => 1,
            AdfRegression::ConstantTrend => 2,
        }
    }

    fn index(self) -> usize {
        match self {
            AdfRegression::NoConstant => 0,
            AdfRegression::Constant => 1,
            AdfRegression::ConstantTrend => 2,
        }
    }
}

/// How many lagged differences enter the regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LagSelection {
    /// Schwert rule `⌊12·(n/100)^{1/4}⌋`, capped for short samples.
    #[default]
    Schwert,
    /// Exactly `k` lags.
    Fixed(usize),
    /// Minimum AIC over `0..=schwert` on a common sample.
    Aic,
}

/// Dickey-Fuller critical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Outcome of an ADF test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    /// t-statistic of the lagged level coefficient
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    /// Number of lagged differences used
    pub lags: usize,
    /// Observations in the final regression
    pub nobs: usize,
    /// Critical values for `nobs`
    pub critical_values: CriticalValues,
    /// Deterministic terms used
    pub regression: AdfRegression,
}

impl AdfResult {
    /// Unit root rejected at the 5% level.
    pub fn is_stationary(&self) -> bool {
        self.is_stationary_at(DEFAULT_SIGNIFICANCE)
    }

    /// Unit root rejected at `significance`.
    pub fn is_stationary_at(&self, significance: f64) -> bool {
        self.p_value < significance
    }
}

/// Configurable ADF tester.
///
/// # Example
/// ```
/// use anofox_fints::validation::{AdfRegression, LagSelection, StationarityTester};
///
/// let values: Vec<f64> = (0..200).map(|i| ((i * 37 % 101) as f64 / 50.0) - 1.0).collect();
/// let result = StationarityTester::new()
///     .with_regression(AdfRegression::Constant)
///     .with_lag_selection(LagSelection::Fixed(1))
///     .test_values(&values)
///     .unwrap();
/// assert!(result.is_stationary());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StationarityTester {
    regression: AdfRegression,
    lag_selection: LagSelection,
}

impl StationarityTester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regression(mut self, regression: AdfRegression) -> Self {
        self.regression = regression;
        self
    }

    pub fn with_lag_selection(mut self, lag_selection: LagSelection) -> Self {
        self.lag_selection = lag_selection;
        self
    }

    /// Test a date-indexed series.
    pub fn test(&self, series: &TimeSeries) -> Result<AdfResult> {
        self.test_values(series.values())
    }

    /// Test raw values.
    pub fn test_values(&self, values: &[f64]) -> Result<AdfResult> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let n = values.len();
        let ntrend = self.regression.trend_terms();

        let max_lag = match self.lag_selection {
            LagSelection::Fixed(k) => k,
            LagSelection::Schwert | LagSelection::Aic => {
                let rule = schwert_lags(n);
                let cap = (n / 2) as isize - ntrend as isize - 1;
                if cap < 0 {
                    return Err(ForecastError::InsufficientData {
                        needed: 2 * (ntrend + 1),
                        got: n,
                    });
                }
                let cap = cap as usize;
                if rule > cap {
                    warn!(
                        "ADF lag count {} exceeds what {} observations support, using {}",
                        rule, n, cap
                    );
                }
                rule.min(cap)
            }
        };

        if n <= max_lag + 2 {
            return Err(ForecastError::InsufficientData {
                needed: max_lag + 3,
                got: n,
            });
        }
        let columns = max_lag + 1 + ntrend;
        if n - 1 - max_lag <= columns {
            return Err(ForecastError::InsufficientData {
                needed: 2 * max_lag + ntrend + 3,
                got: n,
            });
        }

        let lags = match self.lag_selection {
            LagSelection::Aic => select_lag_aic(values, max_lag, self.regression)?,
            _ => max_lag,
        };

        let (dy, design) = adf_design(values, lags, lags, self.regression);
        let fit: OLSResult = ols_fit(&dy, &design)?;
        let statistic = fit.t_stat(0);
        if !statistic.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "ADF statistic is undefined for a constant series".to_string(),
            ));
        }

        let nobs = dy.len();
        let result = AdfResult {
            statistic,
            p_value: mackinnon_p_value(statistic, self.regression),
            lags,
            nobs,
            critical_values: mackinnon_critical_values(nobs, self.regression),
            regression: self.regression,
        };

        debug!(
            "ADF statistic {:.4}, p-value {:.4}, lags {}, nobs {}",
            result.statistic, result.p_value, result.lags, result.nobs
        );

        Ok(result)
    }
}

/// ADF test with constant and Schwert lags.
pub fn adf_test(values: &[f64]) -> Result<AdfResult> {
    StationarityTester::default().test_values(values)
}

/// Schwert rule for the number of lagged differences.
pub fn schwert_lags(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Response and design rows of the ADF regression.
///
/// Rows start at difference index `start` so that regressions with different
/// lag counts can share a sample. Column 0 is the lagged level.
fn adf_design(
    values: &[f64],
    lags: usize,
    start: usize,
    regression: AdfRegression,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let mut dy = Vec::with_capacity(diff.len().saturating_sub(start));
    let mut design = Vec::with_capacity(diff.len().saturating_sub(start));

    for (row, t) in (start..diff.len()).enumerate() {
        let mut x = Vec::with_capacity(lags + 3);
        x.push(values[t]);
        x.extend((1..=lags).map(|i| diff[t - i]));
        match regression {
            AdfRegression::NoConstant => {}
            AdfRegression::Constant => x.push(1.0),
            AdfRegression::ConstantTrend => {
                x.push(1.0);
                x.push((row + 1) as f64);
            }
        }
        dy.push(diff[t]);
        design.push(x);
    }

    (dy, design)
}

/// Lag count minimizing AIC over `0..=max_lag`, all fitted on the sample
/// available at `max_lag`.
fn select_lag_aic(values: &[f64], max_lag: usize, regression: AdfRegression) -> Result<usize> {
    let mut best = (f64::INFINITY, 0);
    for lag in 0..=max_lag {
        let (dy, design) = adf_design(values, lag, max_lag, regression);
        let aic = ols_fit(&dy, &design)?.aic();
        if aic < best.0 {
            best = (aic, lag);
        }
    }
    debug!("ADF AIC lag search chose {} of {}", best.1, max_lag);
    Ok(best.1)
}

// MacKinnon (1994) p-value surfaces, one unit-root regressor.
// Rows indexed by NoConstant, Constant, ConstantTrend.
const TAU_MAX: [f64; 3] = [f64::INFINITY, 2.74, 0.7];
const TAU_MIN: [f64; 3] = [-19.04, -18.83, -16.18];
const TAU_STAR: [f64; 3] = [-1.04, -1.61, -2.89];

const TAU_SMALLP: [[f64; 3]; 3] = [
    [0.6344, 1.2378, 0.032496],
    [2.1659, 1.4412, 0.038269],
    [3.2512, 1.6047, 0.049588],
];

const TAU_LARGEP: [[f64; 4]; 3] = [
    [0.4797, 0.93557, -0.06999, 0.033066],
    [1.7339, 0.93202, -0.12745, -0.010368],
    [2.5261, 0.61654, -0.37956, -0.060285],
];

// MacKinnon (2010) critical value surfaces: [1%, 5%, 10%] x [c0, c1, c2, c3].
const CRIT_2010: [[[f64; 4]; 3]; 3] = [
    [
        [-2.56574, -2.2358, -3.627, 0.0],
        [-1.94100, -0.2686, -3.365, 31.223],
        [-1.61682, 0.2656, -2.714, 25.364],
    ],
    [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
    [
        [-3.95877, -9.0531, -28.428, -134.155],
        [-3.41049, -4.3904, -9.036, -45.374],
        [-3.12705, -2.5856, -3.925, -22.380],
    ],
];

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// MacKinnon (1994) approximate p-value of a Dickey-Fuller statistic.
pub fn mackinnon_p_value(statistic: f64, regression: AdfRegression) -> f64 {
    let r = regression.index();
    if statistic > TAU_MAX[r] {
        return 1.0;
    }
    if statistic < TAU_MIN[r] {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR[r] {
        polyval(&TAU_SMALLP[r], statistic)
    } else {
        polyval(&TAU_LARGEP[r], statistic)
    };
    normal_cdf(z)
}

/// MacKinnon (2010) finite-sample critical values for `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize, regression: AdfRegression) -> CriticalValues {
    let table = &CRIT_2010[regression.index()];
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        cv_1pct: polyval(&table[0], inv),
        cv_5pct: polyval(&table[1], inv),
        cv_10pct: polyval(&table[2], inv),
    }
}
