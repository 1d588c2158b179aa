//! Residual diagnostics for fitted models.
//!
//! The Ljung-Box and Jarque-Bera statistics reported alongside a fit.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{chi_squared_sf, mean};

/// Outcome of a portmanteau or normality test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticResult {
    /// Test statistic
    pub statistic: f64,
    /// Chi-squared p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: usize,
}

impl DiagnosticResult {
    /// Null hypothesis retained at `alpha`.
    pub fn passes(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Ljung-Box Q test for autocorrelation up to `lags`.
///
/// `fitted_params` reduces the degrees of freedom (ARMA `p + q`), with at
/// least one degree kept.
pub fn ljung_box(residuals: &[f64], lags: usize, fitted_params: usize) -> Result<DiagnosticResult> {
    let n = residuals.len();
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    if lags == 0 {
        return Err(ForecastError::InvalidParameter(
            "Ljung-Box needs at least one lag".to_string(),
        ));
    }
    if n <= lags {
        return Err(ForecastError::InsufficientData {
            needed: lags + 1,
            got: n,
        });
    }

    let m = mean(residuals);
    let centered: Vec<f64> = residuals.iter().map(|&x| x - m).collect();
    let var: f64 = centered.iter().map(|&x| x * x).sum();
    let df = lags.saturating_sub(fitted_params).max(1);

    if var == 0.0 {
        return Ok(DiagnosticResult {
            statistic: 0.0,
            p_value: 1.0,
            df,
        });
    }

    let mut q = 0.0;
    for k in 1..=lags {
        let r_k: f64 = centered
            .iter()
            .skip(k)
            .zip(&centered)
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / var;
        q += r_k * r_k / (n - k) as f64;
    }
    q *= n as f64 * (n + 2) as f64;

    Ok(DiagnosticResult {
        statistic: q,
        p_value: chi_squared_sf(q, df),
        df,
    })
}

/// Jarque-Bera normality test from sample skewness and kurtosis.
pub fn jarque_bera(residuals: &[f64]) -> Result<DiagnosticResult> {
    let n = residuals.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData { needed: 3, got: n });
    }

    let m = mean(residuals);
    let nf = n as f64;
    let m2 = residuals.iter().map(|x| (x - m).powi(2)).sum::<f64>() / nf;
    if m2 == 0.0 {
        return Err(ForecastError::InvalidParameter(
            "Jarque-Bera is undefined for constant residuals".to_string(),
        ));
    }
    let m3 = residuals.iter().map(|x| (x - m).powi(3)).sum::<f64>() / nf;
    let m4 = residuals.iter().map(|x| (x - m).powi(4)).sum::<f64>() / nf;

    let skew = m3 / m2.powf(1.5);
    let kurt = m4 / (m2 * m2);
    let statistic = nf / 6.0 * (skew * skew + (kurt - 3.0).powi(2) / 4.0);

    Ok(DiagnosticResult {
        statistic,
        p_value: chi_squared_sf(statistic, 2),
        df: 2,
    })
}
