//! Ordinary Least Squares (OLS) regression on an explicit design matrix.
//!
//! Used by the Dickey-Fuller regression and by Hannan-Rissanen starting
//! values for ARMA estimation.

use crate::error::{ForecastError, Result};
use crate::utils::linalg::invert_symmetric;

/// OLS coefficients with their classical standard errors.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients, one per design column.
    pub coefficients: Vec<f64>,
    /// Standard errors `sqrt(s² · (X'X)⁻¹_ii)`.
    pub std_errors: Vec<f64>,
    /// Residuals `y - X β`.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// t-statistic of coefficient `index`.
    pub fn t_stat(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Gaussian log-likelihood evaluated at the MLE of the error variance.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// Fit `y = X β` where `design` holds one row per observation.
///
/// Solves the normal equations through a Cholesky factorisation of `X'X`.
pub fn ols_fit(y: &[f64], design: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    if design.len() != n {
        return Err(ForecastError::LengthMismatch {
            expected: n,
            got: design.len(),
        });
    }

    let k = design[0].len();
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    // X'X and X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y_obs) in design.iter().zip(y) {
        if row.len() != k {
            return Err(ForecastError::LengthMismatch {
                expected: k,
                got: row.len(),
            });
        }
        for i in 0..k {
            xty[i] += row[i] * y_obs;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in (i + 1)..k {
            xtx[i][j] = xtx[j][i];
        }
    }

    let xtx_inv = invert_symmetric(&xtx).ok_or_else(|| {
        ForecastError::InvalidParameter(
            "OLS regression failed: design matrix is rank deficient".into(),
        )
    })?;

    let coefficients: Vec<f64> = (0..k)
        .map(|i| (0..k).map(|j| xtx_inv[i][j] * xty[j]).sum())
        .collect();

    let residuals: Vec<f64> = design
        .iter()
        .zip(y)
        .map(|(row, &y_obs)| y_obs - row.iter().zip(&coefficients).map(|(x, b)| x * b).sum::<f64>())
        .collect();
    let rss: f64 = residuals.iter().map(|r| r * r).sum();

    let s2 = rss / (n - k) as f64;
    let std_errors = (0..k).map(|i| (s2 * xtx_inv[i][i]).max(0.0).sqrt()).collect();

    Ok(OLSResult {
        coefficients,
        std_errors,
        residuals,
        rss,
        nobs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ols_fit_simple_linear() {
        // y = 2 + 3*x
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 3.0 * v).collect();
        let design: Vec<Vec<f64>> = x.iter().map(|&v| vec![1.0, v]).collect();

        let result = ols_fit(&y, &design).unwrap();

        assert_relative_eq!(result.coefficients[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(result.coefficients[1], 3.0, epsilon = 1e-9);
        assert!(result.rss < 1e-18);
    }

    #[test]
    fn ols_standard_error_matches_closed_form() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.1, 1.9, 3.2, 3.8, 5.1, 6.2];
        let design: Vec<Vec<f64>> = x.iter().map(|&v| vec![1.0, v]).collect();
        let result = ols_fit(&y, &design).unwrap();

        let x_mean = x.iter().sum::<f64>() / 6.0;
        let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
        let s2 = result.rss / 4.0;
        assert_relative_eq!(result.std_errors[1], (s2 / sxx).sqrt(), epsilon = 1e-10);

        let sum: f64 = result.residuals.iter().sum();
        assert!(sum.abs() < 1e-9);
    }

    #[test]
    fn ols_rejects_collinear_design() {
        let design: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(ols_fit(&y, &design).is_err());
    }

    #[test]
    fn ols_needs_more_rows_than_columns() {
        let design = vec![vec![1.0, 2.0], vec![1.0, 3.0]];
        assert!(matches!(
            ols_fit(&[1.0, 2.0], &design),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn ols_dimension_mismatch() {
        let design = vec![vec![1.0], vec![1.0]];
        assert!(matches!(
            ols_fit(&[1.0, 2.0, 3.0], &design),
            Err(ForecastError::LengthMismatch { .. })
        ));
    }
}
