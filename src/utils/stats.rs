//! Statistical utility functions.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use anofox_fints::utils::normal_quantile;
///
/// // 95% two-sided confidence level -> z ≈ 1.96
/// let z = normal_quantile(0.975);
/// assert!((z - 1.959964).abs() < 1e-5);
/// ```
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(p))
        .unwrap_or(f64::NAN)
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|n| n.cdf(x)).unwrap_or(f64::NAN)
}

/// Survival function `P(X > x)` of a chi-squared variable with `df` degrees
/// of freedom.
pub fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if x <= 0.0 || df == 0 {
        return 1.0;
    }
    ChiSquared::new(df as f64)
        .map(|d| d.sf(x))
        .unwrap_or(f64::NAN)
}

/// Two-sided z multiplier for a confidence `level` in (0, 1).
pub fn z_for_level(level: f64) -> f64 {
    normal_quantile((1.0 + level) / 2.0)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Population variance (n denominator), the moment estimator used to seed
/// variance recursions.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Sample autocorrelation function for lags `0..=nlags`.
pub fn acf(values: &[f64], nlags: usize) -> Vec<f64> {
    (0..=nlags.min(values.len().saturating_sub(1)))
        .map(|lag| autocorrelation(values, lag))
        .collect()
}

/// Partial autocorrelation function for lags `0..=nlags` (Durbin-Levinson).
///
/// Element 0 is 1 by convention.
pub fn pacf(values: &[f64], nlags: usize) -> Vec<f64> {
    let rho = acf(values, nlags);
    let nlags = rho.len().saturating_sub(1);
    let mut result = Vec::with_capacity(nlags + 1);
    result.push(1.0);

    let mut phi_prev: Vec<f64> = Vec::new();
    for k in 1..=nlags {
        let num = rho[k] - (0..k - 1).map(|j| phi_prev[j] * rho[k - 1 - j]).sum::<f64>();
        let den = 1.0 - (0..k - 1).map(|j| phi_prev[j] * rho[j + 1]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut phi = vec![0.0; k];
        for j in 0..k - 1 {
            phi[j] = phi_prev[j] - phi_kk * phi_prev[k - 2 - j];
        }
        phi[k - 1] = phi_kk;

        result.push(phi_kk);
        phi_prev = phi;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_quantile_known_values() {
        assert_relative_eq!(normal_quantile(0.5), 0.0, epsilon = 1e-9);
        assert_relative_eq!(normal_quantile(0.975), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(normal_quantile(0.025), -1.959964, epsilon = 1e-5);
        assert_relative_eq!(z_for_level(0.99), 2.575829, epsilon = 1e-5);
    }

    #[test]
    fn normal_quantile_boundary_values() {
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
    }

    #[test]
    fn normal_cdf_is_symmetric() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normal_cdf(1.3) + normal_cdf(-1.3), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn chi_squared_sf_known_values() {
        // df = 2 is exponential with rate 1/2
        assert_relative_eq!(chi_squared_sf(2.0, 2), (-1.0_f64).exp(), epsilon = 1e-10);
        assert_relative_eq!(chi_squared_sf(3.841459, 1), 0.05, epsilon = 1e-5);
        assert_eq!(chi_squared_sf(0.0, 4), 1.0);
    }

    #[test]
    fn variances_use_expected_denominators() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(variance(&values), 2.5, epsilon = 1e-12);
        assert_relative_eq!(population_variance(&values), 2.0, epsilon = 1e-12);
        assert!(variance(&[1.0]).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn acf_starts_at_one() {
        let values: Vec<f64> = (0..20).map(|i| (i as f64 * 0.7).sin()).collect();
        let r = acf(&values, 5);
        assert_eq!(r.len(), 6);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pacf_of_ar1_cuts_off_after_lag_one() {
        // Deterministic AR(1) with phi = 0.6 driven by a bounded pseudo-random sequence
        let mut state = 7u64;
        let mut x = vec![0.0];
        for _ in 1..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let e = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            let prev = *x.last().unwrap();
            x.push(0.6 * prev + e);
        }
        let p = pacf(&x, 4);
        assert_relative_eq!(p[1], autocorrelation(&x, 1), epsilon = 1e-12);
        assert!((p[1] - 0.6).abs() < 0.08);
        for lag in 2..=4 {
            assert!(p[lag].abs() < 0.08, "lag {} pacf {}", lag, p[lag]);
        }
    }
}
