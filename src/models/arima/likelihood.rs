//! Gaussian ARMA likelihoods with the innovation variance concentrated out.
//!
//! The exact likelihood runs a Kalman filter over the Harvey state-space form
//! of the ARMA process, started from its stationary covariance. The
//! conditional likelihood (CSS) sets pre-sample innovations to zero and
//! conditions on the first `p` observations.

use crate::utils::linalg::solve_linear;
use std::f64::consts::PI;

/// Variance used for non-stationary initial states.
const DIFFUSE_VARIANCE: f64 = 1e6;

/// Likelihood evaluation at one parameter point.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    /// Concentrated log-likelihood.
    pub loglik: f64,
    /// Innovation variance estimate.
    pub sigma2: f64,
    /// One-step prediction errors, one per observation.
    pub residuals: Vec<f64>,
    /// Observations contributing to the likelihood.
    pub nobs: usize,
    /// Predicted state `a_{n+1|n}` after the last observation (exact only).
    pub state: Option<Vec<f64>>,
}

/// Exact log-likelihood of a zero-mean ARMA series via the Kalman filter.
///
/// Returns `None` when the filter breaks down (non-positive prediction
/// variance or non-finite values).
pub(crate) fn exact(y: &[f64], ar: &[f64], ma: &[f64]) -> Option<Evaluation> {
    let n = y.len();
    if n == 0 {
        return None;
    }

    let r = ar.len().max(ma.len() + 1);

    // Transition: AR coefficients down the first column, identity above the diagonal
    let mut t = vec![vec![0.0; r]; r];
    for (i, &phi) in ar.iter().enumerate() {
        t[i][0] = phi;
    }
    for i in 0..r - 1 {
        t[i][i + 1] = 1.0;
    }

    // Selection vector [1, θ1, ..., θ_{r-1}]
    let mut sel = vec![0.0; r];
    sel[0] = 1.0;
    for (i, &theta) in ma.iter().enumerate() {
        sel[i + 1] = theta;
    }
    let rr: Vec<Vec<f64>> = (0..r)
        .map(|i| (0..r).map(|j| sel[i] * sel[j]).collect())
        .collect();

    let mut p = stationary_covariance(&t, &rr).unwrap_or_else(|| {
        let mut diffuse = vec![vec![0.0; r]; r];
        for (i, row) in diffuse.iter_mut().enumerate() {
            row[i] = DIFFUSE_VARIANCE;
        }
        diffuse
    });
    let mut a = vec![0.0; r];

    let mut residuals = Vec::with_capacity(n);
    let mut sum_log_f = 0.0;
    let mut sum_scaled = 0.0;

    for &obs in y {
        let v = obs - a[0];
        let f = p[0][0];
        if f <= 0.0 || !f.is_finite() {
            return None;
        }
        residuals.push(v);
        sum_log_f += f.ln();
        sum_scaled += v * v / f;

        // Gain K = T P Z' / F with Z = e1
        let tp: Vec<Vec<f64>> = mat_mul(&t, &p);
        let k: Vec<f64> = (0..r).map(|i| tp[i][0] / f).collect();

        // a <- T a + K v
        let mut a_next: Vec<f64> = (0..r)
            .map(|i| (0..r).map(|j| t[i][j] * a[j]).sum())
            .collect();
        for i in 0..r {
            a_next[i] += k[i] * v;
        }
        a = a_next;

        // P <- T P T' + R R' - K K' F
        let mut p_next = vec![vec![0.0; r]; r];
        for i in 0..r {
            for j in 0..r {
                let tpt: f64 = (0..r).map(|m| tp[i][m] * t[j][m]).sum();
                p_next[i][j] = tpt + rr[i][j] - k[i] * k[j] * f;
            }
        }
        p = p_next;
    }

    let nf = n as f64;
    let sigma2 = sum_scaled / nf;
    if sigma2 <= 0.0 || !sigma2.is_finite() {
        return None;
    }
    let loglik = -0.5 * nf * ((2.0 * PI).ln() + sigma2.ln() + 1.0) - 0.5 * sum_log_f;

    Some(Evaluation {
        loglik,
        sigma2,
        residuals,
        nobs: n,
        state: Some(a),
    })
}

/// Conditional (CSS) log-likelihood of a zero-mean ARMA series.
///
/// Residuals for the first `p` observations are zero and excluded from the
/// sum of squares.
pub(crate) fn conditional(y: &[f64], ar: &[f64], ma: &[f64]) -> Option<Evaluation> {
    let n = y.len();
    let p = ar.len();
    if n <= p {
        return None;
    }

    let mut residuals = vec![0.0; n];
    let mut css = 0.0;
    for t in p..n {
        let mut pred = 0.0;
        for (i, &phi) in ar.iter().enumerate() {
            pred += phi * y[t - 1 - i];
        }
        for (j, &theta) in ma.iter().enumerate() {
            if t > j {
                pred += theta * residuals[t - 1 - j];
            }
        }
        let e = y[t] - pred;
        residuals[t] = e;
        css += e * e;
    }

    let nobs = n - p;
    let sigma2 = css / nobs as f64;
    if sigma2 <= 0.0 || !sigma2.is_finite() {
        return None;
    }
    let loglik = -0.5 * nobs as f64 * ((2.0 * PI).ln() + sigma2.ln() + 1.0);

    Some(Evaluation {
        loglik,
        sigma2,
        residuals,
        nobs,
        state: None,
    })
}

/// Solve `P = T P T' + R R'` through `(I - T⊗T) vec(P) = vec(RR')`.
fn stationary_covariance(t: &[Vec<f64>], rr: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let r = t.len();
    let m = r * r;
    let mut lhs = vec![vec![0.0; m]; m];
    let mut rhs = vec![0.0; m];

    for i in 0..r {
        for j in 0..r {
            let row = i * r + j;
            rhs[row] = rr[i][j];
            lhs[row][row] += 1.0;
            for k in 0..r {
                for l in 0..r {
                    lhs[row][k * r + l] -= t[i][k] * t[j][l];
                }
            }
        }
    }

    let vec_p = solve_linear(&lhs, &rhs)?;
    let p: Vec<Vec<f64>> = (0..r)
        .map(|i| (0..r).map(|j| vec_p[i * r + j]).collect())
        .collect();

    if (0..r).any(|i| p[i][i] < 0.0 || !p[i][i].is_finite()) || p[0][0] <= 0.0 {
        return None;
    }
    Some(p)
}

fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let m = b[0].len();
    let inner = b.len();
    let mut out = vec![vec![0.0; m]; n];
    for i in 0..n {
        for k in 0..inner {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..m {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn white_noise_exact_matches_closed_form() {
        let y = [0.5, -1.0, 0.3, 0.8, -0.2];
        let eval = exact(&y, &[], &[]).unwrap();
        let ss: f64 = y.iter().map(|v| v * v).sum();
        let sigma2 = ss / 5.0;
        assert_relative_eq!(eval.sigma2, sigma2, epsilon = 1e-12);
        let expected = -2.5 * ((2.0 * PI).ln() + sigma2.ln() + 1.0);
        assert_relative_eq!(eval.loglik, expected, epsilon = 1e-10);
        assert_eq!(eval.residuals, y.to_vec());
    }

    #[test]
    fn ar1_stationary_start_variance() {
        // First prediction variance is 1 / (1 - phi^2), later ones are 1
        let phi = 0.6;
        let y = [1.0, 0.4, -0.3, 0.2];
        let eval = exact(&y, &[phi], &[]).unwrap();

        let f0 = 1.0 / (1.0 - phi * phi);
        let scaled = y[0] * y[0] / f0
            + (1..4).map(|t| (y[t] - phi * y[t - 1]).powi(2)).sum::<f64>();
        let sigma2 = scaled / 4.0;
        assert_relative_eq!(eval.sigma2, sigma2, epsilon = 1e-10);

        let expected = -2.0 * ((2.0 * PI).ln() + sigma2.ln() + 1.0) - 0.5 * f0.ln();
        assert_relative_eq!(eval.loglik, expected, epsilon = 1e-10);
        assert_relative_eq!(eval.residuals[2], y[2] - phi * y[1], epsilon = 1e-12);
    }

    #[test]
    fn ma1_stationary_covariance() {
        let theta = 0.5;
        let r = vec![vec![1.0, theta], vec![theta, theta * theta]];
        let t = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
        let p = stationary_covariance(&t, &r).unwrap();
        // Var(y) = 1 + theta^2
        assert_relative_eq!(p[0][0], 1.0 + theta * theta, epsilon = 1e-12);
    }

    #[test]
    fn nonstationary_ar_uses_diffuse_start() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let eval = exact(&y, &[1.0], &[]).unwrap();
        assert!(eval.loglik.is_finite());
        assert_relative_eq!(eval.residuals[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn conditional_ar1_conditions_on_first_value() {
        let y = [1.0, 0.4, -0.3, 0.2];
        let eval = conditional(&y, &[0.6], &[]).unwrap();
        assert_eq!(eval.nobs, 3);
        assert_eq!(eval.residuals[0], 0.0);
        let css: f64 = (1..4).map(|t| (y[t] - 0.6 * y[t - 1]).powi(2)).sum();
        assert_relative_eq!(eval.sigma2, css / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn conditional_ma1_recursion() {
        let y = [1.0, 0.5, -0.5];
        let eval = conditional(&y, &[], &[0.5]).unwrap();
        // e0 = 1, e1 = 0.5 - 0.5, e2 = -0.5 - 0
        assert_relative_eq!(eval.residuals[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(eval.residuals[2], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn exact_and_conditional_agree_for_long_ar1() {
        let mut y = vec![0.0];
        let mut state = 11u64;
        for _ in 1..3000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let e = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            let prev = *y.last().unwrap();
            y.push(0.5 * prev + e);
        }
        let ex = exact(&y, &[0.5], &[]).unwrap();
        let css = conditional(&y, &[0.5], &[]).unwrap();
        assert_relative_eq!(ex.sigma2, css.sigma2, max_relative = 1e-2);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(exact(&[], &[], &[]).is_none());
        assert!(conditional(&[1.0], &[0.5], &[]).is_none());
        assert!(exact(&[0.0, 0.0, 0.0], &[], &[]).is_none());
    }
}
