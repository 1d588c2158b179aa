//! Lag-polynomial helpers for ARMA coefficients.
//!
//! Sign conventions: the AR polynomial is `1 - φ₁B - … - φₚBᵖ` and the MA
//! polynomial is `1 + θ₁B + … + θ_qB^q`.

use rustfft::num_complex::Complex64;

/// Map unconstrained reals to stationary AR coefficients.
///
/// Each input is squashed through `tanh` into a partial autocorrelation and
/// the Durbin-Levinson recursion turns those into coefficients (Monahan,
/// 1984). Every real input vector yields a stationary polynomial.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for &x in unconstrained {
        let r = x.tanh();
        let previous = phi.clone();
        let k = previous.len();
        for j in 0..k {
            phi[j] = previous[j] - r * previous[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

/// Inverse of [`constrain_stationary`]; `None` when `phi` is not stationary.
pub fn unconstrain_stationary(phi: &[f64]) -> Option<Vec<f64>> {
    let mut current = phi.to_vec();
    let mut partials = vec![0.0; phi.len()];
    for k in (0..phi.len()).rev() {
        let r = current[k];
        if !r.is_finite() || r.abs() >= 1.0 {
            return None;
        }
        partials[k] = r;
        let denom = 1.0 - r * r;
        let next: Vec<f64> = (0..k)
            .map(|j| (current[j] + r * current[k - 1 - j]) / denom)
            .collect();
        current = next;
    }
    Some(partials.into_iter().map(f64::atanh).collect())
}

/// Map unconstrained reals to invertible MA coefficients.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|c| -c)
        .collect()
}

/// Inverse of [`constrain_invertible`]; `None` when `theta` is not invertible.
pub fn unconstrain_invertible(theta: &[f64]) -> Option<Vec<f64>> {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    unconstrain_stationary(&negated)
}

/// All roots of `1 - φ₁z - … - φₚzᵖ` lie outside the unit circle.
pub fn is_stationary(phi: &[f64]) -> bool {
    unconstrain_stationary(phi).is_some()
}

/// All roots of `1 + θ₁z + … + θ_qz^q` lie outside the unit circle.
pub fn is_invertible(theta: &[f64]) -> bool {
    unconstrain_invertible(theta).is_some()
}

/// Roots of `c₀ + c₁z + … + c_mz^m` by Durand-Kerner iteration.
///
/// Trailing zero coefficients are dropped, so the result has one root per
/// degree of the trimmed polynomial.
pub fn polynomial_roots(coefficients: &[f64]) -> Vec<Complex64> {
    let mut c = coefficients.to_vec();
    while c.last().is_some_and(|v| v.abs() < 1e-14) {
        c.pop();
    }
    if c.len() < 2 {
        return Vec::new();
    }

    let degree = c.len() - 1;
    if degree == 1 {
        return vec![Complex64::new(-c[0] / c[1], 0.0)];
    }

    let lead = c[degree];
    let monic: Vec<f64> = c.iter().map(|v| v / lead).collect();
    let eval = |z: Complex64| {
        monic
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, &coef| acc * z + coef)
    };

    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|k| seed.powu(k as u32)).collect();

    for _ in 0..1000 {
        let mut max_change: f64 = 0.0;
        for i in 0..degree {
            let zi = roots[i];
            let mut denom = Complex64::new(1.0, 0.0);
            for (j, &zj) in roots.iter().enumerate() {
                if j != i {
                    denom *= zi - zj;
                }
            }
            if denom.norm() < 1e-300 {
                roots[i] = zi + Complex64::new(1e-8, 1e-8);
                max_change = f64::INFINITY;
                continue;
            }
            let delta = eval(zi) / denom;
            roots[i] = zi - delta;
            max_change = max_change.max(delta.norm());
        }
        if max_change < 1e-14 {
            break;
        }
    }

    roots
}

/// Smallest root modulus of the MA polynomial; infinite when `q == 0`.
pub fn ma_min_root_modulus(theta: &[f64]) -> f64 {
    let mut coefficients = vec![1.0];
    coefficients.extend_from_slice(theta);
    polynomial_roots(&coefficients)
        .iter()
        .map(|z| z.norm())
        .fold(f64::INFINITY, f64::min)
}

/// Reflect MA roots inside the unit circle to their reciprocals.
///
/// Returns the new coefficients and the factor the innovation variance must
/// be multiplied by to keep the autocovariances unchanged.
pub fn reflect_ma_roots(theta: &[f64]) -> (Vec<f64>, f64) {
    let mut coefficients = vec![1.0];
    coefficients.extend_from_slice(theta);
    let roots = polynomial_roots(&coefficients);

    let mut variance_scale = 1.0;
    let reflected: Vec<Complex64> = roots
        .into_iter()
        .map(|z| {
            let modulus = z.norm();
            if modulus < 1.0 && modulus > 0.0 {
                variance_scale /= modulus * modulus;
                Complex64::new(1.0, 0.0) / z.conj()
            } else {
                z
            }
        })
        .collect();

    // Rebuild prod(1 - B / z_i), constant term 1
    let mut poly = vec![Complex64::new(1.0, 0.0)];
    for z in &reflected {
        let inv = Complex64::new(1.0, 0.0) / z;
        let mut next = poly.clone();
        next.push(Complex64::new(0.0, 0.0));
        for k in 1..next.len() {
            next[k] -= poly[k - 1] * inv;
        }
        poly = next;
    }

    let mut new_theta: Vec<f64> = poly.iter().skip(1).map(|c| c.re).collect();
    new_theta.resize(theta.len(), 0.0);
    (new_theta, variance_scale)
}

/// First `n` ψ-weights of the ARIMA(p, d, q) process.
///
/// The AR side includes the `(1 - B)^d` factor, so these are the MA(∞)
/// weights of the integrated series.
pub fn psi_weights(ar: &[f64], ma: &[f64], d: usize, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let mut poly = vec![1.0];
    poly.extend(ar.iter().map(|a| -a));
    for _ in 0..d {
        let mut next = poly.clone();
        next.push(0.0);
        for k in 1..next.len() {
            next[k] -= poly[k - 1];
        }
        poly = next;
    }
    let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

    let mut psi = vec![0.0; n];
    psi[0] = 1.0;
    for j in 1..n {
        let mut value = if j <= ma.len() { ma[j - 1] } else { 0.0 };
        for i in 1..=j.min(phi_star.len()) {
            value += phi_star[i - 1] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constrain_ar1_is_tanh() {
        let phi = constrain_stationary(&[0.5]);
        assert_relative_eq!(phi[0], 0.5_f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn constrained_values_are_stationary() {
        let inputs = [
            vec![3.0, -2.5],
            vec![-0.4, 1.7, 2.2],
            vec![2.0, -1.5, 0.7, 1.2],
        ];
        for x in &inputs {
            let phi = constrain_stationary(x);
            let roots = {
                let mut c = vec![1.0];
                c.extend(phi.iter().map(|v| -v));
                polynomial_roots(&c)
            };
            assert!(roots.iter().all(|z| z.norm() > 1.0 - 1e-9), "{:?}", phi);
        }
    }

    #[test]
    fn unconstrain_inverts_constrain() {
        let x = vec![0.3, -0.8, 1.1];
        let phi = constrain_stationary(&x);
        let back = unconstrain_stationary(&phi).unwrap();
        for (a, b) in x.iter().zip(&back) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }

        let theta = constrain_invertible(&x);
        let back = unconstrain_invertible(&theta).unwrap();
        for (a, b) in x.iter().zip(&back) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn stationarity_checks() {
        assert!(is_stationary(&[0.5]));
        assert!(!is_stationary(&[1.2]));
        // 1 - 1.5z + 0.56z^2 = (1 - 0.7z)(1 - 0.8z)
        assert!(is_stationary(&[1.5, -0.56]));
        // 1 - 0.5z - 0.6z^2 has a root inside the unit circle
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(is_invertible(&[0.9]));
        assert!(!is_invertible(&[-1.3]));
        assert!(is_stationary(&[]));
    }

    #[test]
    fn roots_of_quadratic() {
        // (1 - 0.5z)(1 - 0.25z) = 1 - 0.75z + 0.125z^2, roots 2 and 4
        let mut roots: Vec<f64> = polynomial_roots(&[1.0, -0.75, 0.125])
            .iter()
            .map(|z| z.re)
            .collect();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 4.0, epsilon = 1e-9);
    }

    #[test]
    fn complex_roots_modulus() {
        // 1 + 0.25z^2 has roots ±2i
        let roots = polynomial_roots(&[1.0, 0.0, 0.25]);
        assert_eq!(roots.len(), 2);
        for z in roots {
            assert_relative_eq!(z.norm(), 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn reflect_ma1() {
        let (theta, scale) = reflect_ma_roots(&[2.0]);
        assert_relative_eq!(theta[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(scale, 4.0, epsilon = 1e-10);
        // Same lag-0 and lag-1 autocovariances
        assert_relative_eq!(1.0 + 4.0, scale * (1.0 + theta[0] * theta[0]), epsilon = 1e-9);
        assert_relative_eq!(2.0, scale * theta[0], epsilon = 1e-9);
    }

    #[test]
    fn reflect_leaves_invertible_unchanged() {
        let (theta, scale) = reflect_ma_roots(&[0.4, 0.2]);
        assert_relative_eq!(theta[0], 0.4, epsilon = 1e-9);
        assert_relative_eq!(theta[1], 0.2, epsilon = 1e-9);
        assert_relative_eq!(scale, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn reflect_ma2_becomes_invertible() {
        let (theta, scale) = reflect_ma_roots(&[0.5, -2.0]);
        assert!(is_invertible(&theta), "{:?}", theta);
        assert!(scale > 1.0);
        assert!(ma_min_root_modulus(&theta) >= 1.0 - 1e-9);
    }

    #[test]
    fn ma_modulus_without_ma_terms() {
        assert!(ma_min_root_modulus(&[]).is_infinite());
        assert_relative_eq!(ma_min_root_modulus(&[0.5]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn psi_weights_known_processes() {
        // Random walk: all ones
        assert_eq!(psi_weights(&[], &[], 1, 4), vec![1.0; 4]);

        // AR(1): phi^j
        let psi = psi_weights(&[0.5], &[], 0, 4);
        assert_relative_eq!(psi[3], 0.125, epsilon = 1e-12);

        // ARMA(1,1): psi_1 = phi + theta, psi_2 = phi * psi_1
        let psi = psi_weights(&[0.6], &[0.3], 0, 3);
        assert_relative_eq!(psi[1], 0.9, epsilon = 1e-12);
        assert_relative_eq!(psi[2], 0.54, epsilon = 1e-12);

        // ARIMA(0,1,1): 1, 1 + theta, 1 + theta, ...
        let psi = psi_weights(&[], &[-0.4], 1, 4);
        assert_relative_eq!(psi[1], 0.6, epsilon = 1e-12);
        assert_relative_eq!(psi[3], 0.6, epsilon = 1e-12);

        // ARIMA(0,2,0): 1, 2, 3, ...
        let psi = psi_weights(&[], &[], 2, 4);
        assert_eq!(psi, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
