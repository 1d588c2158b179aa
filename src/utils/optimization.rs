//! Optimization utilities for parameter estimation.
//!
//! Estimators talk to an [`Optimizer`] through the [`Objective`] trait, so the
//! solver is pluggable: [`NelderMead`] (derivative-free, the default) and
//! [`Bfgs`] (quasi-Newton with finite-difference gradients) both minimize any
//! objective and respect its feasible region via [`Objective::project`].

use log::trace;
use std::fmt::Debug;

/// A function to minimize.
///
/// Plain closures `Fn(&[f64]) -> f64` are objectives with no constraints.
pub trait Objective {
    /// Objective value at `x`. Non-finite values mark infeasible points.
    fn value(&self, x: &[f64]) -> f64;

    /// Map `x` back into the feasible region in place.
    ///
    /// Optimizers call this on every trial point before evaluating it.
    fn project(&self, _x: &mut [f64]) {}
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> f64,
{
    fn value(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Box constraints around another objective.
#[derive(Debug, Clone)]
pub struct Bounded<F> {
    objective: F,
    bounds: Vec<(f64, f64)>,
}

impl<F: Fn(&[f64]) -> f64> Bounded<F> {
    /// Constrain dimension `i` to `bounds[i]`; extra dimensions are free.
    pub fn new(objective: F, bounds: Vec<(f64, f64)>) -> Self {
        Self { objective, bounds }
    }
}

impl<F: Fn(&[f64]) -> f64> Objective for Bounded<F> {
    fn value(&self, x: &[f64]) -> f64 {
        (self.objective)(x)
    }

    fn project(&self, x: &mut [f64]) {
        for (xi, &(lo, hi)) in x.iter_mut().zip(&self.bounds) {
            *xi = xi.clamp(lo, hi);
        }
    }
}

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether a convergence criterion was met before the iteration cap.
    pub converged: bool,
}

impl OptimizationResult {
    fn empty() -> Self {
        Self {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            evaluations: 0,
            converged: false,
        }
    }
}

/// A numerical minimizer.
pub trait Optimizer: Debug + Send + Sync {
    /// Minimize `objective` starting from `initial`.
    ///
    /// Never fails: on non-convergence the best iterate is returned with
    /// `converged == false`.
    fn minimize(&self, objective: &dyn Objective, initial: &[f64]) -> OptimizationResult;

    /// Solver name for diagnostics.
    fn name(&self) -> &str;
}

/// Counts evaluations and maps non-finite values to `+inf`.
struct Evaluator<'a> {
    objective: &'a dyn Objective,
    count: usize,
}

impl<'a> Evaluator<'a> {
    fn new(objective: &'a dyn Objective) -> Self {
        Self {
            objective,
            count: 0,
        }
    }

    fn feasible(&self, x: &[f64]) -> Vec<f64> {
        let mut x = x.to_vec();
        self.objective.project(&mut x);
        x
    }

    fn eval(&mut self, x: &[f64]) -> f64 {
        self.count += 1;
        let v = self.objective.value(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    }
}

/// Relative change test shared by the solvers.
fn relative_change_below(previous: f64, current: f64, tolerance: f64) -> bool {
    (previous - current).abs() <= tolerance * (previous.abs() + current.abs() + tolerance)
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values across the simplex.
    pub tolerance: f64,
    /// Absolute tolerance on the simplex diameter.
    pub x_tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            x_tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Nelder-Mead simplex optimizer.
///
/// # Example
/// ```
/// use anofox_fints::utils::optimization::{NelderMead, Optimizer};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let objective = |x: &[f64]| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2);
/// let result = NelderMead::default().minimize(&objective, &[0.0, 0.0]);
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    config: NelderMeadConfig,
}

impl NelderMead {
    pub fn new(config: NelderMeadConfig) -> Self {
        Self { config }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }
}

impl Optimizer for NelderMead {
    fn minimize(&self, objective: &dyn Objective, initial: &[f64]) -> OptimizationResult {
        let config = &self.config;
        let n = initial.len();
        if n == 0 {
            return OptimizationResult::empty();
        }

        let mut eval = Evaluator::new(objective);

        // Initialize simplex with n+1 vertices
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(eval.feasible(initial));

        for i in 0..n {
            let mut vertex = simplex[0].clone();
            let step = if vertex[i].abs() > 1e-10 {
                config.initial_step * vertex[i].abs()
            } else {
                config.initial_step
            };
            vertex[i] += step;
            let mut vertex = eval.feasible(&vertex);
            // Projection may undo the step; try the other direction
            if vertex == simplex[0] {
                vertex[i] -= 2.0 * step;
                vertex = eval.feasible(&vertex);
            }
            simplex.push(vertex);
        }

        let mut values: Vec<f64> = simplex.iter().map(|v| eval.eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iter {
            iterations += 1;

            // Sort vertices by objective value
            let mut indices: Vec<usize> = (0..=n).collect();
            indices.sort_by(|&a, &b| {
                values[a]
                    .partial_cmp(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let best_idx = indices[0];
            let worst_idx = indices[n];
            let second_worst_idx = indices[n - 1];

            // Check convergence
            if values[best_idx].is_finite()
                && relative_change_below(values[worst_idx], values[best_idx], config.tolerance)
            {
                converged = true;
                break;
            }

            // Also check if simplex has collapsed
            let centroid = compute_centroid(&simplex, worst_idx);
            let max_dist = simplex
                .iter()
                .map(|v| euclidean_distance(v, &centroid))
                .fold(0.0, f64::max);
            if max_dist < config.x_tolerance {
                converged = true;
                break;
            }

            // Reflection
            let reflected = eval.feasible(&reflect(&simplex[worst_idx], &centroid, config.alpha));
            let reflected_value = eval.eval(&reflected);

            if reflected_value < values[second_worst_idx] && reflected_value >= values[best_idx] {
                simplex[worst_idx] = reflected;
                values[worst_idx] = reflected_value;
                continue;
            }

            if reflected_value < values[best_idx] {
                // Try expansion
                let expanded = eval.feasible(&expand(&centroid, &reflected, config.gamma));
                let expanded_value = eval.eval(&expanded);

                if expanded_value < reflected_value {
                    simplex[worst_idx] = expanded;
                    values[worst_idx] = expanded_value;
                } else {
                    simplex[worst_idx] = reflected;
                    values[worst_idx] = reflected_value;
                }
                continue;
            }

            // Contraction
            if reflected_value < values[worst_idx] {
                // Outside contraction
                let contracted = eval.feasible(&contract(&centroid, &reflected, config.rho));
                let contracted_value = eval.eval(&contracted);

                if contracted_value <= reflected_value {
                    simplex[worst_idx] = contracted;
                    values[worst_idx] = contracted_value;
                    continue;
                }
            } else {
                // Inside contraction
                let contracted =
                    eval.feasible(&contract(&centroid, &simplex[worst_idx], config.rho));
                let contracted_value = eval.eval(&contracted);

                if contracted_value < values[worst_idx] {
                    simplex[worst_idx] = contracted;
                    values[worst_idx] = contracted_value;
                    continue;
                }
            }

            // Shrink
            let best = simplex[best_idx].clone();
            for i in 0..=n {
                if i != best_idx {
                    let shrunk: Vec<f64> = best
                        .iter()
                        .zip(&simplex[i])
                        .map(|(b, x)| b + config.sigma * (x - b))
                        .collect();
                    simplex[i] = eval.feasible(&shrunk);
                    values[i] = eval.eval(&simplex[i]);
                }
            }
        }

        let best_idx = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        trace!(
            "nelder-mead: {} iterations, {} evaluations, value {}",
            iterations,
            eval.count,
            values[best_idx]
        );

        OptimizationResult {
            optimal_point: simplex[best_idx].clone(),
            optimal_value: values[best_idx],
            iterations,
            evaluations: eval.count,
            converged,
        }
    }

    fn name(&self) -> &str {
        "Nelder-Mead"
    }
}

/// Compute centroid of simplex excluding the worst vertex.
fn compute_centroid(simplex: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = simplex.len() - 1;
    let mut centroid = vec![0.0; n];

    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude_idx {
            for j in 0..n {
                centroid[j] += vertex[j];
            }
        }
    }

    for c in &mut centroid {
        *c /= count as f64;
    }

    centroid
}

/// Reflect a point through the centroid.
fn reflect(point: &[f64], centroid: &[f64], alpha: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + alpha * (c - p))
        .collect()
}

/// Expand from centroid towards reflected point.
fn expand(centroid: &[f64], reflected: &[f64], gamma: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(reflected.iter())
        .map(|(c, r)| c + gamma * (r - c))
        .collect()
}

/// Contract between centroid and a point.
fn contract(centroid: &[f64], point: &[f64], rho: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + rho * (p - c))
        .collect()
}

/// Euclidean distance between two points.
fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Configuration for BFGS optimization.
#[derive(Debug, Clone)]
pub struct BfgsConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative tolerance on the objective improvement per iteration.
    pub tolerance: f64,
    /// Infinity-norm tolerance on the gradient.
    pub grad_tolerance: f64,
    /// Relative finite-difference step.
    pub fd_step: f64,
    /// Armijo sufficient-decrease constant.
    pub armijo: f64,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-10,
            grad_tolerance: 1e-6,
            fd_step: 1e-6,
            armijo: 1e-4,
        }
    }
}

/// BFGS quasi-Newton optimizer with central finite-difference gradients and
/// a backtracking (Armijo) line search along projected steps.
#[derive(Debug, Clone, Default)]
pub struct Bfgs {
    config: BfgsConfig,
}

impl Bfgs {
    pub fn new(config: BfgsConfig) -> Self {
        Self { config }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn config(&self) -> &BfgsConfig {
        &self.config
    }

    fn gradient(&self, eval: &mut Evaluator<'_>, x: &[f64], fx: f64) -> Vec<f64> {
        let mut grad = vec![0.0; x.len()];
        let mut probe = x.to_vec();
        for i in 0..x.len() {
            let h = self.config.fd_step * x[i].abs().max(1.0);
            probe[i] = x[i] + h;
            let f_plus = eval.eval(&probe);
            probe[i] = x[i] - h;
            let f_minus = eval.eval(&probe);
            probe[i] = x[i];

            grad[i] = match (f_plus.is_finite(), f_minus.is_finite()) {
                (true, true) => (f_plus - f_minus) / (2.0 * h),
                (true, false) => (f_plus - fx) / h,
                (false, true) => (fx - f_minus) / h,
                (false, false) => 0.0,
            };
        }
        grad
    }
}

impl Optimizer for Bfgs {
    fn minimize(&self, objective: &dyn Objective, initial: &[f64]) -> OptimizationResult {
        let config = &self.config;
        let n = initial.len();
        if n == 0 {
            return OptimizationResult::empty();
        }

        let mut eval = Evaluator::new(objective);
        let mut x = eval.feasible(initial);
        let mut fx = eval.eval(&x);
        if !fx.is_finite() {
            return OptimizationResult {
                optimal_point: x,
                optimal_value: fx,
                iterations: 0,
                evaluations: eval.count,
                converged: false,
            };
        }
        let mut grad = self.gradient(&mut eval, &x, fx);

        // Inverse Hessian approximation
        let mut h_inv = identity(n);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iter {
            iterations += 1;

            if grad.iter().fold(0.0_f64, |m, g| m.max(g.abs())) < config.grad_tolerance {
                converged = true;
                break;
            }

            let mut direction = mat_vec(&h_inv, &grad);
            direction.iter_mut().for_each(|d| *d = -*d);
            if dot(&grad, &direction) >= 0.0 {
                // Not a descent direction: restart from steepest descent
                h_inv = identity(n);
                direction = grad.iter().map(|g| -g).collect();
            }

            // Backtracking line search along the projected step
            let mut step = 1.0;
            let mut accepted = None;
            while step > 1e-12 {
                let trial: Vec<f64> = x
                    .iter()
                    .zip(&direction)
                    .map(|(xi, di)| xi + step * di)
                    .collect();
                let trial = eval.feasible(&trial);
                let f_trial = eval.eval(&trial);
                let moved: Vec<f64> = trial.iter().zip(&x).map(|(t, xi)| t - xi).collect();
                if f_trial.is_finite() && f_trial <= fx + config.armijo * dot(&grad, &moved) {
                    accepted = Some((trial, f_trial, moved));
                    break;
                }
                step *= 0.5;
            }

            let Some((x_new, f_new, s)) = accepted else {
                // No decrease possible along any step length
                break;
            };

            let grad_new = self.gradient(&mut eval, &x_new, f_new);
            let y: Vec<f64> = grad_new.iter().zip(&grad).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);

            if sy > 1e-12 {
                let hy = mat_vec(&h_inv, &y);
                let yhy = dot(&y, &hy);
                let scale = (sy + yhy) / (sy * sy);
                for i in 0..n {
                    for j in 0..n {
                        h_inv[i][j] += scale * s[i] * s[j] - (hy[i] * s[j] + s[i] * hy[j]) / sy;
                    }
                }
            }

            let small_change = relative_change_below(fx, f_new, config.tolerance);
            x = x_new;
            fx = f_new;
            grad = grad_new;

            if small_change {
                converged = true;
                break;
            }
        }

        trace!(
            "bfgs: {} iterations, {} evaluations, value {}",
            iterations,
            eval.count,
            fx
        );

        OptimizationResult {
            optimal_point: x,
            optimal_value: fx,
            iterations,
            evaluations: eval.count,
            converged,
        }
    }

    fn name(&self) -> &str {
        "BFGS"
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
