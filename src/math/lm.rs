//! Levenberg–Marquardt for small nonlinear least-squares problems.
//!
//! Minimizes `Σ r_i(p)²` for a residual function `r: ℝᵏ → ℝⁿ` with `n ≥ k`.
//!
//! Implementation choices:
//! - forward-difference Jacobian (the resonance model is cheap to evaluate)
//! - Marquardt scaling `D = diag(√(JᵀJ))` so mass (~90) and width (~3) are
//!   damped on comparable footing
//! - each damped step is a tall linear least-squares solve (see `ols`)
//! - every residual evaluation, including Jacobian columns, counts against
//!   the evaluation budget

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::math::ols::solve_least_squares;

/// Relative step used for finite differences (≈ √ε).
const FD_STEP: f64 = 1.490_116_119_384_765_6e-8;

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;

/// Stopping rules.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Maximum number of residual evaluations.
    pub max_evals: usize,
    /// Stop when an accepted step reduces the cost by less than this fraction.
    pub ftol: f64,
    /// Stop when the step is smaller than this fraction of the parameter norm.
    pub xtol: f64,
    /// Stop when the largest gradient component falls below this value.
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evals: 1000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
        }
    }
}

/// Converged optimizer state.
#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Jacobian of the residuals at `params`.
    pub jacobian: DMatrix<f64>,
    /// `Σ r_i²` at `params`.
    pub cost: f64,
    pub evaluations: usize,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmFailure {
    #[error("evaluation budget of {0} exhausted")]
    EvaluationBudget(usize),
    #[error("objective is not finite at the starting point")]
    NonFiniteStart,
    #[error("damped normal equations are singular")]
    Singular,
    #[error("no downhill step found")]
    Stalled,
}

/// Residual function with an evaluation counter and budget.
struct Objective<F> {
    f: F,
    evals: usize,
    max_evals: usize,
}

impl<F> Objective<F>
where
    F: Fn(&[f64]) -> DVector<f64>,
{
    fn call(&mut self, p: &DVector<f64>) -> Result<DVector<f64>, LmFailure> {
        if self.evals >= self.max_evals {
            return Err(LmFailure::EvaluationBudget(self.max_evals));
        }
        self.evals += 1;
        Ok((self.f)(p.as_slice()))
    }

    fn jacobian(&mut self, p: &DVector<f64>, r: &DVector<f64>) -> Result<DMatrix<f64>, LmFailure> {
        let n = r.len();
        let k = p.len();
        let mut jac = DMatrix::<f64>::zeros(n, k);
        for j in 0..k {
            let h = FD_STEP * p[j].abs().max(1.0);
            let mut shifted = p.clone();
            shifted[j] += h;
            let r_h = self.call(&shifted)?;
            for i in 0..n {
                jac[(i, j)] = (r_h[i] - r[i]) / h;
            }
        }
        Ok(jac)
    }
}

/// Minimize `‖residual(p)‖²` starting from `p0`.
pub fn levenberg_marquardt<F>(
    residual: F,
    p0: &[f64],
    opts: &LmOptions,
) -> Result<LmSolution, LmFailure>
where
    F: Fn(&[f64]) -> DVector<f64>,
{
    let mut obj = Objective {
        f: residual,
        evals: 0,
        max_evals: opts.max_evals,
    };

    let mut p = DVector::from_row_slice(p0);
    let mut r = obj.call(&p)?;
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(LmFailure::NonFiniteStart);
    }

    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        let jac = obj.jacobian(&p, &r)?;
        let grad = jac.transpose() * &r;
        if grad.amax() <= opts.gtol || cost == 0.0 {
            return Ok(finish(p, r, jac, cost, obj.evals, iterations));
        }

        let scale = column_scale(&jac);

        // Inner loop: raise the damping until a step goes downhill.
        let converged = loop {
            let step = damped_step(&jac, &r, &scale, lambda).ok_or(LmFailure::Singular)?;
            let step_small = step.norm() <= opts.xtol * (p.norm() + opts.xtol);
            let candidate = &p + &step;
            let r_new = obj.call(&candidate)?;
            let cost_new = r_new.norm_squared();

            if cost_new.is_finite() && cost_new < cost {
                let reduction = (cost - cost_new) / cost;
                log::trace!(
                    "lm iter {iterations}: cost {cost:.6e} -> {cost_new:.6e}, lambda={lambda:.1e}"
                );
                p = candidate;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);
                break reduction <= opts.ftol || step_small;
            }

            if step_small {
                break true;
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(LmFailure::Stalled);
            }
        };

        if converged {
            // Covariance needs the Jacobian at the accepted point.
            let jac = obj.jacobian(&p, &r)?;
            return Ok(finish(p, r, jac, cost, obj.evals, iterations));
        }
    }
}

fn finish(
    params: DVector<f64>,
    residuals: DVector<f64>,
    jacobian: DMatrix<f64>,
    cost: f64,
    evaluations: usize,
    iterations: usize,
) -> LmSolution {
    LmSolution {
        params,
        residuals,
        jacobian,
        cost,
        evaluations,
        iterations,
    }
}

fn column_scale(jac: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        jac.ncols(),
        jac.column_iter().map(|c| c.norm().max(1e-12)),
    )
}

fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let k = jac.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(n + k, k);
    let mut b = DVector::<f64>::zeros(n + k);
    a.view_mut((0, 0), (n, k)).copy_from(jac);
    for i in 0..n {
        b[i] = -r[i];
    }
    for j in 0..k {
        a[(n + j, j)] = sqrt_lambda * scale[j];
    }

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_decay_residuals(t: &[f64], y: &[f64]) -> impl Fn(&[f64]) -> DVector<f64> {
        let t = t.to_vec();
        let y = y.to_vec();
        move |p: &[f64]| {
            DVector::from_iterator(
                t.len(),
                t.iter().zip(&y).map(|(&ti, &yi)| p[0] * (-p[1] * ti).exp() - yi),
            )
        }
    }

    #[test]
    fn recovers_exponential_decay_parameters() {
        let t: Vec<f64> = (0..15).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 4.0 * (-0.7 * ti).exp()).collect();

        let residuals = exp_decay_residuals(&t, &y);
        let sol = levenberg_marquardt(residuals, &[1.0, 0.1], &LmOptions::default()).unwrap();
        assert!((sol.params[0] - 4.0).abs() < 1e-6, "a={}", sol.params[0]);
        assert!((sol.params[1] - 0.7).abs() < 1e-6, "b={}", sol.params[1]);
        assert!(sol.cost < 1e-12);
        assert!(sol.evaluations <= 1000);
        assert_eq!(sol.jacobian.nrows(), t.len());
    }

    #[test]
    fn linear_problem_matches_closed_form() {
        // y = 2 + 3x exactly.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [2.0, 5.0, 8.0, 11.0];
        let sol = levenberg_marquardt(
            |p: &[f64]| {
                DVector::from_iterator(4, x.iter().zip(&y).map(|(&xi, &yi)| p[0] + p[1] * xi - yi))
            },
            &[0.0, 0.0],
            &LmOptions::default(),
        )
        .unwrap();
        assert!((sol.params[0] - 2.0).abs() < 1e-6);
        assert!((sol.params[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn tiny_budget_is_reported() {
        let t = [0.0, 1.0, 2.0];
        let y = [1.0, 0.5, 0.25];
        let opts = LmOptions {
            max_evals: 1,
            ..LmOptions::default()
        };
        let err = levenberg_marquardt(exp_decay_residuals(&t, &y), &[3.0, 0.1], &opts).unwrap_err();
        assert_eq!(err, LmFailure::EvaluationBudget(1));
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let err = levenberg_marquardt(
            |_: &[f64]| DVector::from_element(3, f64::NAN),
            &[1.0, 1.0],
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, LmFailure::NonFiniteStart);
    }
}
