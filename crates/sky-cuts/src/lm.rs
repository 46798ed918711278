//! Levenberg-Marquardt line fitter used by ZScale2.
//!
//! The solver keeps its scratch buffers in one process-wide workspace, so it
//! is not re-entrant. [`fit_line`] takes the global lock for the duration of
//! the solve and nothing else.

use std::sync::{Mutex, PoisonError};
use tracing::trace;

const MAX_ITER: usize = 100;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;
const REL_TOL: f64 = 1e-12;

/// Result of a straight-line fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    /// Value at `x = 0`.
    pub intercept: f64,
    /// Change per unit `x`.
    pub slope: f64,
    /// Sum of squared residuals at the solution.
    pub cost: f64,
    /// Accepted steps.
    pub iterations: usize,
}

struct Workspace {
    residuals: Vec<f64>,
}

static WORKSPACE: Mutex<Workspace> = Mutex::new(Workspace { residuals: Vec::new() });

/// Fits a line through `(x, y)` by damped least squares.
///
/// Returns `None` if the normal equations are singular or the solution is
/// not finite.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mut ws = WORKSPACE.lock().unwrap_or_else(PoisonError::into_inner);
    ws.solve(x, y)
}

impl Workspace {
    fn eval(&mut self, x: &[f64], y: &[f64], p: [f64; 2]) -> f64 {
        self.residuals.clear();
        self.residuals
            .extend(x.iter().zip(y).map(|(&xi, &yi)| yi - (p[0] + p[1] * xi)));
        self.residuals.iter().map(|r| r * r).sum()
    }

    fn solve(&mut self, x: &[f64], y: &[f64]) -> Option<LineFit> {
        let n = x.len() as f64;
        let a00 = n;
        let a01: f64 = x.iter().sum();
        let a11: f64 = x.iter().map(|v| v * v).sum();

        let mut p = [y.iter().sum::<f64>() / n, 0.0];
        let mut lambda = LAMBDA_INIT;
        let mut iterations = 0;
        let mut cost = self.eval(x, y, p);

        for _ in 0..MAX_ITER {
            if cost <= f64::MIN_POSITIVE {
                break;
            }
            let g0: f64 = self.residuals.iter().sum();
            let g1: f64 = self.residuals.iter().zip(x).map(|(r, xi)| r * xi).sum();

            let mut improved = None;
            while lambda <= LAMBDA_MAX {
                let b00 = a00 * (1.0 + lambda);
                let b11 = a11 * (1.0 + lambda);
                let det = b00 * b11 - a01 * a01;
                if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
                    return None;
                }
                let trial = [
                    p[0] + (b11 * g0 - a01 * g1) / det,
                    p[1] + (b00 * g1 - a01 * g0) / det,
                ];
                let trial_cost = self.eval(x, y, trial);
                if trial_cost < cost {
                    improved = Some((trial, trial_cost));
                    lambda = (lambda / 10.0).max(1e-12);
                    break;
                }
                lambda *= 10.0;
            }

            let Some((next, next_cost)) = improved else { break };
            let gain = cost - next_cost;
            p = next;
            iterations += 1;
            // residuals must describe p for the next gradient
            cost = self.eval(x, y, p);
            if gain <= REL_TOL * next_cost.max(f64::MIN_POSITIVE) {
                break;
            }
        }

        trace!(iterations, cost, intercept = p[0], slope = p[1], "lm fit_line");
        (p[0].is_finite() && p[1].is_finite()).then_some(LineFit {
            intercept: p[0],
            slope: p[1],
            cost,
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 49.0 * 2.0 - 1.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-6);
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_data() {
        let x = [-1.0, 0.0, 1.0];
        let y = [5.0, 5.0, 5.0];
        let fit = fit_line(&x, &y).unwrap();
        assert_relative_eq!(fit.intercept, 5.0);
        assert_relative_eq!(fit.slope, 0.0);
    }

    #[test]
    fn test_too_few_points() {
        assert!(fit_line(&[1.0], &[1.0]).is_none());
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_parallel_callers() {
        let handles: Vec<_> = (0..4)
            .map(|k| {
                std::thread::spawn(move || {
                    let x: Vec<f64> = (0..200).map(|i| i as f64).collect();
                    let y: Vec<f64> = x.iter().map(|v| k as f64 + 0.5 * v).collect();
                    fit_line(&x, &y).unwrap()
                })
            })
            .collect();
        for (k, h) in handles.into_iter().enumerate() {
            let fit = h.join().unwrap();
            assert_relative_eq!(fit.intercept, k as f64, epsilon = 1e-4);
            assert_relative_eq!(fit.slope, 0.5, epsilon = 1e-6);
        }
    }
}
