//! Least-squares solvers
//!
//! Two layers live here: a linear solver for the normal equations of an
//! arbitrary design matrix, and a Levenberg-Marquardt loop for nonlinear
//! models expressed as a residual closure. Both return plain coefficient
//! vectors so the fit layer stays free of `nalgebra` types.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector, SVD};

/// Solves the normal equations `XᵀX β = Xᵀy` for `β` via SVD.
///
/// The SVD cutoff scales with the largest singular value, so near-singular
/// design matrices (duplicate points, collinear columns) fail with
/// [`Error::Algebra`] instead of returning garbage coefficients.
///
/// # Errors
/// [`Error::Algebra`] if the decomposition cannot produce a solution.
pub fn solve_normal(design: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<Vec<f64>> {
    let xtx = design.transpose() * design;
    let xty = design.transpose() * rhs;

    let max_size = xtx.nrows().max(xtx.ncols()) as f64;
    let decomp = SVD::new_unordered(xtx, true, true);
    let epsilon = f64::EPSILON * max_size * decomp.singular_values.max();

    let solution = decomp.solve(&xty, epsilon).map_err(Error::Algebra)?;
    Ok(solution.data.into())
}

/// Convergence and stepping controls for [`curve_fit`].
#[derive(Debug, Clone)]
pub struct LeastSquaresOptions {
    /// Maximum number of accepted or rejected steps before giving up.
    pub max_iter: usize,
    /// Relative cost-reduction tolerance.
    pub f_tol: f64,
    /// Parameter step-size tolerance.
    pub x_tol: f64,
    /// Gradient infinity-norm tolerance.
    pub g_tol: f64,
    /// Forward-difference step for the numerical Jacobian.
    pub eps: f64,
}

impl Default for LeastSquaresOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            f_tol: 1e-10,
            x_tol: 1e-10,
            g_tol: 1e-10,
            eps: 1e-8,
        }
    }
}

/// Fits the parameters of a nonlinear model by Levenberg-Marquardt.
///
/// `residuals` maps a parameter vector to the residual vector
/// `model(params, xᵢ) − yᵢ`; the solver minimizes its squared norm starting
/// from `initial`. The Jacobian is approximated by forward differences.
///
/// # Errors
/// [`Error::NoData`] if the residual vector is empty,
/// [`Error::NoConvergence`] if the residuals are not finite at the starting
/// point, the damping factor saturates, or `max_iter` is exhausted without
/// meeting any tolerance, and [`Error::Algebra`] if a damped step cannot be
/// solved.
pub fn curve_fit<F>(residuals: F, initial: &[f64], options: &LeastSquaresOptions) -> Result<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut params = initial.to_vec();
    let mut residual = DVector::from_vec(residuals(&params));
    if residual.is_empty() {
        return Err(Error::NoData);
    }

    let mut cost = residual.norm_squared();
    if !cost.is_finite() {
        return Err(Error::NoConvergence);
    }

    let mut lambda = 1e-3;
    for _ in 0..options.max_iter {
        let jacobian = numerical_jacobian(&residuals, &params, &residual, options.eps);

        let gradient = jacobian.transpose() * &residual;
        if gradient.amax() < options.g_tol {
            return Ok(params);
        }

        let mut hessian = jacobian.transpose() * &jacobian;
        for i in 0..hessian.nrows() {
            let damped = hessian[(i, i)] * (1.0 + lambda);
            hessian[(i, i)] = if damped.abs() < f64::EPSILON {
                lambda
            } else {
                damped
            };
        }

        let max_size = hessian.nrows() as f64;
        let decomp = SVD::new_unordered(hessian, true, true);
        let epsilon = f64::EPSILON * max_size * decomp.singular_values.max();
        let step = decomp.solve(&(-gradient), epsilon).map_err(Error::Algebra)?;

        let candidate: Vec<f64> = params
            .iter()
            .zip(step.iter())
            .map(|(p, s)| p + s)
            .collect();
        let candidate_residual = DVector::from_vec(residuals(&candidate));
        let candidate_cost = candidate_residual.norm_squared();

        if candidate_cost.is_finite() && candidate_cost < cost {
            let reduction = (cost - candidate_cost) / cost.max(f64::EPSILON);
            let step_norm = step.norm();

            params = candidate;
            residual = candidate_residual;
            cost = candidate_cost;
            lambda = (lambda / 10.0).max(1e-12);

            if reduction < options.f_tol || step_norm < options.x_tol {
                return Ok(params);
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                return Err(Error::NoConvergence);
            }
        }
    }

    Err(Error::NoConvergence)
}

/// Forward-difference Jacobian of the residual vector at `params`.
fn numerical_jacobian<F>(
    residuals: &F,
    params: &[f64],
    at_params: &DVector<f64>,
    eps: f64,
) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n_residuals = at_params.len();
    let n_params = params.len();
    let mut jacobian = DMatrix::zeros(n_residuals, n_params);

    let mut perturbed = params.to_vec();
    for j in 0..n_params {
        let step = eps * params[j].abs().max(1.0);
        perturbed[j] = params[j] + step;
        let shifted = residuals(&perturbed);
        perturbed[j] = params[j];

        for i in 0..n_residuals {
            jacobian[(i, j)] = (shifted[i] - at_params[i]) / step;
        }
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_overdetermined_linear_system() {
        // y = 2x + 1 sampled at x = 0..4
        let design = DMatrix::from_row_slice(
            5,
            2,
            &[
                0.0, 1.0, //
                1.0, 1.0, //
                2.0, 1.0, //
                3.0, 1.0, //
                4.0, 1.0,
            ],
        );
        let rhs = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0, 9.0]);

        let beta = solve_normal(&design, &rhs).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-9);
        assert!((beta[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recovers_exponential_decay_parameters() {
        let xs: Vec<f64> = (1..=20).map(|i| i as f64 * 0.25).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.5 * (-0.8 * x).exp() + 0.3).collect();

        let residuals = |p: &[f64]| -> Vec<f64> {
            xs.iter()
                .zip(&ys)
                .map(|(x, y)| p[0] * (-p[1] * x).exp() + p[2] - y)
                .collect()
        };

        let params = curve_fit(residuals, &[1.0, 1e-6, 1.0], &LeastSquaresOptions::default())
            .unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            let predicted = params[0] * (-params[1] * x).exp() + params[2];
            assert!((predicted - y).abs() < 1e-3);
        }
    }

    #[test]
    fn non_finite_residuals_at_start_fail() {
        let residuals = |p: &[f64]| vec![p[0].ln(), 0.0];
        let result = curve_fit(residuals, &[-1.0], &LeastSquaresOptions::default());
        assert!(matches!(result, Err(Error::NoConvergence)));
    }

    #[test]
    fn empty_residuals_are_no_data() {
        let residuals = |_: &[f64]| Vec::new();
        let result = curve_fit(residuals, &[1.0], &LeastSquaresOptions::default());
        assert!(matches!(result, Err(Error::NoData)));
    }
}
