//! Numerical gradient validation for the LRN backward pass
//!
//! Compares the analytic gradient from [`LocalResponseNorm::backward`] against
//! central finite differences of the forward pass:
//!
//! ```text
//! dL/dx_i ≈ [L(x + ε e_i) - L(x - ε e_i)] / (2ε),   L(x) = Σ forward(x) · dy
//! ```
//!
//! # Example
//!
//! ```rust
//! use tenflowers_lrn::gradcheck::{check_lrn_gradient, GradientCheckConfig};
//! use tenflowers_lrn::{Dims4, Layout, LocalResponseNorm, Tensor4D};
//!
//! let dims = Dims4::new(1, 3, 1, 1);
//! let x = Tensor4D::from_logical(&[0.5f64, -1.0, 2.0], dims, Layout::Planar).unwrap();
//! let dy = Tensor4D::from_logical(&[1.0f64, 1.0, 1.0], dims, Layout::Planar).unwrap();
//! let lrn = LocalResponseNorm::new(3, 1.0, 0.75, 1.0);
//!
//! let report = check_lrn_gradient(&lrn, &x, &dy, &GradientCheckConfig::default()).unwrap();
//! assert!(report.passed);
//! ```

use crate::layer::LocalResponseNorm;
use crate::math::LrnElement;
use crate::tensor::Tensor4D;
use crate::Result;
use num_traits::ToPrimitive;

/// Configuration for numerical gradient checking
#[derive(Debug, Clone)]
pub struct GradientCheckConfig {
    /// Epsilon for finite difference computation
    pub epsilon: f64,
    /// Relative tolerance for gradient comparison
    pub rtol: f64,
    /// Absolute tolerance for gradient comparison
    pub atol: f64,
}

impl Default for GradientCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-3,
            rtol: 1e-3,
            atol: 1e-6,
        }
    }
}

impl GradientCheckConfig {
    /// Tighter tolerances, for f64 inputs
    pub fn strict() -> Self {
        Self {
            epsilon: 1e-5,
            rtol: 1e-5,
            atol: 1e-9,
        }
    }

    /// Looser tolerances, for f32 inputs
    pub fn relaxed() -> Self {
        Self {
            epsilon: 1e-2,
            rtol: 1e-2,
            atol: 1e-4,
        }
    }
}

/// Outcome of a gradient check; gradients are in logical N, C, H, W order.
#[derive(Debug, Clone)]
pub struct GradientCheckReport {
    pub analytic: Vec<f64>,
    pub numeric: Vec<f64>,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    /// Logical index of the largest absolute error
    pub worst_index: usize,
    pub passed: bool,
}

/// Check `lrn.backward` against finite differences of `lrn.forward` at `input`,
/// using `grad_output` as the upstream gradient.
pub fn check_lrn_gradient<T: LrnElement>(
    lrn: &LocalResponseNorm<T>,
    input: &Tensor4D<T>,
    grad_output: &Tensor4D<T>,
    config: &GradientCheckConfig,
) -> Result<GradientCheckReport> {
    let analytic: Vec<f64> = lrn
        .backward(input, grad_output)?
        .to_logical()
        .into_iter()
        .map(as_f64)
        .collect();

    let dims = input.dims();
    let upstream = grad_output.to_logical();
    let loss = |x: &Tensor4D<T>| -> Result<f64> {
        let y = lrn.forward(x)?.to_logical();
        Ok(y.iter()
            .zip(upstream.iter())
            .map(|(&a, &b)| as_f64(a) * as_f64(b))
            .sum())
    };

    let eps = T::from_f64_lossy(config.epsilon);
    let mut numeric = Vec::with_capacity(dims.numel());
    let mut probe = input.clone();
    for i in 0..dims.numel() {
        let coord = dims.coord_of(i);
        let x = input.get(coord);

        probe.set(coord, x + eps);
        let plus = loss(&probe)?;
        probe.set(coord, x - eps);
        let minus = loss(&probe)?;
        probe.set(coord, x);

        // the perturbation actually applied after rounding to T
        let step = as_f64(x + eps) - as_f64(x - eps);
        numeric.push((plus - minus) / step);
    }

    let mut report = GradientCheckReport {
        analytic,
        numeric,
        max_abs_error: 0.0,
        max_rel_error: 0.0,
        worst_index: 0,
        passed: true,
    };
    for (i, (&a, &n)) in report.analytic.iter().zip(report.numeric.iter()).enumerate() {
        let abs = (a - n).abs();
        let rel = abs / n.abs().max(f64::MIN_POSITIVE);
        if abs > report.max_abs_error {
            report.max_abs_error = abs;
            report.worst_index = i;
        }
        report.max_rel_error = report.max_rel_error.max(rel);
        if abs > config.atol + config.rtol * n.abs() {
            report.passed = false;
        }
    }

    tracing::debug!(
        max_abs_error = report.max_abs_error,
        max_rel_error = report.max_rel_error,
        passed = report.passed,
        "lrn gradient check"
    );
    Ok(report)
}

fn as_f64<T: LrnElement>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
