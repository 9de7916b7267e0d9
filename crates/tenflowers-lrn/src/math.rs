use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Floating-point element types the LRN kernels run on.
pub trait LrnElement: Float + FromPrimitive + Debug + Send + Sync + 'static {
    /// Convert a small integer count (window sizes, divisors)
    #[inline]
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::nan)
    }

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        Self::from_f64(v).unwrap_or_else(Self::nan)
    }
}

impl LrnElement for f32 {}
impl LrnElement for f64 {}

/// Computes `omega^(-beta)`.
///
/// `beta == 0.75` is the dominant configuration and is evaluated as
/// `y = 1/sqrt(omega); y * sqrt(y)` instead of a general `powf`.
#[inline]
pub fn fast_negative_pow<T: LrnElement>(omega: T, beta: T) -> T {
    if beta == T::from_f64_lossy(0.75) {
        let y = omega.sqrt().recip();
        y * y.sqrt()
    } else {
        omega.powf(beta).recip()
    }
}
