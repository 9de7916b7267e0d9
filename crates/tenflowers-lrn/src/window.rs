//! Local window energy and the normalization factor built from it.

use crate::layout::Addressing;
use crate::math::LrnElement;
use crate::params::{LrnMode, LrnParams};
use crate::shape::{Coord, Dims4};
use std::ops::Range;

/// Per-invocation constants shared by every element kernel.
#[derive(Debug, Clone, Copy)]
pub struct KernelParams<T> {
    pub mode: LrnMode,
    pub half: usize,
    pub alpha: T,
    pub beta: T,
    pub k: T,
    /// Nominal window term count as `T`
    pub divisor: T,
}

impl<T: LrnElement> KernelParams<T> {
    pub fn new(params: &LrnParams<T>, mode: LrnMode) -> Self {
        Self {
            mode,
            half: params.half_size(),
            alpha: params.alpha,
            beta: params.beta,
            k: params.k,
            divisor: T::from_count(mode.divisor(params.local_size)),
        }
    }

    /// `omega = k + alpha * energy / divisor`
    #[inline(always)]
    pub fn omega(&self, energy: T) -> T {
        self.k + self.alpha * energy / self.divisor
    }
}

/// `[max(center - half, 0), min(center + half + 1, extent))`
#[inline(always)]
pub fn clamped_window(center: usize, half: usize, extent: usize) -> Range<usize> {
    center.saturating_sub(half)..(center + half + 1).min(extent)
}

/// Sum of squares over the window around `at`.
///
/// Channel-wise windows span channels at the pixel `(at.h, at.w)`; spatial windows
/// span a square patch within channel `at.c`. Windows are clipped at the tensor
/// border, so fewer terms are summed there.
#[inline]
pub fn window_energy<T: LrnElement, A: Addressing>(
    src: &[T],
    addr: &A,
    dims: Dims4,
    at: Coord,
    mode: LrnMode,
    half: usize,
) -> T {
    let mut sum = T::zero();
    match mode {
        LrnMode::ChannelWise => {
            for c in clamped_window(at.c, half, dims.c) {
                let s = src[addr.offset(at.with_channel(c))];
                sum = sum + s * s;
            }
        }
        LrnMode::Spatial => {
            for h in clamped_window(at.h, half, dims.h) {
                for w in clamped_window(at.w, half, dims.w) {
                    let s = src[addr.offset(Coord::new(at.mb, at.c, h, w))];
                    sum = sum + s * s;
                }
            }
        }
    }
    sum
}
