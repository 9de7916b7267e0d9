//! LRN backward pass (channel-wise windows).
//!
//! With `omega_c = k + alpha/n * sum_{j in win(c)} x_j^2` and
//! `y_c = x_c * omega_c^(-beta)`, the gradient with respect to `x_o` is
//!
//! ```text
//! dx_o = omega_o^(-beta) * dy_o
//!      - x_o * (2 * alpha * beta / n) * sum_{c in win(o)} y_c * dy_c / omega_c
//! ```
//!
//! The sum runs over every channel whose window contains `o`, which for a
//! symmetric window is exactly the window centered at `o`. The workspace from
//! the forward pass is not consumed; every `omega_c` is recomputed from `src`.

use crate::layout::{Addressing, Layout, LayoutVisitor};
use crate::math::{fast_negative_pow, LrnElement};
use crate::parallel::{drive, ElementOut, Traversal};
use crate::params::{DriverConfig, LrnMode, LrnParams};
use crate::shape::{Coord, Dims4};
use crate::window::{clamped_window, window_energy, KernelParams};
use crate::{LrnError, Result};

/// Gradient of the forward output with respect to the source element at `at`.
///
/// `ElementOut::omega` carries the normalization factor of `at` itself.
#[inline]
pub fn backward_element<T: LrnElement, A: Addressing>(
    src: &[T],
    diff_dst: &[T],
    addr: &A,
    dims: Dims4,
    at: Coord,
    kp: &KernelParams<T>,
) -> ElementOut<T> {
    let mut b = T::zero();
    let mut omega_mid = kp.k;
    for c in clamped_window(at.c, kp.half, dims.c) {
        let p = at.with_channel(c);
        let energy = window_energy(src, addr, dims, p, LrnMode::ChannelWise, kp.half);
        let omega = kp.omega(energy);
        if c == at.c {
            omega_mid = omega;
        }
        let off = addr.offset(p);
        let y = src[off] * fast_negative_pow(omega, kp.beta);
        b = b + omega.recip() * y * diff_dst[off];
    }

    let off = addr.offset(at);
    let two = T::one() + T::one();
    let a = fast_negative_pow(omega_mid, kp.beta) * diff_dst[off];
    b = b * src[off] * (two * kp.alpha * kp.beta / kp.divisor);
    ElementOut {
        value: a - b,
        omega: omega_mid,
    }
}

/// LRN backward: fill `diff_src` with the gradient of the loss with respect to
/// `src`, given the gradient `diff_dst` with respect to the forward output.
///
/// All three buffers use `layout`. Only [`LrnMode::ChannelWise`] has a
/// backward pass; [`LrnMode::Spatial`] returns
/// [`LrnError::UnsupportedOperation`] without touching `diff_src`.
pub fn lrn_backward<T: LrnElement>(
    src: &[T],
    diff_dst: &[T],
    diff_src: &mut [T],
    dims: Dims4,
    params: &LrnParams<T>,
    mode: LrnMode,
    layout: &Layout,
) -> Result<()> {
    lrn_backward_with_config(
        src,
        diff_dst,
        diff_src,
        dims,
        params,
        mode,
        layout,
        &DriverConfig::default(),
    )
}

/// [`lrn_backward`] with explicit control over the tiling driver
#[allow(clippy::too_many_arguments)]
pub fn lrn_backward_with_config<T: LrnElement>(
    src: &[T],
    diff_dst: &[T],
    diff_src: &mut [T],
    dims: Dims4,
    params: &LrnParams<T>,
    mode: LrnMode,
    layout: &Layout,
    config: &DriverConfig,
) -> Result<()> {
    if mode == LrnMode::Spatial {
        tracing::warn!(dims = %dims, "spatial LRN backward requested");
        return Err(LrnError::unsupported_operation(
            "lrn_backward",
            "backward is only defined for channel-wise windows",
            &["LrnMode::ChannelWise"],
        ));
    }
    params.debug_check();
    let _span = tracing::debug_span!("lrn_backward", dims = %dims, layout = %layout).entered();

    layout.dispatch(
        dims,
        BackwardPass {
            src,
            diff_dst,
            diff_src,
            dims,
            kp: KernelParams::new(params, mode),
            config,
        },
    );
    Ok(())
}

struct BackwardPass<'a, T> {
    src: &'a [T],
    diff_dst: &'a [T],
    diff_src: &'a mut [T],
    dims: Dims4,
    kp: KernelParams<T>,
    config: &'a DriverConfig,
}

impl<T: LrnElement> LayoutVisitor for BackwardPass<'_, T> {
    type Output = ();

    fn visit<A: Addressing>(self, addr: A, traversal: Traversal) {
        let Self {
            src,
            diff_dst,
            diff_src,
            dims,
            kp,
            config,
        } = self;
        drive(dims, &addr, traversal, config, diff_src, None, |at| {
            backward_element(src, diff_dst, &addr, dims, at, &kp)
        });
    }
}
