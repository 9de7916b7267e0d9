//! LRN forward pass.

use crate::layout::{Addressing, Layout, LayoutVisitor};
use crate::math::{fast_negative_pow, LrnElement};
use crate::parallel::{drive, ElementOut, Traversal};
use crate::params::{DriverConfig, LrnMode, LrnParams};
use crate::shape::{Coord, Dims4};
use crate::window::{window_energy, KernelParams};

/// Normalize the element at `at`:
/// `omega = k + alpha * energy / divisor`, `dst = src * omega^(-beta)`.
#[inline]
pub fn forward_element<T: LrnElement, A: Addressing>(
    src: &[T],
    addr: &A,
    dims: Dims4,
    at: Coord,
    kp: &KernelParams<T>,
) -> ElementOut<T> {
    let energy = window_energy(src, addr, dims, at, kp.mode, kp.half);
    let omega = kp.omega(energy);
    ElementOut {
        value: src[addr.offset(at)] * fast_negative_pow(omega, kp.beta),
        omega,
    }
}

/// LRN forward over a tensor of `dims` stored in `layout`.
///
/// `src`, `dst` and `workspace` all use `layout` and must hold at least
/// `layout.physical_len(dims)` elements. When `workspace` is given, the
/// normalization factor of every element is stored there.
///
/// No validation happens here: `k > 0` and an odd `local_size` are caller
/// contracts, and non-finite inputs propagate per IEEE arithmetic.
pub fn lrn_forward<T: LrnElement>(
    src: &[T],
    dst: &mut [T],
    workspace: Option<&mut [T]>,
    dims: Dims4,
    params: &LrnParams<T>,
    mode: LrnMode,
    layout: &Layout,
) {
    lrn_forward_with_config(
        src,
        dst,
        workspace,
        dims,
        params,
        mode,
        layout,
        &DriverConfig::default(),
    )
}

/// [`lrn_forward`] with explicit control over the tiling driver
#[allow(clippy::too_many_arguments)]
pub fn lrn_forward_with_config<T: LrnElement>(
    src: &[T],
    dst: &mut [T],
    workspace: Option<&mut [T]>,
    dims: Dims4,
    params: &LrnParams<T>,
    mode: LrnMode,
    layout: &Layout,
    config: &DriverConfig,
) {
    params.debug_check();
    let _span = tracing::debug_span!(
        "lrn_forward",
        dims = %dims,
        layout = %layout,
        ?mode,
        workspace = workspace.is_some()
    )
    .entered();

    layout.dispatch(
        dims,
        ForwardPass {
            src,
            dst,
            workspace,
            dims,
            kp: KernelParams::new(params, mode),
            config,
        },
    );
}

struct ForwardPass<'a, T> {
    src: &'a [T],
    dst: &'a mut [T],
    workspace: Option<&'a mut [T]>,
    dims: Dims4,
    kp: KernelParams<T>,
    config: &'a DriverConfig,
}

impl<T: LrnElement> LayoutVisitor for ForwardPass<'_, T> {
    type Output = ();

    fn visit<A: Addressing>(self, addr: A, traversal: Traversal) {
        let Self {
            src,
            dst,
            workspace,
            dims,
            kp,
            config,
        } = self;
        drive(dims, &addr, traversal, config, dst, workspace, |at| {
            forward_element(src, &addr, dims, at, &kp)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockWidth;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_channel_wise_example() {
        let dims = Dims4::new(1, 4, 1, 1);
        let src = [1.0f32, 2.0, 3.0, 4.0];
        let mut dst = [0.0f32; 4];
        let mut ws = [0.0f32; 4];
        let params = LrnParams::new(3, 1.0, 0.75, 1.0);
        lrn_forward(
            &src,
            &mut dst,
            Some(&mut ws),
            dims,
            &params,
            LrnMode::ChannelWise,
            &Layout::Planar,
        );

        let omegas = [
            1.0 + 5.0 / 3.0,
            1.0 + 14.0 / 3.0,
            1.0 + 29.0 / 3.0,
            1.0 + 25.0 / 3.0,
        ];
        for i in 0..4 {
            assert_relative_eq!(ws[i], omegas[i], max_relative = 1e-6);
            assert_relative_eq!(
                dst[i],
                src[i] * omegas[i].powf(-0.75),
                max_relative = 1e-5
            );
        }
    }

    #[test]
    fn test_forward_single_element_borders() {
        let dims = Dims4::new(1, 1, 1, 1);
        let src = [3.0f64];
        let params = LrnParams::new(5, 0.5, 0.75, 2.0);
        let mut dst = [0.0];
        let mut ws = [0.0];

        lrn_forward(&src, &mut dst, Some(&mut ws), dims, &params, LrnMode::ChannelWise, &Layout::Planar);
        assert_relative_eq!(ws[0], 2.0 + 0.5 * 9.0 / 5.0);

        lrn_forward(&src, &mut dst, Some(&mut ws), dims, &params, LrnMode::Spatial, &Layout::Planar);
        assert_relative_eq!(ws[0], 2.0 + 0.5 * 9.0 / 25.0);
        assert_relative_eq!(dst[0], 3.0 * ws[0].powf(-0.75), max_relative = 1e-12);
    }

    #[test]
    fn test_forward_without_workspace_blocked() {
        let dims = Dims4::new(1, 8, 1, 1);
        let src: Vec<f32> = (1..=8).map(|v| v as f32).collect();
        let mut planar = vec![0.0f32; 8];
        let mut blocked = vec![0.0f32; 8];
        let params = LrnParams::default();
        lrn_forward(&src, &mut planar, None, dims, &params, LrnMode::ChannelWise, &Layout::Planar);
        // with one pixel and C == block width, nChw8c stores channels in order
        lrn_forward(
            &src,
            &mut blocked,
            None,
            dims,
            &params,
            LrnMode::ChannelWise,
            &Layout::ChannelBlocked(BlockWidth::W8),
        );
        assert_eq!(planar, blocked);
    }
}
