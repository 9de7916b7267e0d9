//! Reference CPU kernels for Local Response Normalization (LRN).
//!
//! Forward: `dst = src * (k + alpha * energy / n)^(-beta)` where `energy` is the
//! sum of squares over a channel window (`n = local_size`) or a square spatial
//! window (`n = local_size^2`), clipped at the tensor borders.
//! Backward: the analytic gradient of the channel-wise forward pass.
//!
//! Both passes run over any supported [`Layout`] of a logical N×C×H×W tensor:
//! planar (`nchw`), channel-last (`nhwc`), channel-blocked (`nChw{8,16,..}c`) or
//! caller-supplied strides.
//!
//! ```rust
//! use tenflowers_lrn::{lrn_forward, Dims4, Layout, LrnMode, LrnParams};
//!
//! let dims = Dims4::new(1, 4, 1, 1);
//! let src = [1.0f32, 2.0, 3.0, 4.0];
//! let mut dst = [0.0f32; 4];
//! let params = LrnParams::new(3, 1.0, 0.75, 1.0);
//! lrn_forward(&src, &mut dst, None, dims, &params, LrnMode::ChannelWise, &Layout::Planar);
//! assert!((dst[0] - 1.0 * (1.0f32 + 5.0 / 3.0).powf(-0.75)).abs() < 1e-6);
//! ```

pub mod backward;
pub mod error;
pub mod forward;
pub mod gradcheck;
pub mod layer;
pub mod layout;
pub mod math;
pub mod parallel;
pub mod params;
pub mod shape;
pub mod strided;
pub mod tensor;
pub mod window;

pub use backward::{lrn_backward, lrn_backward_with_config};
pub use error::{LrnError, Result};
pub use forward::{lrn_forward, lrn_forward_with_config};
pub use layer::LocalResponseNorm;
pub use layout::{Addressing, BlockWidth, Layout};
pub use math::{fast_negative_pow, LrnElement};
pub use params::{DriverConfig, LrnMode, LrnParams};
pub use shape::{Coord, Dims4};
pub use strided::StridedLayout;
pub use tensor::Tensor4D;
