//! Physical memory layouts of a logical N×C×H×W tensor.
//!
//! A [`Layout`] is resolved once per kernel invocation into a concrete
//! [`Addressing`] strategy through [`Layout::dispatch`], so the hot loops are
//! monomorphized per layout and never branch on the layout per element.

use crate::parallel::Traversal;
use crate::shape::{Coord, Dims4};
use crate::strided::StridedLayout;
use crate::{LrnError, Result};

/// Narrowest block that still fills a 128-bit vector register of f32 lanes
pub const MIN_BLOCK_WIDTH: usize = 4;
/// Widest supported block (a 512-bit register of f32 lanes, times four)
pub const MAX_BLOCK_WIDTH: usize = 64;

/// Number of channels grouped together in a channel-blocked layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockWidth(usize);

impl BlockWidth {
    /// 256-bit registers of f32 (`nChw8c`)
    pub const W8: BlockWidth = BlockWidth(8);
    /// 512-bit registers of f32 (`nChw16c`)
    pub const W16: BlockWidth = BlockWidth(16);

    /// Validate a block width against the supported vector widths.
    pub fn new(width: usize) -> Result<Self> {
        if !width.is_power_of_two() || !(MIN_BLOCK_WIDTH..=MAX_BLOCK_WIDTH).contains(&width) {
            return Err(LrnError::invalid_argument(
                "channel_blocked_layout",
                &format!(
                    "block width {width} must be a power of two in [{MIN_BLOCK_WIDTH}, {MAX_BLOCK_WIDTH}]"
                ),
            ));
        }
        Ok(Self(width))
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Channel count rounded up to a whole number of blocks
    pub const fn padded_channels(self, channels: usize) -> usize {
        channels.div_ceil(self.0) * self.0
    }
}

/// Supported physical layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// `nChw{b}c`: channels grouped in blocks of `b`, the block innermost
    ChannelBlocked(BlockWidth),
    /// `nchw`
    Planar,
    /// `nhwc`
    ChannelLast,
    /// Arbitrary strides supplied by the caller
    Generic(StridedLayout),
}

impl Layout {
    /// Channel-blocked layout with a validated block width
    pub fn channel_blocked(width: usize) -> Result<Self> {
        Ok(Layout::ChannelBlocked(BlockWidth::new(width)?))
    }

    /// Conventional short name (`nChw16c`, `nchw`, ...)
    pub fn name(&self) -> String {
        match self {
            Layout::ChannelBlocked(bw) => format!("nChw{}c", bw.get()),
            Layout::Planar => "nchw".to_string(),
            Layout::ChannelLast => "nhwc".to_string(),
            Layout::Generic(_) => "strided".to_string(),
        }
    }

    /// Buffer length needed to store a tensor of `dims` in this layout
    pub fn physical_len(&self, dims: Dims4) -> usize {
        match self {
            Layout::ChannelBlocked(bw) => dims.n * bw.padded_channels(dims.c) * dims.spatial(),
            Layout::Planar | Layout::ChannelLast => dims.numel(),
            Layout::Generic(strided) => strided.required_len(dims),
        }
    }

    /// Physical offset of one coordinate. Prefer [`Layout::dispatch`] in loops.
    pub fn offset(&self, dims: Dims4, coord: Coord) -> usize {
        struct Single(Coord);
        impl LayoutVisitor for Single {
            type Output = usize;
            fn visit<A: Addressing>(self, addr: A, _traversal: Traversal) -> usize {
                addr.offset(self.0)
            }
        }
        self.dispatch(dims, Single(coord))
    }

    /// Resolve the layout into its addressing strategy and loop order, and hand
    /// both to `visitor`.
    pub fn dispatch<V: LayoutVisitor>(&self, dims: Dims4, visitor: V) -> V::Output {
        match *self {
            Layout::ChannelBlocked(bw) => visitor.visit(
                BlockedAddressing::new(dims, bw),
                Traversal::Blocks { block: bw.get() },
            ),
            Layout::Planar => visitor.visit(PlanarAddressing::new(dims), Traversal::Rows),
            Layout::ChannelLast => {
                visitor.visit(ChannelLastAddressing::new(dims), Traversal::Pixels)
            }
            Layout::Generic(strided) => visitor.visit(StridedAddressing(strided), Traversal::Gather),
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Receives the concrete addressing strategy chosen for a [`Layout`].
pub trait LayoutVisitor {
    type Output;

    fn visit<A: Addressing>(self, addr: A, traversal: Traversal) -> Self::Output;
}

/// Maps a logical coordinate to a physical element offset.
///
/// Implementations are injective on the valid domain, and forward and backward
/// share them, so both passes address the same memory for a coordinate.
pub trait Addressing: Copy + Send + Sync {
    fn offset(&self, coord: Coord) -> usize;
}

#[derive(Debug, Clone, Copy)]
pub struct BlockedAddressing {
    block: usize,
    image_stride: usize,
    block_stride: usize,
    row_stride: usize,
}

impl BlockedAddressing {
    pub fn new(dims: Dims4, bw: BlockWidth) -> Self {
        let block = bw.get();
        Self {
            block,
            image_stride: bw.padded_channels(dims.c) * dims.spatial(),
            block_stride: dims.spatial() * block,
            row_stride: dims.w * block,
        }
    }
}

impl Addressing for BlockedAddressing {
    #[inline(always)]
    fn offset(&self, p: Coord) -> usize {
        p.mb * self.image_stride
            + p.c / self.block * self.block_stride
            + p.h * self.row_stride
            + p.w * self.block
            + p.c % self.block
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanarAddressing {
    image_stride: usize,
    plane: usize,
    width: usize,
}

impl PlanarAddressing {
    pub fn new(dims: Dims4) -> Self {
        Self {
            image_stride: dims.image_len(),
            plane: dims.spatial(),
            width: dims.w,
        }
    }
}

impl Addressing for PlanarAddressing {
    #[inline(always)]
    fn offset(&self, p: Coord) -> usize {
        p.mb * self.image_stride + p.c * self.plane + p.h * self.width + p.w
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelLastAddressing {
    image_stride: usize,
    row_stride: usize,
    channels: usize,
}

impl ChannelLastAddressing {
    pub fn new(dims: Dims4) -> Self {
        Self {
            image_stride: dims.image_len(),
            row_stride: dims.w * dims.c,
            channels: dims.c,
        }
    }
}

impl Addressing for ChannelLastAddressing {
    #[inline(always)]
    fn offset(&self, p: Coord) -> usize {
        p.mb * self.image_stride + p.h * self.row_stride + p.w * self.channels + p.c
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StridedAddressing(pub StridedLayout);

impl Addressing for StridedAddressing {
    #[inline(always)]
    fn offset(&self, p: Coord) -> usize {
        self.0.linear_index(p)
    }
}
