use crate::shape::{Coord, Dims4};
use crate::{LrnError, Result};

/// Arbitrary-stride addressing for a logical N×C×H×W tensor.
///
/// This is the addressing behind [`Layout::Generic`](crate::Layout::Generic): a base
/// offset plus one signed element stride per logical axis, in N, C, H, W order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StridedLayout {
    strides: [isize; 4],
    offset: usize,
}

impl StridedLayout {
    /// C-contiguous (planar) strides for `dims`
    pub fn contiguous(dims: Dims4) -> Self {
        let w = 1isize;
        let h = dims.w as isize;
        let c = h * dims.h as isize;
        let n = c * dims.c as isize;
        Self {
            strides: [n, c, h, w],
            offset: 0,
        }
    }

    /// Create layout with custom strides
    pub fn with_strides(strides: &[isize], offset: usize) -> Result<Self> {
        let strides: [isize; 4] = strides.try_into().map_err(|_| {
            LrnError::invalid_shape(
                "strided_layout",
                &format!("expected 4 strides (N, C, H, W), got {}", strides.len()),
                None,
            )
        })?;
        Ok(Self { strides, offset })
    }

    /// Strides obtained by storing the axes in `order` (outermost first).
    ///
    /// `order` names logical axes by index (0 = N, 1 = C, 2 = H, 3 = W); e.g.
    /// `[0, 2, 3, 1]` yields channel-last strides.
    pub fn from_axis_order(dims: Dims4, order: [usize; 4]) -> Result<Self> {
        let mut seen = [false; 4];
        for &axis in &order {
            if axis >= 4 || seen[axis] {
                return Err(LrnError::invalid_argument(
                    "strided_layout",
                    &format!("axis order {order:?} is not a permutation of [0, 1, 2, 3]"),
                ));
            }
            seen[axis] = true;
        }

        let extents = [dims.n, dims.c, dims.h, dims.w];
        let mut strides = [0isize; 4];
        let mut running = 1isize;
        for &axis in order.iter().rev() {
            strides[axis] = running;
            running *= extents[axis] as isize;
        }
        Ok(Self { strides, offset: 0 })
    }

    pub fn strides(&self) -> [isize; 4] {
        self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Physical offset of `coord`; `coord` must lie inside the tensor.
    #[inline]
    pub fn linear_index(&self, coord: Coord) -> usize {
        let [sn, sc, sh, sw] = self.strides;
        (self.offset as isize
            + coord.mb as isize * sn
            + coord.c as isize * sc
            + coord.h as isize * sh
            + coord.w as isize * sw) as usize
    }

    /// Smallest buffer length that holds every element of `dims`
    pub fn required_len(&self, dims: Dims4) -> usize {
        if dims.numel() == 0 {
            return 0;
        }
        let extents = [dims.n, dims.c, dims.h, dims.w];
        let max_reach: isize = self
            .strides
            .iter()
            .zip(extents.iter())
            .map(|(&s, &e)| if s > 0 { s * (e as isize - 1) } else { 0 })
            .sum();
        (self.offset as isize + max_reach + 1) as usize
    }

    /// Check if the layout is planar C-contiguous for `dims`
    pub fn is_contiguous(&self, dims: Dims4) -> bool {
        *self == Self::contiguous(dims)
    }
}
