use crate::layout::Layout;
use crate::math::LrnElement;
use crate::shape::{Coord, Dims4};
use crate::{LrnError, Result};

/// A logical N×C×H×W tensor physically stored in a given [`Layout`].
///
/// The buffer is owned by the caller; kernels borrow it and never resize it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor4D<T> {
    data: Vec<T>,
    dims: Dims4,
    layout: Layout,
}

impl<T: LrnElement> Tensor4D<T> {
    /// Zero-filled tensor (channel padding included)
    pub fn zeros(dims: Dims4, layout: Layout) -> Self {
        Self {
            data: vec![T::zero(); layout.physical_len(dims)],
            dims,
            layout,
        }
    }

    /// Pack `values`, given in logical N, C, H, W order, into `layout`.
    pub fn from_logical(values: &[T], dims: Dims4, layout: Layout) -> Result<Self> {
        if values.len() != dims.numel() {
            return Err(LrnError::invalid_shape(
                "tensor4d_from_logical",
                &format!(
                    "{} values cannot fill a tensor of dims {dims} ({} elements)",
                    values.len(),
                    dims.numel()
                ),
                Some(&dims.to_vec()),
            ));
        }
        let mut tensor = Self::zeros(dims, layout);
        for (i, &v) in values.iter().enumerate() {
            tensor.set(dims.coord_of(i), v);
        }
        Ok(tensor)
    }

    /// Wrap an already packed physical buffer
    pub fn from_physical(data: Vec<T>, dims: Dims4, layout: Layout) -> Result<Self> {
        let required = layout.physical_len(dims);
        if data.len() < required {
            return Err(LrnError::invalid_shape(
                "tensor4d_from_physical",
                &format!(
                    "{layout} storage for dims {dims} needs {required} elements, got {}",
                    data.len()
                ),
                Some(&dims.to_vec()),
            ));
        }
        Ok(Self { data, dims, layout })
    }

    /// Values in logical N, C, H, W order
    pub fn to_logical(&self) -> Vec<T> {
        (0..self.dims.numel())
            .map(|i| self.get(self.dims.coord_of(i)))
            .collect()
    }

    /// The same logical content re-packed into `layout`
    pub fn to_layout(&self, layout: Layout) -> Self {
        if layout == self.layout {
            return self.clone();
        }
        let mut out = Self::zeros(self.dims, layout);
        for i in 0..self.dims.numel() {
            let coord = self.dims.coord_of(i);
            out.set(coord, self.get(coord));
        }
        out
    }

    #[inline]
    pub fn get(&self, coord: Coord) -> T {
        self.data[self.layout.offset(self.dims, coord)]
    }

    #[inline]
    pub fn set(&mut self, coord: Coord, value: T) {
        let off = self.layout.offset(self.dims, coord);
        self.data[off] = value;
    }

    pub fn dims(&self) -> Dims4 {
        self.dims
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn physical_len(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}
