#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Logical extent of an N×C×H×W tensor, independent of its physical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Dims4 {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl Dims4 {
    pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    /// Number of logical elements
    pub const fn numel(&self) -> usize {
        self.n * self.c * self.h * self.w
    }

    pub const fn spatial(&self) -> usize {
        self.h * self.w
    }

    /// Elements of one image (C·H·W)
    pub const fn image_len(&self) -> usize {
        self.c * self.h * self.w
    }

    pub fn to_vec(&self) -> Vec<usize> {
        vec![self.n, self.c, self.h, self.w]
    }

    /// Whether `coord` lies inside `[0,N)×[0,C)×[0,H)×[0,W)`
    pub fn contains(&self, coord: Coord) -> bool {
        coord.mb < self.n && coord.c < self.c && coord.h < self.h && coord.w < self.w
    }

    /// Logical coordinate of the `index`-th element in N,C,H,W row-major order
    #[inline]
    pub fn coord_of(&self, index: usize) -> Coord {
        let w = index % self.w;
        let rest = index / self.w;
        let h = rest % self.h;
        let rest = rest / self.h;
        Coord::new(rest / self.c, rest % self.c, h, w)
    }

    /// Inverse of [`Dims4::coord_of`]
    #[inline]
    pub fn logical_index(&self, coord: Coord) -> usize {
        ((coord.mb * self.c + coord.c) * self.h + coord.h) * self.w + coord.w
    }
}

impl From<[usize; 4]> for Dims4 {
    fn from(dims: [usize; 4]) -> Self {
        Self::new(dims[0], dims[1], dims[2], dims[3])
    }
}

impl std::fmt::Display for Dims4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

/// Logical position `(mb, c, h, w)` of one tensor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub mb: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl Coord {
    #[inline]
    pub const fn new(mb: usize, c: usize, h: usize, w: usize) -> Self {
        Self { mb, c, h, w }
    }

    /// Same position with the channel replaced
    #[inline]
    pub const fn with_channel(self, c: usize) -> Self {
        Self { c, ..self }
    }
}
