//! Tiling driver: walks the N×C×H×W iteration space in a layout-dependent order
//! and spreads it over worker threads in static, contiguous partitions.
//!
//! The iteration space is cut into *runs*, the innermost loop of a layout:
//!
//! | traversal | layout             | one run                              |
//! |-----------|--------------------|--------------------------------------|
//! | `Rows`    | `nchw`             | the W columns of one (mb, c, h) row  |
//! | `Pixels`  | `nhwc`             | the C channels of one (mb, h, w)     |
//! | `Blocks`  | `nChw{b}c`         | the b sub-channels of one block      |
//! | `Gather`  | strided            | a logical row, staged then scattered |
//!
//! For the dense layouts run `r` occupies exactly `dst[r*len..(r+1)*len]`, so
//! each partition owns a disjoint sub-slice of the output and no write can race.
//! Partitions always hold a whole number of runs.

use crate::layout::Addressing;
use crate::math::LrnElement;
use crate::params::DriverConfig;
use crate::shape::{Coord, Dims4};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Loop order used for a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Rows,
    Pixels,
    Blocks { block: usize },
    Gather,
}

impl Traversal {
    /// Elements per run
    pub fn run_len(&self, dims: Dims4) -> usize {
        match *self {
            Traversal::Rows | Traversal::Gather => dims.w,
            Traversal::Pixels => dims.c,
            Traversal::Blocks { block } => block,
        }
    }

    pub fn run_count(&self, dims: Dims4) -> usize {
        match *self {
            Traversal::Rows | Traversal::Gather => dims.n * dims.c * dims.h,
            Traversal::Pixels => dims.n * dims.spatial(),
            Traversal::Blocks { block } => dims.n * dims.c.div_ceil(block) * dims.spatial(),
        }
    }

    /// Coordinate of the first lane of run `run`
    #[inline]
    pub fn run_origin(&self, dims: Dims4, run: usize) -> Coord {
        match *self {
            Traversal::Rows | Traversal::Gather => {
                let h = run % dims.h;
                let rest = run / dims.h;
                Coord::new(rest / dims.c, rest % dims.c, h, 0)
            }
            Traversal::Pixels => {
                let w = run % dims.w;
                let rest = run / dims.w;
                Coord::new(rest / dims.h, 0, rest % dims.h, w)
            }
            Traversal::Blocks { block } => {
                let blocks = dims.c.div_ceil(block);
                let w = run % dims.w;
                let rest = run / dims.w;
                let h = rest % dims.h;
                let rest = rest / dims.h;
                Coord::new(rest / blocks, (rest % blocks) * block, h, w)
            }
        }
    }

    /// Coordinate of lane `lane` inside the run starting at `origin`
    #[inline(always)]
    pub fn lane(&self, origin: Coord, lane: usize) -> Coord {
        match *self {
            Traversal::Rows | Traversal::Gather => Coord { w: lane, ..origin },
            Traversal::Pixels => Coord { c: lane, ..origin },
            Traversal::Blocks { .. } => Coord {
                c: origin.c + lane,
                ..origin
            },
        }
    }
}

/// What one element kernel produces: the output value and the normalization
/// factor it used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementOut<T> {
    pub value: T,
    pub omega: T,
}

/// Static split of the runs of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    pub run_len: usize,
    pub run_count: usize,
    pub runs_per_partition: usize,
    pub parallel: bool,
}

impl PartitionPlan {
    pub fn new(dims: Dims4, traversal: Traversal, config: &DriverConfig) -> Self {
        let run_len = traversal.run_len(dims);
        let run_count = traversal.run_count(dims);
        let partitions = config
            .partitions
            .unwrap_or_else(worker_count)
            .clamp(1, run_count.max(1));
        let parallel = cfg!(feature = "parallel")
            && partitions > 1
            && dims.numel() >= config.min_parallel_elements;
        let runs_per_partition = if parallel {
            run_count.div_ceil(partitions)
        } else {
            run_count.max(1)
        };
        Self {
            run_len,
            run_count,
            runs_per_partition,
            parallel,
        }
    }

    /// Elements per partition (a whole number of runs)
    pub fn chunk_len(&self) -> usize {
        self.runs_per_partition * self.run_len
    }

    pub fn partitions(&self) -> usize {
        self.run_count.div_ceil(self.runs_per_partition.max(1))
    }
}

fn worker_count() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// Evaluate `kernel` once per logical element and store its results at the
/// element's physical offset in `dst` (value) and `ws` (omega, if present).
///
/// `dst` and `ws` must be at least as long as the layout's physical length.
/// Channel padding lanes of blocked layouts are left untouched.
pub(crate) fn drive<T, A, K>(
    dims: Dims4,
    addr: &A,
    traversal: Traversal,
    config: &DriverConfig,
    dst: &mut [T],
    ws: Option<&mut [T]>,
    kernel: K,
) where
    T: LrnElement,
    A: Addressing,
    K: Fn(Coord) -> ElementOut<T> + Sync,
{
    if dims.numel() == 0 {
        return;
    }
    let plan = PartitionPlan::new(dims, traversal, config);
    tracing::trace!(
        ?traversal,
        partitions = plan.partitions(),
        run_len = plan.run_len,
        parallel = plan.parallel,
        "lrn tiling plan"
    );

    if traversal == Traversal::Gather {
        gather_scatter(dims, addr, &plan, dst, ws, &kernel);
        return;
    }

    let total = plan.run_count * plan.run_len;
    let dst = &mut dst[..total];
    let chunk = plan.chunk_len();
    let fill = |part: usize, d: &mut [T], w: Option<&mut [T]>| {
        let first_run = part * plan.runs_per_partition;
        match w {
            Some(w) => fill_runs(dims, traversal, &kernel, first_run, d.len(), |i, out| {
                d[i] = out.value;
                w[i] = out.omega;
            }),
            None => fill_runs(dims, traversal, &kernel, first_run, d.len(), |i, out| {
                d[i] = out.value;
            }),
        }
    };

    match ws {
        Some(ws) => {
            let ws = &mut ws[..total];
            #[cfg(feature = "parallel")]
            if plan.parallel {
                dst.par_chunks_mut(chunk)
                    .zip(ws.par_chunks_mut(chunk))
                    .enumerate()
                    .for_each(|(p, (d, w))| fill(p, d, Some(w)));
                return;
            }
            dst.chunks_mut(chunk)
                .zip(ws.chunks_mut(chunk))
                .enumerate()
                .for_each(|(p, (d, w))| fill(p, d, Some(w)));
        }
        None => {
            #[cfg(feature = "parallel")]
            if plan.parallel {
                dst.par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(p, d)| fill(p, d, None));
                return;
            }
            dst.chunks_mut(chunk)
                .enumerate()
                .for_each(|(p, d)| fill(p, d, None));
        }
    }
}

/// Walk `len` elements worth of runs starting at `first_run`, emitting each
/// result with its index relative to the first run.
#[inline]
fn fill_runs<T, K, E>(
    dims: Dims4,
    traversal: Traversal,
    kernel: &K,
    first_run: usize,
    len: usize,
    mut emit: E,
) where
    K: Fn(Coord) -> ElementOut<T>,
    E: FnMut(usize, ElementOut<T>),
{
    let run_len = traversal.run_len(dims);
    for r in 0..len / run_len {
        let origin = traversal.run_origin(dims, first_run + r);
        let base = r * run_len;
        for lane in 0..run_len {
            let coord = traversal.lane(origin, lane);
            // blocked padding lanes
            if coord.c >= dims.c {
                continue;
            }
            emit(base + lane, kernel(coord));
        }
    }
}

/// Arbitrary strides: compute in logical order into a staging buffer, then
/// scatter to the strided offsets on the calling thread.
fn gather_scatter<T, A, K>(
    dims: Dims4,
    addr: &A,
    plan: &PartitionPlan,
    dst: &mut [T],
    mut ws: Option<&mut [T]>,
    kernel: &K,
) where
    T: LrnElement,
    A: Addressing,
    K: Fn(Coord) -> ElementOut<T> + Sync,
{
    let zero = ElementOut {
        value: T::zero(),
        omega: T::zero(),
    };
    let mut staged = vec![zero; dims.numel()];
    let chunk = plan.chunk_len();
    let fill = |part: usize, s: &mut [ElementOut<T>]| {
        let first_run = part * plan.runs_per_partition;
        fill_runs(dims, Traversal::Gather, kernel, first_run, s.len(), |i, out| {
            s[i] = out
        });
    };

    #[cfg(feature = "parallel")]
    if plan.parallel {
        staged
            .par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(p, s)| fill(p, s));
    } else {
        staged.chunks_mut(chunk).enumerate().for_each(|(p, s)| fill(p, s));
    }
    #[cfg(not(feature = "parallel"))]
    staged.chunks_mut(chunk).enumerate().for_each(|(p, s)| fill(p, s));

    for (i, out) in staged.into_iter().enumerate() {
        let off = addr.offset(dims.coord_of(i));
        dst[off] = out.value;
        if let Some(ws) = ws.as_deref_mut() {
            ws[off] = out.omega;
        }
    }
}
