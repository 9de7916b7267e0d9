//! Hyperparameters, normalization mode and driver configuration.

use crate::math::LrnElement;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Axis of the energy window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum LrnMode {
    /// Window over neighboring channels at a fixed pixel
    #[default]
    ChannelWise,
    /// Square spatial window within a single channel
    Spatial,
}

impl LrnMode {
    /// Nominal number of window terms; the energy is always divided by this,
    /// even where the window is clipped at a border.
    pub fn divisor(self, local_size: usize) -> usize {
        match self {
            LrnMode::ChannelWise => local_size,
            LrnMode::Spatial => local_size * local_size,
        }
    }
}

/// LRN hyperparameters: `dst = src * (k + alpha * energy / divisor)^(-beta)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LrnParams<T> {
    /// Window size (positive, odd)
    pub local_size: usize,
    /// Scaling parameter
    pub alpha: T,
    /// Exponent parameter
    pub beta: T,
    /// Bias parameter (must be > 0)
    pub k: T,
}

impl<T: LrnElement> LrnParams<T> {
    pub fn new(local_size: usize, alpha: T, beta: T, k: T) -> Self {
        Self {
            local_size,
            alpha,
            beta,
            k,
        }
    }

    /// Set the size parameter
    pub fn with_size(mut self, local_size: usize) -> Self {
        self.local_size = local_size;
        self
    }

    pub fn with_alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: T) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_k(mut self, k: T) -> Self {
        self.k = k;
        self
    }

    /// Distance from the window center to its edge
    pub fn half_size(&self) -> usize {
        self.local_size.saturating_sub(1) / 2
    }

    /// Caller contract; checked in debug builds only.
    pub(crate) fn debug_check(&self) {
        debug_assert!(
            self.local_size % 2 == 1,
            "LRN local_size must be a positive odd integer, got {}",
            self.local_size
        );
        debug_assert!(self.k > T::zero(), "LRN bias k must be > 0, got {:?}", self.k);
    }
}

impl<T: LrnElement> Default for LrnParams<T> {
    fn default() -> Self {
        Self::new(
            5,
            T::from_f64_lossy(1e-4),
            T::from_f64_lossy(0.75),
            T::one(),
        )
    }
}

/// How the tiling driver spreads work over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Tensors with fewer logical elements run on the calling thread
    pub min_parallel_elements: usize,
    /// Number of static partitions; `None` uses the worker count of the pool
    pub partitions: Option<usize>,
}

impl DriverConfig {
    /// Always run on the calling thread
    pub fn sequential() -> Self {
        Self {
            min_parallel_elements: usize::MAX,
            partitions: Some(1),
        }
    }

    /// Parallelize regardless of size
    pub fn parallel() -> Self {
        Self {
            min_parallel_elements: 0,
            partitions: None,
        }
    }

    pub fn with_min_parallel_elements(mut self, elements: usize) -> Self {
        self.min_parallel_elements = elements;
        self
    }

    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = Some(partitions.max(1));
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            min_parallel_elements: 4096,
            partitions: None,
        }
    }
}
