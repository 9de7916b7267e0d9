//! Local Response Normalization layer
//!
//! LRN normalizes each activation by the squared energy of a local neighborhood.
//! This was used in older CNN architectures like AlexNet for normalization before
//! BatchNorm became popular. Formula: `LRN(x) = x * (k + alpha/n * sum(x_i^2))^(-beta)`
//!
//! In `ChannelWise` mode (default), the sum is over a local neighborhood of channels.
//! In `Spatial` mode, the sum is over a local spatial neighborhood within each channel.

use crate::backward::lrn_backward_with_config;
use crate::forward::lrn_forward_with_config;
use crate::math::LrnElement;
use crate::params::{DriverConfig, LrnMode, LrnParams};
use crate::tensor::Tensor4D;
use crate::{LrnError, Result};

/// Local Response Normalization over [`Tensor4D`] inputs in any layout
#[derive(Debug, Clone)]
pub struct LocalResponseNorm<T> {
    params: LrnParams<T>,
    mode: LrnMode,
    driver: DriverConfig,
}

impl<T: LrnElement> LocalResponseNorm<T> {
    /// Create a new channel-wise LocalResponseNorm layer
    ///
    /// # Arguments
    /// * `size` - Number of channels to normalize over (default: 5)
    /// * `alpha` - Scaling parameter (default: 0.0001)
    /// * `beta` - Exponent parameter (default: 0.75)
    /// * `k` - Bias parameter (default: 1.0)
    pub fn new(size: usize, alpha: T, beta: T, k: T) -> Self {
        Self::new_with_mode(size, alpha, beta, k, LrnMode::ChannelWise)
    }

    /// Create a new LocalResponseNorm layer with specified mode
    pub fn new_with_mode(size: usize, alpha: T, beta: T, k: T, mode: LrnMode) -> Self {
        Self {
            params: LrnParams::new(size, alpha, beta, k),
            mode,
            driver: DriverConfig::default(),
        }
    }

    /// Create a new LocalResponseNorm layer with default parameters
    pub fn new_default() -> Self {
        Self::from_params(LrnParams::default(), LrnMode::ChannelWise)
    }

    pub fn from_params(params: LrnParams<T>, mode: LrnMode) -> Self {
        Self {
            params,
            mode,
            driver: DriverConfig::default(),
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.params.local_size = size;
        self
    }

    pub fn with_alpha(mut self, alpha: T) -> Self {
        self.params.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: T) -> Self {
        self.params.beta = beta;
        self
    }

    pub fn with_k(mut self, k: T) -> Self {
        self.params.k = k;
        self
    }

    pub fn with_mode(mut self, mode: LrnMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_driver_config(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }

    pub fn size(&self) -> usize {
        self.params.local_size
    }

    pub fn alpha(&self) -> T {
        self.params.alpha
    }

    pub fn beta(&self) -> T {
        self.params.beta
    }

    pub fn k(&self) -> T {
        self.params.k
    }

    pub fn mode(&self) -> LrnMode {
        self.mode
    }

    pub fn params(&self) -> &LrnParams<T> {
        &self.params
    }

    /// Inference forward pass; the output shares the input's dims and layout.
    pub fn forward(&self, input: &Tensor4D<T>) -> Result<Tensor4D<T>> {
        let mut output = Tensor4D::zeros(input.dims(), input.layout());
        lrn_forward_with_config(
            input.as_slice(),
            output.as_mut_slice(),
            None,
            input.dims(),
            &self.params,
            self.mode,
            &input.layout(),
            &self.driver,
        );
        Ok(output)
    }

    /// Training forward pass: returns the output and the workspace holding
    /// each element's normalization factor.
    pub fn forward_training(&self, input: &Tensor4D<T>) -> Result<(Tensor4D<T>, Tensor4D<T>)> {
        let mut output = Tensor4D::zeros(input.dims(), input.layout());
        let mut workspace = Tensor4D::zeros(input.dims(), input.layout());
        lrn_forward_with_config(
            input.as_slice(),
            output.as_mut_slice(),
            Some(workspace.as_mut_slice()),
            input.dims(),
            &self.params,
            self.mode,
            &input.layout(),
            &self.driver,
        );
        Ok((output, workspace))
    }

    /// Gradient with respect to `input`, given the gradient of the output.
    pub fn backward(&self, input: &Tensor4D<T>, grad_output: &Tensor4D<T>) -> Result<Tensor4D<T>> {
        if grad_output.dims() != input.dims() {
            return Err(LrnError::shape_mismatch(
                "local_response_norm_backward",
                &input.dims().to_string(),
                &grad_output.dims().to_string(),
            ));
        }
        if grad_output.layout() != input.layout() {
            return Err(LrnError::shape_mismatch(
                "local_response_norm_backward",
                &format!("layout {}", input.layout()),
                &format!("layout {}", grad_output.layout()),
            ));
        }

        let mut grad_input = Tensor4D::zeros(input.dims(), input.layout());
        lrn_backward_with_config(
            input.as_slice(),
            grad_output.as_slice(),
            grad_input.as_mut_slice(),
            input.dims(),
            &self.params,
            self.mode,
            &input.layout(),
            &self.driver,
        )?;
        Ok(grad_input)
    }
}
