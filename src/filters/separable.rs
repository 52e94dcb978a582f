//! Separable convolution and Gaussian smoothing.

use super::convolution::convolve_into;
use super::{resolve_region, ImageFilter};
use crate::boundary::BoundaryPolicy;
use crate::core::config::CodConfig;
use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::{Point, Region, DIM};
use crate::core::image::Image;
use crate::core::scalar::Scalar;
use crate::kernel::Kernel;
use log::debug;
use std::sync::Arc;

/// One 1-D kernel per axis, applied axis by axis.
///
/// Intermediate passes run in `f64` on a region grown by the reach of the
/// passes still to come, so the final pass sees computed values everywhere it
/// reads inside the domain. Each pass wraps its input with the same boundary
/// policy. Under a fixed value `c`, a later pass fills with `c` scaled by the
/// sums of the kernels already applied, which is what those passes would have
/// produced from an all-`c` outside.
pub struct SeparableConvolutionFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    kernels: [Option<Kernel>; DIM],
    policy: Option<BoundaryPolicy>,
    process_region: Option<Region>,
    config: CodConfig,
    output: Option<Image<T>>,
}

impl<T: Scalar> Default for SeparableConvolutionFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> SeparableConvolutionFilter<T> {
    pub fn new() -> Self {
        Self {
            input: None,
            kernels: [None, None, None],
            policy: None,
            process_region: None,
            config: CodConfig::default(),
            output: None,
        }
    }

    pub fn input(mut self, image: Arc<Image<T>>) -> Self {
        self.input = Some(image);
        self
    }

    /// Kernel for `axis`. Axes without a kernel are left untouched.
    pub fn axis_kernel(mut self, axis: usize, kernel: Kernel) -> Self {
        if axis < DIM {
            self.kernels[axis] = Some(kernel);
        }
        self
    }

    pub fn boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn process_region(mut self, region: Region) -> Self {
        self.process_region = Some(region);
        self
    }

    pub fn with_config(mut self, config: CodConfig) -> Self {
        self.config = config;
        self
    }

    pub fn into_output(self) -> Option<Image<T>> {
        self.output
    }

    fn validate_kernels(&self) -> FilterResult<Vec<(usize, &Kernel)>> {
        let mut passes = Vec::new();
        for (axis, kernel) in self.kernels.iter().enumerate() {
            let Some(kernel) = kernel else { continue };
            let f = kernel.footprint();
            let one_dimensional = (0..DIM).all(|d| d == axis || (f.min()[d] == 0 && f.max()[d] == 0));
            if !one_dimensional {
                return Err(FilterError::invalid(
                    "kernel",
                    format!("kernel for axis {axis} spans {f}"),
                ));
            }
            passes.push((axis, kernel));
        }
        Ok(passes)
    }
}

impl<T: Scalar> ImageFilter for SeparableConvolutionFilter<T> {
    type Output = Image<T>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        let passes = self.validate_kernels()?;
        let policy = self.policy.unwrap_or(self.config.boundary.policy);
        let safe_path = self.config.convolution.safe_path;
        let domain = *input.region();
        let requested = resolve_region(&input, self.process_region.as_ref());

        let mut current = Arc::new(input.map(|v| v.to_f64()));
        let mut applied_sum = 1.0;
        for (i, &(axis, kernel)) in passes.iter().enumerate() {
            let (lo, hi) = passes[i + 1..]
                .iter()
                .fold((Point::zero(), Point::zero()), |(lo, hi), (_, k)| {
                    (lo + k.footprint().min(), hi + k.footprint().max())
                });
            let region = requested.expand(lo, hi).intersect(&domain);
            debug!("separable pass {} along axis {} over {}", i, axis, region);

            let pass_policy = match policy {
                BoundaryPolicy::FixedValue(c) => BoundaryPolicy::FixedValue(c * applied_sum),
                other => other,
            };
            let source = pass_policy.handler_for(current.clone());
            let mut next = (*current).clone();
            convolve_into(&source, kernel, &region, safe_path, &mut next);
            current = Arc::new(next);
            applied_sum *= kernel.sum();
        }

        let mut out = (*input).clone();
        for p in requested.points() {
            let index = out.local_to_index(p);
            out.set_at(index, T::from_f64(current.at(index)));
        }
        self.output = Some(out);
        Ok(())
    }

    fn output(&self) -> Option<&Image<T>> {
        self.output.as_ref()
    }
}

/// Gaussian smoothing with a per-axis standard deviation.
///
/// Axes with `sigma = 0` and axes of extent 1 are skipped. The kernel radius is
/// `ceil(truncate · sigma)`, with `truncate` taken from the configuration.
pub struct GaussianFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    sigma: [f64; DIM],
    policy: Option<BoundaryPolicy>,
    process_region: Option<Region>,
    config: CodConfig,
    output: Option<Image<T>>,
}

impl<T: Scalar> Default for GaussianFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> GaussianFilter<T> {
    pub fn new() -> Self {
        Self {
            input: None,
            sigma: [1.0; DIM],
            policy: None,
            process_region: None,
            config: CodConfig::default(),
            output: None,
        }
    }

    pub fn input(mut self, image: Arc<Image<T>>) -> Self {
        self.input = Some(image);
        self
    }

    /// Same sigma on every axis.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = [sigma; DIM];
        self
    }

    pub fn sigmas(mut self, sigma: [f64; DIM]) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn process_region(mut self, region: Region) -> Self {
        self.process_region = Some(region);
        self
    }

    pub fn with_config(mut self, config: CodConfig) -> Self {
        self.config = config;
        self
    }

    pub fn into_output(self) -> Option<Image<T>> {
        self.output
    }
}

impl<T: Scalar> ImageFilter for GaussianFilter<T> {
    type Output = Image<T>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        if let Some(&s) = self.sigma.iter().find(|s| !(**s >= 0.0) || !s.is_finite()) {
            return Err(FilterError::invalid("sigma", format!("must be non-negative, got {s}")));
        }

        let truncate = self.config.gaussian.truncate;
        let mut inner = SeparableConvolutionFilter::new()
            .input(input.clone())
            .with_config(self.config);
        for axis in 0..DIM {
            if self.sigma[axis] > 0.0 && input.region().size(axis) > 1 {
                inner = inner.axis_kernel(axis, Kernel::gaussian(axis, self.sigma[axis], truncate)?);
            }
        }
        if let Some(policy) = self.policy {
            inner = inner.boundary_policy(policy);
        }
        if let Some(region) = self.process_region {
            inner = inner.process_region(region);
        }
        inner.update()?;
        self.output = inner.into_output();
        Ok(())
    }

    fn output(&self) -> Option<&Image<T>> {
        self.output.as_ref()
    }
}
