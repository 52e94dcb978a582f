//! Derivative filters: finite differences and Hessian eigen-analysis.

use super::convolution::convolve_into;
use super::{resolve_region, ImageFilter};
use crate::boundary::BoundaryPolicy;
use crate::core::config::CodConfig;
use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::{Region, DIM};
use crate::core::image::Image;
use crate::core::scalar::Scalar;
use crate::kernel::{DifferenceScheme, Kernel};
use crate::point::{EigenSystem, HessianPointFilter, PointFilter};
use log::debug;
use std::sync::Arc;

/// First or second derivative along one axis.
///
/// The output is `f64` so negative slopes of unsigned inputs survive. Voxels
/// outside the process region hold the input value.
pub struct FiniteDifferenceFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    axis: usize,
    order: u32,
    scheme: DifferenceScheme,
    policy: Option<BoundaryPolicy>,
    process_region: Option<Region>,
    config: CodConfig,
    output: Option<Image<f64>>,
}

impl<T: Scalar> Default for FiniteDifferenceFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> FiniteDifferenceFilter<T> {
    pub fn new() -> Self {
        Self {
            input: None,
            axis: 0,
            order: 1,
            scheme: DifferenceScheme::Central,
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

    pub fn axis(mut self, axis: usize) -> Self {
        self.axis = axis;
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn scheme(mut self, scheme: DifferenceScheme) -> Self {
        self.scheme = scheme;
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
}

impl<T: Scalar> ImageFilter for FiniteDifferenceFilter<T> {
    type Output = Image<f64>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        let kernel = Kernel::difference(self.axis, self.order, self.scheme)?;
        let policy = self.policy.unwrap_or(self.config.boundary.policy);
        let requested = resolve_region(&input, self.process_region.as_ref());

        let values = Arc::new(input.map(|v| v.to_f64()));
        let source = policy.handler_for(values.clone());
        let mut out = (*values).clone();
        let parts = convolve_into(
            &source,
            &kernel,
            &requested,
            self.config.convolution.safe_path,
            &mut out,
        );
        debug!(
            "order-{} difference along axis {} over {}: safe {}",
            self.order, self.axis, requested, parts.safe
        );
        self.output = Some(out);
        Ok(())
    }

    fn output(&self) -> Option<&Image<f64>> {
        self.output.as_ref()
    }
}

/// Per-voxel eigen-analysis of the Hessian.
///
/// Second derivatives come from central differences, or from Gaussian
/// derivative kernels when a scale is set. 2-D analysis is used when the input
/// has a single slice. Voxels outside the process region hold the default
/// (all-zero) system.
pub struct HessianEigenFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    sigma: Option<f64>,
    policy: Option<BoundaryPolicy>,
    process_region: Option<Region>,
    config: CodConfig,
    output: Option<Image<EigenSystem>>,
}

impl<T: Scalar> Default for HessianEigenFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> HessianEigenFilter<T> {
    pub fn new() -> Self {
        Self {
            input: None,
            sigma: None,
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

    /// Gaussian scale of the derivatives.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
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
}

impl<T: Scalar> ImageFilter for HessianEigenFilter<T> {
    type Output = Image<EigenSystem>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        let policy = self.policy.unwrap_or(self.config.boundary.policy);
        let dims = if input.region().size(DIM - 1) > 1 { 3 } else { 2 };
        let source = policy.handler_for(input.clone());

        let filter = match self.sigma {
            Some(sigma) => HessianPointFilter::gaussian(source, dims, sigma, self.config.gaussian.truncate)?,
            None => HessianPointFilter::finite_difference(source, dims)?,
        };
        let mut filter = filter.with_epsilon(self.config.eigen.epsilon);

        let requested = resolve_region(&input, self.process_region.as_ref());
        debug!("{}-D Hessian eigen-analysis over {}", dims, requested);
        let mut out = Image::new(*input.region(), EigenSystem::default());
        for p in requested.points() {
            let index = input.local_to_index(p);
            out.set_at(index, filter.evaluate(p, index));
        }
        self.output = Some(out);
        Ok(())
    }

    fn output(&self) -> Option<&Image<EigenSystem>> {
        self.output.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point;

    #[test]
    fn test_central_difference_of_ramp() {
        let image = Arc::new(Image::from_fn(Region::from_size(Point::zero(), [6, 4, 1]), |p| {
            (3 * p.y()) as u8
        }));
        let mut f = FiniteDifferenceFilter::new()
            .input(image)
            .axis(1)
            .boundary_policy(BoundaryPolicy::ZeroFlux);
        f.update().unwrap();
        let out = f.output().unwrap();
        assert_eq!(out.get(Point::new(2, 1, 0)), Some(3.0));
        assert_eq!(out.get(Point::new(2, 2, 0)), Some(3.0));
        // zero flux halves the slope at the borders
        assert_eq!(out.get(Point::new(2, 0, 0)), Some(1.5));
        assert_eq!(out.get(Point::new(2, 3, 0)), Some(1.5));
    }

    #[test]
    fn test_backward_second_difference() {
        let image = Arc::new(Image::from_fn(Region::from_size(Point::zero(), [6, 1, 1]), |p| {
            (p.x() * p.x()) as f64
        }));
        let mut f = FiniteDifferenceFilter::new()
            .input(image)
            .order(2)
            .scheme(DifferenceScheme::Backward);
        f.update().unwrap();
        assert_eq!(f.output().unwrap().get(Point::new(4, 0, 0)), Some(2.0));
    }

    #[test]
    fn test_bad_order_fails_update() {
        let image = Arc::new(Image::new(Region::from_size(Point::zero(), [3, 1, 1]), 0.0f32));
        let mut f = FiniteDifferenceFilter::new().input(image).order(5);
        assert!(f.update().is_err());
    }

    #[test]
    fn test_hessian_filter_blob_center() {
        // bright blob: negative curvature in both directions at the centre
        let image = Arc::new(Image::from_fn(Region::from_size(Point::zero(), [11, 11, 1]), |p| {
            let (x, y) = ((p.x() - 5) as f64, (p.y() - 5) as f64);
            100.0 - x * x - 2.0 * y * y
        }));
        let region = Region::new(Point::new(4, 4, 0), Point::new(6, 6, 0));
        let mut f = HessianEigenFilter::new()
            .input(image.clone())
            .boundary_policy(BoundaryPolicy::Mirror)
            .process_region(region);
        f.update().unwrap();
        let out = f.output().unwrap();

        let e = out.get(Point::new(5, 5, 0)).unwrap();
        assert_eq!(e.dims, 2);
        assert!((e.value(0) + 2.0).abs() < 1e-9);
        assert!((e.value(1) + 4.0).abs() < 1e-9);
        assert_eq!(out.get(Point::new(0, 0, 0)), Some(EigenSystem::default()));
    }

    #[test]
    fn test_hessian_filter_gaussian_3d() {
        let image = Arc::new(Image::from_fn(Region::from_size(Point::zero(), [9, 9, 9]), |p| {
            let z = (p.z() - 4) as f64;
            3.0 * z * z
        }));
        let mut f = HessianEigenFilter::new()
            .input(image)
            .sigma(1.0)
            .boundary_policy(BoundaryPolicy::Mirror)
            .with_config(CodConfig::new().with_gaussian_truncate(2.0))
            .process_region(Region::single(Point::new(4, 4, 4)));
        f.update().unwrap();
        let e = f.output().unwrap().get(Point::new(4, 4, 4)).unwrap();
        assert_eq!(e.dims, 3);
        assert!((e.value(2) - 6.0).abs() < 1e-9);
        assert!((e.vector(2)[2].abs() - 1.0).abs() < 1e-9);
    }
}
