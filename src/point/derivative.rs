//! Derivatives along one axis at a single voxel.

use super::{ConvolutionPointFilter, PointFilter};
use crate::boundary::BoundaryRef;
use crate::cod::RegionInfo;
use crate::core::error::FilterResult;
use crate::core::geometry::Point;
use crate::core::scalar::Scalar;
use crate::kernel::{DifferenceScheme, Kernel};
use std::sync::Arc;

/// Derivative of order 1 or 2 along one axis, evaluated at a single voxel.
#[derive(Clone)]
pub struct DerivativePointFilter<T: Copy> {
    axis: usize,
    order: u32,
    inner: ConvolutionPointFilter<T>,
}

impl<T: Scalar> DerivativePointFilter<T> {
    /// Finite-difference derivative.
    pub fn finite(source: BoundaryRef<T>, axis: usize, order: u32, scheme: DifferenceScheme) -> FilterResult<Self> {
        let kernel = Kernel::difference(axis, order, scheme)?;
        Ok(Self {
            axis,
            order,
            inner: ConvolutionPointFilter::new(source, Arc::new(kernel)),
        })
    }

    /// Derivative of the input smoothed by a Gaussian of width `sigma`.
    pub fn gaussian(source: BoundaryRef<T>, axis: usize, order: u32, sigma: f64, truncate: f64) -> FilterResult<Self> {
        let kernel = Kernel::gaussian_derivative(axis, sigma, order, truncate)?;
        Ok(Self {
            axis,
            order,
            inner: ConvolutionPointFilter::new(source, Arc::new(kernel)),
        })
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn order(&self) -> u32 {
        self.order
    }
}

impl<T: Scalar> PointFilter for DerivativePointFilter<T> {
    type Output = f64;

    fn evaluate(&mut self, point: Point, index: usize) -> f64 {
        self.inner.evaluate(point, index)
    }

    fn region_info(&self) -> RegionInfo {
        self.inner.region_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::MirrorBoundary;
    use crate::core::geometry::Region;
    use crate::core::image::Image;

    fn quadratic() -> Arc<Image<f64>> {
        // f = x² + 3y
        Arc::new(Image::from_fn(Region::from_size(Point::zero(), [9, 9, 1]), |p| {
            (p.x() * p.x() + 3 * p.y()) as f64
        }))
    }

    #[test]
    fn test_finite_difference_on_quadratic() {
        let img = quadratic();
        let src: BoundaryRef<f64> = Arc::new(MirrorBoundary::new(img.clone()));
        let p = Point::new(4, 4, 0);
        let i = img.local_to_index(p);

        let mut dx = DerivativePointFilter::finite(src.clone(), 0, 1, DifferenceScheme::Central).unwrap();
        assert!((dx.evaluate(p, i) - 8.0).abs() < 1e-12);

        let mut dxx = DerivativePointFilter::finite(src.clone(), 0, 2, DifferenceScheme::Central).unwrap();
        assert!((dxx.evaluate(p, i) - 2.0).abs() < 1e-12);

        let mut dy = DerivativePointFilter::finite(src, 1, 1, DifferenceScheme::Forward).unwrap();
        assert!((dy.evaluate(p, i) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_derivative_exact_on_ramp() {
        let img = Arc::new(Image::from_fn(Region::from_size(Point::zero(), [21, 3, 1]), |p| {
            2.5 * p.x() as f64
        }));
        let src: BoundaryRef<f64> = Arc::new(MirrorBoundary::new(img.clone()));
        let mut d = DerivativePointFilter::gaussian(src, 0, 1, 1.0, 3.0).unwrap();
        let p = Point::new(10, 1, 0);
        assert!((d.evaluate(p, img.local_to_index(p)) - 2.5).abs() < 1e-9);
        assert_eq!(d.axis(), 0);
        assert_eq!(d.order(), 1);
    }

    #[test]
    fn test_rejects_bad_order() {
        let img = quadratic();
        let src: BoundaryRef<f64> = Arc::new(MirrorBoundary::new(img));
        assert!(DerivativePointFilter::finite(src.clone(), 0, 3, DifferenceScheme::Central).is_err());
        assert!(DerivativePointFilter::gaussian(src, 0, 1, -1.0, 3.0).is_err());
    }
}
