//! Hessian eigen-analysis at a single voxel.

use super::eigen::{symmetric_eigen_2x2, symmetric_eigen_3x3, EigenSystem, SymmetricMatrix3};
use super::{ConvolutionPointFilter, Memo, PointFilter};
use crate::boundary::BoundaryRef;
use crate::cod::RegionInfo;
use crate::core::config::DEFAULT_EIGEN_EPSILON;
use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::Point;
use crate::core::scalar::Scalar;
use crate::kernel::Kernel;
use std::sync::Arc;

/// Eigen-analysis of the Hessian at a single voxel.
///
/// Holds one convolution point filter per independent second derivative:
/// `xx, xy, yy` in 2-D and `xx, xy, xz, yy, yz, zz` in 3-D.
#[derive(Clone)]
pub struct HessianPointFilter<T: Copy> {
    dims: usize,
    epsilon: f64,
    components: Vec<ConvolutionPointFilter<T>>,
    memo: Memo<EigenSystem>,
}

fn axis_pairs(dims: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(dims * (dims + 1) / 2);
    for a in 0..dims {
        for b in a..dims {
            pairs.push((a, b));
        }
    }
    pairs
}

fn check_dims(dims: usize) -> FilterResult<()> {
    if dims != 2 && dims != 3 {
        return Err(FilterError::invalid("dims", format!("expected 2 or 3, got {dims}")));
    }
    Ok(())
}

impl<T: Scalar> HessianPointFilter<T> {
    fn from_kernels(source: BoundaryRef<T>, dims: usize, kernels: Vec<Kernel>) -> Self {
        let components = kernels
            .into_iter()
            .map(|k| ConvolutionPointFilter::new(source.clone(), Arc::new(k)))
            .collect();
        Self {
            dims,
            epsilon: DEFAULT_EIGEN_EPSILON,
            components,
            memo: Memo::new(),
        }
    }

    /// Hessian from central finite differences on 3-wide stencils.
    pub fn finite_difference(source: BoundaryRef<T>, dims: usize) -> FilterResult<Self> {
        check_dims(dims)?;
        let kernels = axis_pairs(dims)
            .into_iter()
            .map(|(a, b)| Kernel::cross_difference(a, b))
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(Self::from_kernels(source, dims, kernels))
    }

    /// Hessian of the input smoothed by an isotropic Gaussian.
    pub fn gaussian(source: BoundaryRef<T>, dims: usize, sigma: f64, truncate: f64) -> FilterResult<Self> {
        check_dims(dims)?;
        let mut kernels = Vec::new();
        for (a, b) in axis_pairs(dims) {
            let mut kernel = if a == b {
                Kernel::gaussian_derivative(a, sigma, 2, truncate)?
            } else {
                Kernel::gaussian_derivative(a, sigma, 1, truncate)?
                    .outer(&Kernel::gaussian_derivative(b, sigma, 1, truncate)?)
            };
            for axis in (0..dims).filter(|&d| d != a && d != b) {
                kernel = kernel.outer(&Kernel::gaussian(axis, sigma, truncate)?);
            }
            kernels.push(kernel);
        }
        Ok(Self::from_kernels(source, dims, kernels))
    }

    /// Tolerance handed to the eigen-solver.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Second derivatives at `point`, upper triangle in row order.
    pub fn hessian(&mut self, point: Point, index: usize) -> SymmetricMatrix3 {
        let mut h = [0.0; 6];
        for (slot, filter) in h.iter_mut().zip(self.components.iter_mut()) {
            *slot = filter.evaluate(point, index);
        }
        if self.dims == 2 {
            SymmetricMatrix3 {
                xx: h[0],
                xy: h[1],
                yy: h[2],
                ..SymmetricMatrix3::default()
            }
        } else {
            SymmetricMatrix3 {
                xx: h[0],
                xy: h[1],
                xz: h[2],
                yy: h[3],
                yz: h[4],
                zz: h[5],
            }
        }
    }
}

impl<T: Scalar> PointFilter for HessianPointFilter<T> {
    type Output = EigenSystem;

    fn evaluate(&mut self, point: Point, index: usize) -> EigenSystem {
        if let Some(v) = self.memo.lookup(index) {
            return v;
        }
        let h = self.hessian(point, index);
        let system = if self.dims == 2 {
            symmetric_eigen_2x2(h.xx, h.xy, h.yy, self.epsilon)
        } else {
            symmetric_eigen_3x3(&h, self.epsilon)
        };
        self.memo.store(index, system)
    }

    fn region_info(&self) -> RegionInfo {
        self.components
            .first()
            .map(|c| c.region_info())
            .unwrap_or(RegionInfo::Unbounded)
    }
}
