//! # codimg - Compute-on-demand image filtering
//!
//! codimg evaluates image operations lazily and splits every processed region
//! into a bounds-check-free interior and boundary-handled borders.
//!
//! ## Features
//!
//! - **Lazy operator graphs**: Compose nodes that compute a voxel only when asked
//! - **Region safety**: Kernels skip coordinate checks wherever their footprint stays inside the image
//! - **Boundary policies**: Fixed value, mirroring, zero flux, or a second source
//! - **Point filters**: Convolution, derivatives and Hessian eigen-analysis at a single voxel
//! - **Image filters**: Separable and Gaussian convolution, finite differences, binary morphology
//!
//! ## Quick Start
//!
//! ```rust
//! use codimg::prelude::*;
//! use std::sync::Arc;
//!
//! let region = Region::from_size(Point::zero(), [8, 8, 1]);
//! let image = Arc::new(Image::from_fn(region, |p| (p.x() * p.y()) as f64));
//!
//! // Whole-image Gaussian smoothing
//! let mut gaussian = GaussianFilter::new().input(image.clone()).sigma(1.0);
//! gaussian.update().unwrap();
//!
//! // The same voxel on demand, through a graph
//! let source = BoundaryPolicy::Mirror.handler_for(image.clone());
//! let dx = DerivativePointFilter::finite(source, 0, 1, DifferenceScheme::Central).unwrap();
//! let slope: CodRef<f64> = Arc::new(PointFilterNode::new(dx));
//! let steep = BinaryNode::new(BinaryOp::Greater, slope, Arc::new(ConstantNode::new(3.0)) as CodRef<f64>).unwrap();
//!
//! let p = Point::new(2, 5, 0);
//! assert_eq!(steep.get(p, image.local_to_index(p)), 1.0);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`core`]: Geometry, images, errors and configuration
//! - [`boundary`]: Values outside the image domain
//! - [`region`]: Safe/unsafe region partitioning
//! - [`iter`]: Window and neighbour iterators
//! - [`kernel`]: Convolution kernels and structuring elements
//! - [`point`]: Per-voxel filters and the symmetric eigen-solver
//! - [`cod`]: Compute-on-demand nodes
//! - [`filters`]: Whole-image filters

#![warn(clippy::all)]

pub mod boundary;
pub mod cod;
pub mod core;
pub mod filters;
pub mod iter;
pub mod kernel;
pub mod point;
pub mod region;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust
/// use codimg::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::config::CodConfig;
    pub use crate::core::geometry::{Point, Region};
    pub use crate::core::image::Image;
    pub use crate::core::scalar::Scalar;

    // Errors
    pub use crate::core::error::{
        CodError, CodResult, ConfigError, Error, FilterError, FilterResult, ImageError,
    };

    // Boundary handling
    pub use crate::boundary::{
        AlternateSourceBoundary, BoundaryHandler, BoundaryPolicy, BoundaryRef, FixedValueBoundary,
        MirrorBoundary, ZeroFluxBoundary,
    };

    // Regions and iteration
    pub use crate::iter::{Connectivity, NeighborIndexIter, NeighborPointIter, WindowIndexIter, WindowPointIter};
    pub use crate::region::{partition, Partition};

    // Kernels
    pub use crate::kernel::{DifferenceScheme, Kernel, StructuringElement};

    // Point filters
    pub use crate::point::{
        ConvolutionPointFilter, DerivativePointFilter, EigenSystem, HessianPointFilter, PointFilter,
    };

    // Graph nodes
    pub use crate::cod::{
        materialize, BinaryNode, BinaryOp, CodNode, CodRef, ConstantNode, DeferredImageNode,
        EigenvalueNode, EigenvectorNode, ImageNode, IntoCodNode, ParamUnaryNode, ParamUnaryOp,
        PointFilterNode, QuantizeNode, RegionInfo, TernaryNode, UnaryNode, UnaryOp,
    };

    // Image filters
    pub use crate::filters::{
        BinaryMorphologyFilter, ConvolutionFilter, FiniteDifferenceFilter, GaussianFilter,
        HessianEigenFilter, ImageFilter, MorphologyOp, SeparableConvolutionFilter,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "codimg");
    }

    #[test]
    fn test_graph_over_filters_matches_image_filter() {
        let region = Region::from_size(Point::zero(), [7, 6, 1]);
        let image = Arc::new(Image::from_fn(region, |p| ((p.x() * 3 + p.y() * 5) % 7) as f64));

        let mut whole = ConvolutionFilter::new()
            .input(image.clone())
            .kernel(Kernel::mean([1, 1, 0]))
            .with_config(CodConfig::new().with_boundary_policy(BoundaryPolicy::Mirror));
        whole.update().unwrap();

        let source = BoundaryPolicy::Mirror.handler_for(image.clone());
        let node = PointFilterNode::new(ConvolutionPointFilter::new(source, Arc::new(Kernel::mean([1, 1, 0]))));
        let lazy = materialize::<f64, _>(&node).unwrap();

        for (a, b) in lazy.data().iter().zip(whole.output().unwrap().data()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_deferred_smoothing_feeds_graph() {
        let region = Region::from_size(Point::zero(), [12, 12, 1]);
        let image = Arc::new(Image::from_fn(region, |p| (p.x() + p.y()) as f64));
        let input = image.clone();
        let smoothed: CodRef<f64> = Arc::new(DeferredImageNode::new(region, move || {
            let mut g = GaussianFilter::new().input(input).sigma(0.8);
            g.update().map_err(|e| CodError::InvariantViolation(e.to_string()))?;
            g.into_output()
                .ok_or_else(|| CodError::InvariantViolation("no output".to_string()))
        }));
        let residual = BinaryNode::new(BinaryOp::Sub, image.clone(), smoothed).unwrap();
        residual.prepare().unwrap();
        let out = materialize::<f64, _>(&residual).unwrap();
        // linear ramp far from the border is preserved by symmetric smoothing
        let p = Point::new(6, 6, 0);
        assert!(out.get(p).unwrap().abs() < 1e-9);
    }
}
