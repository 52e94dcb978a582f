//! Point filters: stateful per-coordinate evaluators.
//!
//! A point filter answers "what is the filtered value at this voxel" without
//! producing an image. Each filter remembers the last linear index it computed
//! and returns the cached result when asked again, which makes repeated
//! queries from several graph nodes cheap.
//!
//! Point filters are owned, not shared: cloning gives an independent memo,
//! and the graph adapter guards its filter with a mutex.

mod convolution;
mod derivative;
pub mod eigen;
mod hessian;

pub use convolution::ConvolutionPointFilter;
pub use derivative::DerivativePointFilter;
pub use eigen::{symmetric_eigen_2x2, symmetric_eigen_3x3, EigenSystem, SymmetricMatrix3};
pub use hessian::HessianPointFilter;

use crate::cod::RegionInfo;
use crate::core::geometry::Point;

/// A per-coordinate evaluator keyed on point and linear index.
pub trait PointFilter: Send {
    type Output: Copy;

    /// Value at `point`; `index` is the point's linear index in the input
    /// image and is also the memo key.
    fn evaluate(&mut self, point: Point, index: usize) -> Self::Output;

    /// Region over which `index` is meaningful.
    fn region_info(&self) -> RegionInfo;
}

/// Last-index memo.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Memo<V> {
    entry: Option<(usize, V)>,
}

impl<V: Copy> Memo<V> {
    pub(crate) fn new() -> Self {
        Self { entry: None }
    }

    #[inline]
    pub(crate) fn lookup(&self, index: usize) -> Option<V> {
        match self.entry {
            Some((cached, value)) if cached == index => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn store(&mut self, index: usize, value: V) -> V {
        self.entry = Some((index, value));
        value
    }
}
