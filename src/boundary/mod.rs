//! Boundary handlers: a defined value for every integer coordinate.
//!
//! A handler wraps one image and answers queries anywhere in space. Inside the
//! image domain every policy returns the stored value; outside, the policy
//! decides. All call forms (`get`, `get_indexed`, `get_at`) agree with the
//! point-based answer.

mod handlers;

pub use handlers::{AlternateSourceBoundary, FixedValueBoundary, MirrorBoundary, ZeroFluxBoundary};

use crate::core::config::BoundaryDefaults;
use crate::core::geometry::Point;
use crate::core::image::Image;
use crate::core::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Anything that knows both a coordinate and the matching linear offset.
///
/// Implemented by the point-tracking iterators.
pub trait Cursor {
    fn point(&self) -> Point;
    fn offset(&self) -> i64;
}

/// A value source defined on the whole integer lattice.
pub trait BoundaryHandler<T: Copy>: Send + Sync {
    /// The wrapped image.
    fn image(&self) -> &Image<T>;

    /// Value at an arbitrary point.
    fn get(&self, p: Point) -> T;

    /// Value at `p`, using `offset` as the linear index when `p` is in the
    /// domain. `offset` must equal `image().offset_of(p)`.
    #[inline]
    fn get_indexed(&self, p: Point, offset: i64) -> T {
        let image = self.image();
        if image.contains(p) {
            image.at(offset as usize)
        } else {
            self.get(p)
        }
    }

    /// Value at an iterator position.
    #[inline]
    fn get_at(&self, cursor: &dyn Cursor) -> T {
        self.get_indexed(cursor.point(), cursor.offset())
    }
}

/// Shared handle to a boundary handler.
pub type BoundaryRef<T> = Arc<dyn BoundaryHandler<T>>;

/// Policy descriptor that can build a handler for any image.
///
/// Multi-pass filters use it to wrap their intermediate images with the same
/// policy as the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Constant outside the domain.
    FixedValue(f64),
    /// Reflect across the violated boundary (edge voxel not repeated).
    Mirror,
    /// Clamp each axis to the nearest valid coordinate.
    ZeroFlux,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        BoundaryPolicy::ZeroFlux
    }
}

impl BoundaryPolicy {
    /// Build a handler of this policy around `image`.
    pub fn handler_for<T: Scalar>(&self, image: Arc<Image<T>>) -> BoundaryRef<T> {
        match *self {
            BoundaryPolicy::FixedValue(v) => Arc::new(FixedValueBoundary::new(image, T::from_f64(v))),
            BoundaryPolicy::Mirror => Arc::new(MirrorBoundary::new(image)),
            BoundaryPolicy::ZeroFlux => Arc::new(ZeroFluxBoundary::new(image)),
        }
    }
}

impl BoundaryDefaults {
    /// Build the configured default handler.
    pub fn handler_for<T: Scalar>(&self, image: Arc<Image<T>>) -> BoundaryRef<T> {
        self.policy.handler_for(image)
    }
}
