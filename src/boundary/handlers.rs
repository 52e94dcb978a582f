//! Concrete boundary policies.

use super::{BoundaryHandler, BoundaryRef};
use crate::core::geometry::{Point, DIM};
use crate::core::image::Image;
use std::sync::Arc;

/// Returns a constant outside the domain.
#[derive(Debug, Clone)]
pub struct FixedValueBoundary<T> {
    image: Arc<Image<T>>,
    fill: T,
}

impl<T: Copy> FixedValueBoundary<T> {
    pub fn new(image: Arc<Image<T>>, fill: T) -> Self {
        Self { image, fill }
    }

    pub fn fill(&self) -> T {
        self.fill
    }
}

impl<T: Copy + Send + Sync> BoundaryHandler<T> for FixedValueBoundary<T> {
    fn image(&self) -> &Image<T> {
        &self.image
    }

    #[inline]
    fn get(&self, p: Point) -> T {
        self.image.get(p).unwrap_or(self.fill)
    }
}

/// Reflects out-of-domain coordinates back inside.
///
/// The reflection is periodic with period `2 * (n - 1)` per axis and does not
/// repeat the edge voxel: for a row `a b c d`, coordinate `-1` maps to `b`
/// and `4` maps to `c`. Offsets of any size are handled.
#[derive(Debug, Clone)]
pub struct MirrorBoundary<T> {
    image: Arc<Image<T>>,
}

impl<T> MirrorBoundary<T> {
    pub fn new(image: Arc<Image<T>>) -> Self {
        Self { image }
    }
}

/// Reflect a coordinate into `[lo, lo + len)`.
#[inline]
pub(crate) fn mirror_coordinate(c: i64, lo: i64, len: i64) -> i64 {
    if len <= 1 {
        return lo;
    }
    let period = 2 * (len - 1);
    let r = (c - lo).rem_euclid(period);
    lo + if r < len { r } else { period - r }
}

impl<T: Copy + Send + Sync> BoundaryHandler<T> for MirrorBoundary<T> {
    fn image(&self) -> &Image<T> {
        &self.image
    }

    fn get(&self, p: Point) -> T {
        let region = self.image.region();
        let sizes = region.sizes();
        let lo = region.min();
        let q = Point(std::array::from_fn(|d| {
            mirror_coordinate(p.0[d], lo.0[d], sizes[d] as i64)
        }));
        self.image.at(self.image.local_to_index(q))
    }
}

/// Clamps each axis to the nearest valid coordinate.
#[derive(Debug, Clone)]
pub struct ZeroFluxBoundary<T> {
    image: Arc<Image<T>>,
}

impl<T> ZeroFluxBoundary<T> {
    pub fn new(image: Arc<Image<T>>) -> Self {
        Self { image }
    }
}

impl<T: Copy + Send + Sync> BoundaryHandler<T> for ZeroFluxBoundary<T> {
    fn image(&self) -> &Image<T> {
        &self.image
    }

    fn get(&self, p: Point) -> T {
        let region = self.image.region();
        let (lo, hi) = (region.min(), region.max());
        let mut q = p;
        for d in 0..DIM {
            q.0[d] = q.0[d].clamp(lo.0[d], hi.0[d]);
        }
        self.image.at(self.image.local_to_index(q))
    }
}

/// Delegates out-of-domain queries to a second handler.
///
/// The secondary handler has its own image and policy; a typical use is a
/// larger, coarser image that supplies context around a cropped one.
pub struct AlternateSourceBoundary<T: Copy> {
    image: Arc<Image<T>>,
    alternate: BoundaryRef<T>,
}

impl<T: Copy> AlternateSourceBoundary<T> {
    pub fn new(image: Arc<Image<T>>, alternate: BoundaryRef<T>) -> Self {
        Self { image, alternate }
    }

    pub fn alternate(&self) -> &BoundaryRef<T> {
        &self.alternate
    }
}

impl<T: Copy + Send + Sync> BoundaryHandler<T> for AlternateSourceBoundary<T> {
    fn image(&self) -> &Image<T> {
        &self.image
    }

    fn get(&self, p: Point) -> T {
        match self.image.get(p) {
            Some(v) => v,
            None => self.alternate.get(p),
        }
    }
}
