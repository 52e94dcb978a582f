//! Contiguous multi-dimensional image storage.
//!
//! An [`Image`] owns a dense buffer laid out x-fastest over an arbitrary
//! [`Region`]. The region origin may be negative, which is how kernels store
//! their offsets. Iterators use the per-axis stride table to step between
//! neighbours with plain integer additions.

use crate::core::error::{ImageError, ImageResult};
use crate::core::geometry::{Point, Region, DIM};

/// Dense image over a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    region: Region,
    strides: [i64; DIM],
    data: Vec<T>,
}

/// Stride table for a region: `[1, sx, sx*sy]`.
pub fn strides_for(region: &Region) -> [i64; DIM] {
    let sizes = region.sizes();
    let mut strides = [1i64; DIM];
    for d in 1..DIM {
        strides[d] = strides[d - 1] * sizes[d - 1] as i64;
    }
    strides
}

impl<T> Image<T> {
    /// Wrap an existing buffer. The buffer length must equal the region volume.
    pub fn from_vec(region: Region, data: Vec<T>) -> ImageResult<Self> {
        let expected = region.volume();
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            region,
            strides: strides_for(&region),
            data,
        })
    }

    /// Build an image by evaluating `f` at every point, in memory order.
    pub fn from_fn(region: Region, f: impl FnMut(Point) -> T) -> Self {
        let data: Vec<T> = region.points().map(f).collect();
        Self {
            region,
            strides: strides_for(&region),
            data,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn min_point(&self) -> Point {
        self.region.min()
    }

    pub fn max_point(&self) -> Point {
        self.region.max()
    }

    /// Per-axis linear index strides.
    pub fn strides(&self) -> &[i64; DIM] {
        &self.strides
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn contains(&self, p: Point) -> bool {
        self.region.contains(p)
    }

    /// Signed linear offset of `p`, valid or not.
    ///
    /// Iterators use this to position themselves before a window that may
    /// start outside the domain.
    #[inline]
    pub fn offset_of(&self, p: Point) -> i64 {
        (p - self.region.min()).dot(&self.strides)
    }

    /// Linear index of an in-domain point.
    #[inline]
    pub fn local_to_index(&self, p: Point) -> usize {
        debug_assert!(self.contains(p), "point {p} outside {}", self.region);
        self.offset_of(p) as usize
    }

    /// Inverse of [`Image::local_to_index`].
    pub fn index_to_point(&self, index: usize) -> Point {
        let sizes = self.region.sizes();
        let mut rest = index;
        let mut p = self.region.min();
        for d in 0..DIM {
            let size = sizes[d].max(1);
            p.0[d] += (rest % size) as i64;
            rest /= size;
        }
        p
    }

    /// Same region, hence same index layout.
    pub fn same_layout<U>(&self, other: &Image<U>) -> bool {
        self.region == other.region && self.data.len() == other.data.len()
    }

    /// Convert every pixel.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Image<U> {
        Image {
            region: self.region,
            strides: self.strides,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Image<T> {
    /// Image filled with a constant.
    pub fn new(region: Region, fill: T) -> Self {
        Self {
            region,
            strides: strides_for(&region),
            data: vec![fill; region.volume()],
        }
    }
}

impl<T: Copy> Image<T> {
    /// Value at `p`, or `None` outside the domain.
    #[inline]
    pub fn get(&self, p: Point) -> Option<T> {
        if self.contains(p) {
            Some(self.data[self.offset_of(p) as usize])
        } else {
            None
        }
    }

    /// Value at a linear index.
    ///
    /// # Panics
    /// Panics if `index >= len()`, like slice indexing.
    #[inline]
    pub fn at(&self, index: usize) -> T {
        self.data[index]
    }

    pub fn set(&mut self, p: Point, value: T) -> ImageResult<()> {
        if !self.contains(p) {
            return Err(ImageError::OutOfDomain { point: p });
        }
        let index = self.offset_of(p) as usize;
        self.data[index] = value;
        Ok(())
    }

    #[inline]
    pub fn set_at(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    /// Fill every voxel of `region ∩ domain`.
    pub fn fill_region(&mut self, region: &Region, value: T) {
        let clipped = self.region.intersect(region);
        for p in clipped.points() {
            let index = self.offset_of(p) as usize;
            self.data[index] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Image<i32> {
        let region = Region::from_size(Point::new(-1, 2, 0), [3, 2, 2]);
        Image::from_fn(region, |p| (p.x() + 10 * p.y() + 100 * p.z()) as i32)
    }

    #[test]
    fn test_from_vec_checks_length() {
        let region = Region::from_size(Point::zero(), [2, 2, 1]);
        assert!(Image::from_vec(region, vec![0u8; 4]).is_ok());
        assert_eq!(
            Image::from_vec(region, vec![0u8; 3]).unwrap_err(),
            ImageError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_strides_and_indexing() {
        let img = ramp();
        assert_eq!(img.strides(), &[1, 3, 6]);
        let p = Point::new(1, 3, 1);
        let idx = img.local_to_index(p);
        assert_eq!(idx, 2 + 3 + 6);
        assert_eq!(img.at(idx), 1 + 30 + 100);
        assert_eq!(img.index_to_point(idx), p);
        assert_eq!(img.get(p), Some(131));
        assert_eq!(img.get(Point::new(2, 3, 1)), None);
    }

    #[test]
    fn test_set_outside_domain_fails() {
        let mut img = ramp();
        assert!(img.set(Point::new(0, 2, 0), 7).is_ok());
        assert_eq!(img.get(Point::new(0, 2, 0)), Some(7));
        assert!(matches!(
            img.set(Point::new(5, 5, 5), 1),
            Err(ImageError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn test_fill_region_clips() {
        let mut img = Image::new(Region::from_size(Point::zero(), [3, 3, 1]), 0u8);
        img.fill_region(&Region::new(Point::new(2, 2, 0), Point::new(9, 9, 0)), 5);
        assert_eq!(img.data().iter().filter(|&&v| v == 5).count(), 1);
        assert_eq!(img.get(Point::new(2, 2, 0)), Some(5));
    }
}
