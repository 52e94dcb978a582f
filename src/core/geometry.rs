//! Integer geometry primitives: points and axis-aligned regions.
//!
//! Everything in the crate is addressed in three axes (`x`, `y`, `z`).
//! Two-dimensional data simply uses a single slice along `z`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Index, IndexMut, Neg, Sub};

/// Number of axes handled by the geometry layer.
pub const DIM: usize = 3;

/// An integer coordinate (or offset) in voxel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point(pub [i64; DIM]);

impl Point {
    /// Create a 3-D point.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self([x, y, z])
    }

    /// Create a 2-D point (`z = 0`).
    pub const fn new2(x: i64, y: i64) -> Self {
        Self([x, y, 0])
    }

    /// The origin.
    pub const fn zero() -> Self {
        Self([0; DIM])
    }

    /// Point with every coordinate set to `v`.
    pub const fn splat(v: i64) -> Self {
        Self([v; DIM])
    }

    /// Unit offset along `axis`.
    pub fn unit(axis: usize) -> Self {
        let mut p = Self::zero();
        p.0[axis] = 1;
        p
    }

    pub fn x(&self) -> i64 {
        self.0[0]
    }

    pub fn y(&self) -> i64 {
        self.0[1]
    }

    pub fn z(&self) -> i64 {
        self.0[2]
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d].min(other.0[d])))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d].max(other.0[d])))
    }

    /// Dot product with a stride table, giving a linear index delta.
    pub fn dot(&self, strides: &[i64; DIM]) -> i64 {
        (0..DIM).map(|d| self.0[d] * strides[d]).sum()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Self::Output {
        Self(std::array::from_fn(|d| self.0[d] + rhs.0[d]))
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Self::Output {
        Self(std::array::from_fn(|d| self.0[d] - rhs.0[d]))
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Self::Output {
        Self(self.0.map(|v| -v))
    }
}

impl Index<usize> for Point {
    type Output = i64;

    fn index(&self, axis: usize) -> &i64 {
        &self.0[axis]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, axis: usize) -> &mut i64 {
        &mut self.0[axis]
    }
}

impl From<[i64; DIM]> for Point {
    fn from(v: [i64; DIM]) -> Self {
        Self(v)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

/// Axis-aligned box with inclusive corners.
///
/// A region is empty when `min > max` on any axis. All empty regions compare
/// equal, regardless of the corners they were built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Region {
    min: Point,
    max: Point,
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => self.min == other.min && self.max == other.max,
            _ => false,
        }
    }
}

impl Eq for Region {}

impl Region {
    /// Create a region from inclusive corners.
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// The canonical empty region.
    pub fn empty() -> Self {
        Self {
            min: Point::zero(),
            max: Point::splat(-1),
        }
    }

    /// Region starting at `origin` with the given per-axis sizes.
    pub fn from_size(origin: Point, size: [usize; DIM]) -> Self {
        if size.iter().any(|&s| s == 0) {
            return Self::empty();
        }
        let max = Point(std::array::from_fn(|d| origin.0[d] + size[d] as i64 - 1));
        Self { min: origin, max }
    }

    /// Region `[-r, r]` on every axis in `radius`.
    pub fn centered(radius: [i64; DIM]) -> Self {
        Self {
            min: Point(radius.map(|r| -r)),
            max: Point(radius),
        }
    }

    /// Single-voxel region.
    pub fn single(p: Point) -> Self {
        Self { min: p, max: p }
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|d| self.min.0[d] > self.max.0[d])
    }

    /// Number of voxels along `axis` (0 for an empty region).
    pub fn size(&self, axis: usize) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max.0[axis] - self.min.0[axis] + 1) as usize
        }
    }

    pub fn sizes(&self) -> [usize; DIM] {
        std::array::from_fn(|d| self.size(d))
    }

    /// Total number of voxels.
    pub fn volume(&self) -> usize {
        self.sizes().iter().product()
    }

    pub fn contains(&self, p: Point) -> bool {
        (0..DIM).all(|d| self.min.0[d] <= p.0[d] && p.0[d] <= self.max.0[d])
    }

    /// True when every voxel of `other` lies inside `self`.
    /// The empty region is contained in everything.
    pub fn contains_region(&self, other: &Region) -> bool {
        other.is_empty() || (self.contains(other.min) && self.contains(other.max))
    }

    pub fn intersect(&self, other: &Region) -> Region {
        if self.is_empty() || other.is_empty() {
            return Region::empty();
        }
        let r = Region {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        if r.is_empty() {
            Region::empty()
        } else {
            r
        }
    }

    pub fn intersects(&self, other: &Region) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Grow the region: `min + lo`, `max + hi`.
    ///
    /// With a footprint `K`, `expand(K.min(), K.max())` yields every voxel
    /// touched from an origin inside `self`.
    pub fn expand(&self, lo: Point, hi: Point) -> Region {
        if self.is_empty() {
            return Region::empty();
        }
        Region {
            min: self.min + lo,
            max: self.max + hi,
        }
    }

    /// Inverse of [`Region::expand`]; the result may be empty.
    pub fn shrink(&self, lo: Point, hi: Point) -> Region {
        if self.is_empty() {
            return Region::empty();
        }
        let r = Region {
            min: self.min - lo,
            max: self.max - hi,
        };
        if r.is_empty() {
            Region::empty()
        } else {
            r
        }
    }

    /// Translate by an offset.
    pub fn translate(&self, offset: Point) -> Region {
        if self.is_empty() {
            return Region::empty();
        }
        Region {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Mirror through the origin (`[-max, -min]`).
    pub fn reflect(&self) -> Region {
        if self.is_empty() {
            return Region::empty();
        }
        Region {
            min: -self.max,
            max: -self.min,
        }
    }

    /// Copy with a replaced `[lo, hi]` range on one axis.
    pub fn with_axis(&self, axis: usize, lo: i64, hi: i64) -> Region {
        let mut r = *self;
        r.min.0[axis] = lo;
        r.max.0[axis] = hi;
        r
    }

    /// Iterate all points in memory order (x fastest).
    pub fn points(&self) -> RegionPoints {
        RegionPoints {
            region: *self,
            next: if self.is_empty() { None } else { Some(self.min) },
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{} .. {}]", self.min, self.max)
        }
    }
}

/// Iterator over the points of a region.
#[derive(Debug, Clone)]
pub struct RegionPoints {
    region: Region,
    next: Option<Point>,
}

impl Iterator for RegionPoints {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        let current = self.next?;
        let mut p = current;
        let mut axis = 0;
        self.next = loop {
            if axis == DIM {
                break None;
            }
            if p.0[axis] < self.region.max.0[axis] {
                p.0[axis] += 1;
                break Some(p);
            }
            p.0[axis] = self.region.min.0[axis];
            axis += 1;
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(1, 2, 3);
        let b = Point::new(-1, 4, 0);
        assert_eq!(a + b, Point::new(0, 6, 3));
        assert_eq!(a - b, Point::new(2, -2, 3));
        assert_eq!(-a, Point::new(-1, -2, -3));
        assert_eq!(a.dot(&[1, 10, 100]), 321);
    }

    #[test]
    fn test_region_size_and_contains() {
        let r = Region::from_size(Point::new(-1, 0, 0), [3, 2, 1]);
        assert_eq!(r.max(), Point::new(1, 1, 0));
        assert_eq!(r.volume(), 6);
        assert!(r.contains(Point::new(-1, 1, 0)));
        assert!(!r.contains(Point::new(2, 0, 0)));
    }

    #[test]
    fn test_empty_regions_compare_equal() {
        let a = Region::new(Point::new(5, 0, 0), Point::new(4, 3, 3));
        assert!(a.is_empty());
        assert_eq!(a, Region::empty());
        assert_eq!(a.volume(), 0);
        assert_eq!(a.points().count(), 0);
    }

    #[test]
    fn test_intersect_expand_shrink() {
        let a = Region::from_size(Point::zero(), [4, 4, 1]);
        let b = Region::new(Point::new(2, -3, 0), Point::new(9, 1, 0));
        assert_eq!(
            a.intersect(&b),
            Region::new(Point::new(2, 0, 0), Point::new(3, 1, 0))
        );

        let k = Region::centered([1, 1, 0]);
        let grown = a.expand(k.min(), k.max());
        assert_eq!(grown, Region::new(Point::new(-1, -1, 0), Point::new(4, 4, 0)));
        assert_eq!(grown.shrink(k.min(), k.max()), a);
    }

    #[test]
    fn test_points_iterate_x_fastest() {
        let r = Region::from_size(Point::new(1, 1, 0), [2, 2, 1]);
        let pts: Vec<_> = r.points().collect();
        assert_eq!(
            pts,
            vec![
                Point::new(1, 1, 0),
                Point::new(2, 1, 0),
                Point::new(1, 2, 0),
                Point::new(2, 2, 0)
            ]
        );
    }

    #[test]
    fn test_reflect() {
        let r = Region::new(Point::new(-1, 0, 0), Point::new(2, 0, 0));
        assert_eq!(r.reflect(), Region::new(Point::new(-2, 0, 0), Point::new(1, 0, 0)));
    }
}
