//! Iterators over arbitrary offset lists (structuring elements, connectivity).

use super::Position;
use crate::core::geometry::{Point, DIM};
use crate::core::image::Image;

/// Index-only traversal of a fixed offset list.
#[derive(Debug, Clone)]
pub struct NeighborIndexIter {
    deltas: Vec<i64>,
    base: i64,
    pos: usize,
}

impl NeighborIndexIter {
    pub fn new(offsets: &[Point], strides: &[i64; DIM]) -> Self {
        Self {
            deltas: offsets.iter().map(|o| o.dot(strides)).collect(),
            base: 0,
            pos: offsets.len(),
        }
    }

    pub fn for_image<T>(offsets: &[Point], image: &Image<T>) -> Self {
        Self::new(offsets, image.strides())
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Begin a traversal around the origin with linear offset `origin`.
    #[inline]
    pub fn restart(&mut self, origin: i64) {
        self.base = origin;
        self.pos = 0;
    }
}

impl Iterator for NeighborIndexIter {
    type Item = i64;

    #[inline]
    fn next(&mut self) -> Option<i64> {
        let delta = self.deltas.get(self.pos)?;
        self.pos += 1;
        Some(self.base + delta)
    }
}

/// Offset-list traversal that also yields coordinates.
#[derive(Debug, Clone)]
pub struct NeighborPointIter {
    offsets: Vec<Point>,
    deltas: Vec<i64>,
    origin: Position,
    pos: usize,
}

impl NeighborPointIter {
    pub fn new(offsets: &[Point], strides: &[i64; DIM]) -> Self {
        Self {
            offsets: offsets.to_vec(),
            deltas: offsets.iter().map(|o| o.dot(strides)).collect(),
            origin: Position::default(),
            pos: offsets.len(),
        }
    }

    pub fn for_image<T>(offsets: &[Point], image: &Image<T>) -> Self {
        Self::new(offsets, image.strides())
    }

    pub fn offsets(&self) -> &[Point] {
        &self.offsets
    }

    #[inline]
    pub fn restart(&mut self, origin: Point, offset: i64) {
        self.origin = Position {
            point: origin,
            offset,
        };
        self.pos = 0;
    }

    #[inline]
    pub fn restart_at<T>(&mut self, image: &Image<T>, origin: Point) {
        self.restart(origin, image.offset_of(origin));
    }
}

impl Iterator for NeighborPointIter {
    type Item = Position;

    #[inline]
    fn next(&mut self) -> Option<Position> {
        let offset = self.offsets.get(self.pos)?;
        let delta = self.deltas[self.pos];
        self.pos += 1;
        Some(Position {
            point: self.origin.point + *offset,
            offset: self.origin.offset + delta,
        })
    }
}

/// Standard neighbourhoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Neighbours sharing a face: 4 in 2-D, 6 in 3-D.
    Face,
    /// Face and edge neighbours: 8 in 2-D, 18 in 3-D.
    FaceEdge,
    /// Every neighbour in the unit box: 8 in 2-D, 26 in 3-D.
    Full,
}

impl Connectivity {
    /// Offsets of the neighbourhood in `dims` dimensions (2 or 3), origin
    /// excluded, in memory order.
    pub fn offsets(self, dims: usize) -> Vec<Point> {
        let max_nonzero = match self {
            Connectivity::Face => 1,
            Connectivity::FaceEdge => 2,
            Connectivity::Full => 3,
        };
        let zr = if dims >= 3 { 1 } else { 0 };
        let mut out = Vec::new();
        for z in -zr..=zr {
            for y in -1..=1i64 {
                for x in -1..=1i64 {
                    let nonzero = [x, y, z].iter().filter(|&&c| c != 0).count();
                    if nonzero > 0 && nonzero <= max_nonzero {
                        out.push(Point::new(x, y, z));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Region;

    #[test]
    fn test_connectivity_counts() {
        assert_eq!(Connectivity::Face.offsets(2).len(), 4);
        assert_eq!(Connectivity::FaceEdge.offsets(2).len(), 8);
        assert_eq!(Connectivity::Full.offsets(2).len(), 8);
        assert_eq!(Connectivity::Face.offsets(3).len(), 6);
        assert_eq!(Connectivity::FaceEdge.offsets(3).len(), 18);
        assert_eq!(Connectivity::Full.offsets(3).len(), 26);
    }

    #[test]
    fn test_index_and_point_iters_agree() {
        let img = Image::from_fn(Region::from_size(Point::zero(), [4, 4, 4]), |p| {
            p.x() + 4 * p.y() + 16 * p.z()
        });
        let offsets = Connectivity::Face.offsets(3);
        let origin = Point::new(1, 2, 1);

        let mut by_index = NeighborIndexIter::for_image(&offsets, &img);
        by_index.restart(img.offset_of(origin));
        let mut by_point = NeighborPointIter::for_image(&offsets, &img);
        by_point.restart_at(&img, origin);

        let a: Vec<i64> = by_index.map(|o| img.at(o as usize)).collect();
        let b: Vec<i64> = by_point.map(|pos| img.get(pos.point).unwrap()).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn test_unstarted_iter_is_exhausted() {
        let mut it = NeighborIndexIter::new(&[Point::unit(0)], &[1, 1, 1]);
        assert!(it.next().is_none());
        it.restart(10);
        assert_eq!(it.next(), Some(11));
        assert_eq!(it.next(), None);
    }
}
