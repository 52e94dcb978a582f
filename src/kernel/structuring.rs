//! Structuring elements for binary morphology.

use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::{Point, Region};
use crate::core::image::Image;
use crate::iter::Connectivity;

/// A set of offsets, origin included or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    offsets: Vec<Point>,
}

impl StructuringElement {
    /// Build from explicit offsets. Duplicates are removed, order is kept.
    pub fn from_offsets(offsets: impl IntoIterator<Item = Point>) -> FilterResult<Self> {
        let mut out: Vec<Point> = Vec::new();
        for o in offsets {
            if !out.contains(&o) {
                out.push(o);
            }
        }
        if out.is_empty() {
            return Err(FilterError::invalid("structuring_element", "no offsets"));
        }
        Ok(Self { offsets: out })
    }

    /// Every offset of the box `[-r, r]`.
    pub fn box_shape(radius: [i64; 3]) -> Self {
        Self {
            offsets: Region::centered(radius.map(|r| r.max(0))).points().collect(),
        }
    }

    /// Digital ball `x² + y² + z² ≤ r²`; pass `dims = 2` for a disk.
    pub fn ball(radius: i64, dims: usize) -> Self {
        let r = radius.max(0);
        let rz = if dims >= 3 { r } else { 0 };
        let offsets = Region::centered([r, r, rz])
            .points()
            .filter(|p| p.x() * p.x() + p.y() * p.y() + p.z() * p.z() <= r * r)
            .collect();
        Self { offsets }
    }

    /// Origin plus a connectivity neighbourhood.
    pub fn from_connectivity(connectivity: Connectivity, dims: usize) -> Self {
        let mut offsets = vec![Point::zero()];
        offsets.extend(connectivity.offsets(dims));
        Self { offsets }
    }

    /// Offsets of the non-zero voxels of a mask image (mask coordinates are
    /// offsets).
    pub fn from_mask<T: Copy + Default + PartialEq>(mask: &Image<T>) -> FilterResult<Self> {
        let zero = T::default();
        Self::from_offsets(mask.region().points().filter(|&p| mask.get(p) != Some(zero)))
    }

    pub fn offsets(&self) -> &[Point] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Point reflection `o → -o`.
    pub fn reflect(&self) -> Self {
        Self {
            offsets: self.offsets.iter().map(|&o| -o).collect(),
        }
    }

    /// True when the element equals its reflection.
    pub fn is_symmetric(&self) -> bool {
        self.offsets.iter().all(|&o| self.offsets.contains(&-o))
    }

    pub fn contains_origin(&self) -> bool {
        self.offsets.contains(&Point::zero())
    }

    /// True when every offset is reachable from the origin through face
    /// steps inside the element.
    ///
    /// For such elements a dilation only needs to stamp from the object's
    /// boundary voxels.
    pub fn is_face_connected(&self) -> bool {
        if !self.contains_origin() {
            return false;
        }
        let steps = Connectivity::Face.offsets(3);
        let mut seen = vec![false; self.offsets.len()];
        let mut stack = vec![Point::zero()];
        while let Some(p) = stack.pop() {
            for &s in &steps {
                let q = p + s;
                if let Some(i) = self.offsets.iter().position(|&o| o == q) {
                    if !seen[i] {
                        seen[i] = true;
                        stack.push(q);
                    }
                }
            }
            if let Some(i) = self.offsets.iter().position(|&o| o == p) {
                seen[i] = true;
            }
        }
        seen.iter().all(|&v| v)
    }

    /// Bounding box of the offsets.
    pub fn footprint(&self) -> Region {
        let mut it = self.offsets.iter();
        let Some(&first) = it.next() else {
            return Region::empty();
        };
        let (lo, hi) = it.fold((first, first), |(lo, hi), &o| (lo.min(o), hi.max(o)));
        Region::new(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_and_ball() {
        assert_eq!(StructuringElement::box_shape([1, 1, 0]).len(), 9);
        assert_eq!(StructuringElement::ball(1, 2).len(), 5);
        assert_eq!(StructuringElement::ball(1, 3).len(), 7);
        assert_eq!(StructuringElement::ball(2, 2).len(), 13);
    }

    #[test]
    fn test_reflect_and_symmetry() {
        let se = StructuringElement::from_offsets([Point::zero(), Point::new(1, 0, 0), Point::new(2, 1, 0)]).unwrap();
        assert!(!se.is_symmetric());
        let r = se.reflect();
        assert_eq!(r.footprint(), Region::new(Point::new(-2, -1, 0), Point::zero()));
        assert!(StructuringElement::ball(2, 3).is_symmetric());
    }

    #[test]
    fn test_from_mask() {
        let region = Region::centered([1, 1, 0]);
        let mask = Image::from_fn(region, |p| u8::from(p.x() == 0 || p.y() == 0));
        let se = StructuringElement::from_mask(&mask).unwrap();
        assert_eq!(se.len(), 5);
        assert_eq!(se, StructuringElement::from_connectivity(Connectivity::Face, 2).sorted());
    }

    #[test]
    fn test_face_connectivity() {
        assert!(StructuringElement::box_shape([2, 1, 0]).is_face_connected());
        assert!(StructuringElement::ball(2, 3).is_face_connected());
        let gap = StructuringElement::from_offsets([Point::zero(), Point::new(2, 0, 0)]).unwrap();
        assert!(!gap.is_face_connected());
        let shifted = StructuringElement::from_offsets([Point::new(1, 0, 0)]).unwrap();
        assert!(!shifted.contains_origin());
        assert!(!shifted.is_face_connected());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(StructuringElement::from_offsets(Vec::new()).is_err());
    }

    impl StructuringElement {
        fn sorted(mut self) -> Self {
            self.offsets.sort_by_key(|p| (p.z(), p.y(), p.x()));
            self
        }
    }
}
