//! Binary morphology by structuring-element stamping.
//!
//! Dilation marks the object's boundary voxels (foreground voxels with a
//! non-foreground face neighbour; outside the domain counts as background),
//! then stamps the structuring element at each marked voxel. Marking goes
//! through the safe/unsafe split so only border slabs check coordinates.
//!
//! Erosion is computed by duality: the complement of the dilation of the
//! background by the reflected element.

use super::ImageFilter;
use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::{Point, Region, DIM};
use crate::core::image::Image;
use crate::core::scalar::Scalar;
use crate::iter::{Connectivity, NeighborIndexIter, NeighborPointIter, WindowIndexIter, WindowPointIter};
use crate::kernel::StructuringElement;
use crate::region::partition;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyOp {
    Dilate,
    Erode,
    /// Erosion followed by dilation.
    Open,
    /// Dilation followed by erosion.
    Close,
}

/// Dilation of a binary mask.
fn dilate_mask(mask: &Image<bool>, element: &StructuringElement) -> Image<bool> {
    let domain = *mask.region();
    let dims = if domain.size(DIM - 1) > 1 { 3 } else { 2 };
    let boundary_only = element.is_face_connected();

    let marked: Vec<usize> = if boundary_only {
        boundary_voxels(mask, dims)
    } else {
        (0..mask.len()).filter(|&i| mask.at(i)).collect()
    };

    let mut out = if boundary_only {
        mask.clone()
    } else {
        Image::new(domain, false)
    };
    let offsets = element.offsets();
    for &index in &marked {
        let p = mask.index_to_point(index);
        for &o in offsets {
            let q = p + o;
            if domain.contains(q) {
                let i = out.local_to_index(q);
                out.set_at(i, true);
            }
        }
    }
    debug!(
        "dilation stamped {} of {} voxel(s) with {} offset(s)",
        marked.len(),
        mask.len(),
        offsets.len()
    );
    out
}

/// Indices of foreground voxels with a non-foreground face neighbour.
fn boundary_voxels(mask: &Image<bool>, dims: usize) -> Vec<usize> {
    let domain = *mask.region();
    let offsets = Connectivity::Face.offsets(dims);
    let footprint = Region::centered([1, 1, if dims == 3 { 1 } else { 0 }]);
    let parts = partition(&domain, &domain, &footprint);
    let mut marked = Vec::new();

    if !parts.safe.is_empty() {
        let mut centers = WindowIndexIter::for_image(&parts.safe, mask);
        centers.restart_at(mask, Point::zero());
        let mut neighbors = NeighborIndexIter::for_image(&offsets, mask);
        for center in centers {
            if !mask.at(center as usize) {
                continue;
            }
            neighbors.restart(center);
            if neighbors.by_ref().any(|n| !mask.at(n as usize)) {
                marked.push(center as usize);
            }
        }
    }

    let mut neighbors = NeighborPointIter::for_image(&offsets, mask);
    for slab in &parts.unsafe_regions {
        let mut centers = WindowPointIter::for_image(slab, mask);
        centers.restart_at(mask, Point::zero());
        for center in centers {
            if !mask.at(center.offset as usize) {
                continue;
            }
            neighbors.restart(center.point, center.offset);
            if neighbors
                .by_ref()
                .any(|n| !domain.contains(n.point) || !mask.at(n.offset as usize))
            {
                marked.push(center.offset as usize);
            }
        }
    }
    marked
}

fn complement(mask: &Image<bool>) -> Image<bool> {
    mask.map(|v| !v)
}

fn erode_mask(mask: &Image<bool>, element: &StructuringElement) -> Image<bool> {
    complement(&dilate_mask(&complement(mask), &element.reflect()))
}

/// Binary dilation, erosion, opening and closing.
///
/// Input voxels equal to the foreground value form the object. The output is
/// binary: foreground value on the result set, background value elsewhere.
pub struct BinaryMorphologyFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    element: Option<StructuringElement>,
    op: MorphologyOp,
    foreground: T,
    background: T,
    output: Option<Image<T>>,
}

impl<T: Scalar> Default for BinaryMorphologyFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> BinaryMorphologyFilter<T> {
    /// Dilation with foreground `1` and background `0`.
    pub fn new() -> Self {
        Self {
            input: None,
            element: None,
            op: MorphologyOp::Dilate,
            foreground: T::from_f64(1.0),
            background: T::default(),
            output: None,
        }
    }

    pub fn input(mut self, image: Arc<Image<T>>) -> Self {
        self.input = Some(image);
        self
    }

    pub fn element(mut self, element: StructuringElement) -> Self {
        self.element = Some(element);
        self
    }

    pub fn operation(mut self, op: MorphologyOp) -> Self {
        self.op = op;
        self
    }

    pub fn foreground_value(mut self, value: T) -> Self {
        self.foreground = value;
        self
    }

    pub fn background_value(mut self, value: T) -> Self {
        self.background = value;
        self
    }

    pub fn into_output(self) -> Option<Image<T>> {
        self.output
    }
}

impl<T: Scalar> ImageFilter for BinaryMorphologyFilter<T> {
    type Output = Image<T>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        let element = self.element.as_ref().ok_or(FilterError::MissingInput("element"))?;
        if self.foreground == self.background {
            return Err(FilterError::invalid(
                "foreground_value",
                "foreground and background values are equal",
            ));
        }

        let fg = self.foreground;
        let mask = input.map(|&v| v == fg);
        let result = match self.op {
            MorphologyOp::Dilate => dilate_mask(&mask, element),
            MorphologyOp::Erode => erode_mask(&mask, element),
            MorphologyOp::Open => dilate_mask(&erode_mask(&mask, element), element),
            MorphologyOp::Close => erode_mask(&dilate_mask(&mask, element), element),
        };
        debug!("binary {:?} over {}", self.op, input.region());

        let bg = self.background;
        self.output = Some(result.map(|&v| if v { fg } else { bg }));
        Ok(())
    }

    fn output(&self) -> Option<&Image<T>> {
        self.output.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[&str]) -> Arc<Image<u8>> {
        let h = rows.len();
        let w = rows[0].len();
        Arc::new(Image::from_fn(Region::from_size(Point::zero(), [w, h, 1]), |p| {
            u8::from(rows[p.y() as usize].as_bytes()[p.x() as usize] == b'#')
        }))
    }

    fn to_rows(image: &Image<u8>) -> Vec<String> {
        let [w, h, _] = image.region().sizes();
        (0..h)
            .map(|y| {
                (0..w)
                    .map(|x| if image.get(Point::new(x as i64, y as i64, 0)) == Some(1) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    fn run(image: Arc<Image<u8>>, element: StructuringElement, op: MorphologyOp) -> Vec<String> {
        let mut f = BinaryMorphologyFilter::new().input(image).element(element).operation(op);
        f.update().unwrap();
        to_rows(f.output().unwrap())
    }

    /// Reference dilation straight from the definition.
    fn brute_dilate(mask: &Image<bool>, element: &StructuringElement) -> Image<bool> {
        let domain = *mask.region();
        Image::from_fn(domain, |p| {
            element.offsets().iter().any(|&o| mask.get(p - o) == Some(true))
        })
    }

    #[test]
    fn test_dilate_cross() {
        let image = from_rows(&[".....", ".....", "..#..", ".....", "....."]);
        let cross = StructuringElement::from_connectivity(Connectivity::Face, 2);
        assert_eq!(
            run(image, cross, MorphologyOp::Dilate),
            vec![".....", "..#..", ".###.", "..#..", "....."]
        );
    }

    #[test]
    fn test_dilate_clips_at_domain_edge() {
        let image = from_rows(&["#...", "....", "...."]);
        let square = StructuringElement::box_shape([1, 1, 0]);
        assert_eq!(run(image, square, MorphologyOp::Dilate), vec!["##..", "##..", "...."]);
    }

    #[test]
    fn test_erode_square() {
        let image = from_rows(&["......", ".####.", ".####.", ".####.", "......"]);
        let square = StructuringElement::box_shape([1, 1, 0]);
        assert_eq!(
            run(image, square, MorphologyOp::Erode),
            vec!["......", "......", "..##..", "......", "......"]
        );
    }

    #[test]
    fn test_erode_keeps_objects_touching_the_edge() {
        let image = from_rows(&["###", "###", "###"]);
        let square = StructuringElement::box_shape([1, 1, 0]);
        assert_eq!(run(image, square, MorphologyOp::Erode), vec!["###", "###", "###"]);
    }

    #[test]
    fn test_erode_with_asymmetric_element() {
        // x survives iff x and x + (1, 0) are both foreground
        let image = from_rows(&[".###..", "..##.#"]);
        let pair = StructuringElement::from_offsets([Point::zero(), Point::new(1, 0, 0)]).unwrap();
        assert_eq!(run(image, pair, MorphologyOp::Erode), vec![".##...", "..#..#"]);
    }

    #[test]
    fn test_open_removes_speck_and_close_fills_hole() {
        let square = StructuringElement::box_shape([1, 1, 0]);
        let speck = from_rows(&[".....", ".....", "..#..", ".....", "....."]);
        assert!(run(speck, square.clone(), MorphologyOp::Open)
            .iter()
            .all(|r| !r.contains('#')));

        let holed = from_rows(&[".......", ".......", "..###..", "..#.#..", "..###..", ".......", "......."]);
        assert_eq!(
            run(holed, square, MorphologyOp::Close),
            vec![".......", ".......", "..###..", "..###..", "..###..", ".......", "......."]
        );
    }

    #[test]
    fn test_boundary_stamping_matches_definition() {
        let image = from_rows(&["........", ".###....", ".#.##...", ".####.#.", "......#.", "........"]);
        let mask = image.map(|&v| v == 1);
        for element in [
            StructuringElement::box_shape([1, 2, 0]),
            StructuringElement::ball(2, 2),
            StructuringElement::from_offsets([Point::zero(), Point::new(3, 0, 0), Point::new(0, -2, 0)]).unwrap(),
        ] {
            assert_eq!(dilate_mask(&mask, &element), brute_dilate(&mask, &element));
        }
    }

    #[test]
    fn test_3d_dilation() {
        let mut mask = Image::new(Region::from_size(Point::zero(), [5, 5, 5]), false);
        mask.set(Point::new(2, 2, 2), true).unwrap();
        let ball = StructuringElement::ball(1, 3);
        let out = dilate_mask(&mask, &ball);
        assert_eq!(out.data().iter().filter(|&&v| v).count(), 7);
        assert_eq!(out, brute_dilate(&mask, &ball));
    }

    #[test]
    fn test_custom_values_and_errors() {
        let image = Arc::new(Image::from_vec(Region::from_size(Point::zero(), [4, 1, 1]), vec![0u8, 255, 0, 0]).unwrap());
        let mut f = BinaryMorphologyFilter::new()
            .input(image.clone())
            .element(StructuringElement::box_shape([1, 0, 0]))
            .foreground_value(255);
        f.update().unwrap();
        assert_eq!(f.output().unwrap().data(), &[255, 255, 255, 0]);

        let mut f = BinaryMorphologyFilter::new().input(image.clone());
        assert_eq!(f.update(), Err(FilterError::MissingInput("element")));

        let mut f = BinaryMorphologyFilter::new()
            .input(image)
            .element(StructuringElement::box_shape([1, 0, 0]))
            .foreground_value(0)
            .background_value(0);
        assert!(f.update().is_err());
    }
}
