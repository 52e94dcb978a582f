//! Convolution at a single voxel.

use super::{Memo, PointFilter};
use crate::boundary::BoundaryRef;
use crate::cod::RegionInfo;
use crate::core::geometry::{Point, Region};
use crate::core::scalar::Scalar;
use crate::iter::{WindowIndexIter, WindowPointIter};
use crate::kernel::Kernel;
use crate::region::partition;
use std::sync::Arc;

/// Correlates the kernel with the boundary-handled input around one voxel.
///
/// Voxels whose whole window lies inside the image use index-only traversal;
/// others walk coordinates and ask the boundary handler.
#[derive(Clone)]
pub struct ConvolutionPointFilter<T: Copy> {
    source: BoundaryRef<T>,
    kernel: Arc<Kernel>,
    safe: Region,
    first_delta: i64,
    indices: WindowIndexIter,
    points: WindowPointIter,
    memo: Memo<f64>,
}

impl<T: Scalar> ConvolutionPointFilter<T> {
    pub fn new(source: BoundaryRef<T>, kernel: Arc<Kernel>) -> Self {
        let image = source.image();
        let domain = *image.region();
        let footprint = *kernel.footprint();
        let safe = partition(&domain, &domain, &footprint).safe;
        let first_delta = footprint.min().dot(image.strides());
        let indices = WindowIndexIter::for_image(&footprint, image);
        let points = WindowPointIter::for_image(&footprint, image);
        Self {
            source,
            kernel,
            safe,
            first_delta,
            indices,
            points,
            memo: Memo::new(),
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn compute(&mut self, point: Point, index: usize) -> f64 {
        let weights = self.kernel.values();
        let mut acc = 0.0;
        if self.safe.contains(point) {
            let image = self.source.image();
            self.indices.restart(index as i64 + self.first_delta);
            for (offset, w) in self.indices.by_ref().zip(weights) {
                acc += image.at(offset as usize).to_f64() * w;
            }
        } else {
            let first = self.source.image().offset_of(point + self.kernel.footprint().min());
            self.points.restart(point, first);
            for (pos, w) in self.points.by_ref().zip(weights) {
                acc += self.source.get_indexed(pos.point, pos.offset).to_f64() * w;
            }
        }
        acc
    }
}

impl<T: Scalar> PointFilter for ConvolutionPointFilter<T> {
    type Output = f64;

    fn evaluate(&mut self, point: Point, index: usize) -> f64 {
        if let Some(v) = self.memo.lookup(index) {
            return v;
        }
        let v = self.compute(point, index);
        self.memo.store(index, v)
    }

    fn region_info(&self) -> RegionInfo {
        RegionInfo::of_image(self.source.image())
    }
}
