//! Graph node wrapping a stateful point filter.

use super::{CodNode, RegionInfo};
use crate::core::geometry::Point;
use crate::point::PointFilter;
use parking_lot::Mutex;

/// Node over a stateful point filter.
///
/// The filter and its memo sit behind a mutex, so the node can be shared
/// between graph parents. Values are keyed on the supplied point and index.
pub struct PointFilterNode<F> {
    filter: Mutex<F>,
    info: RegionInfo,
}

impl<F: PointFilter> PointFilterNode<F> {
    pub fn new(filter: F) -> Self {
        let info = filter.region_info();
        Self {
            filter: Mutex::new(filter),
            info,
        }
    }

    pub fn into_inner(self) -> F {
        self.filter.into_inner()
    }
}

impl<F> CodNode<F::Output> for PointFilterNode<F>
where
    F: PointFilter,
    F::Output: Send + Sync,
{
    fn get(&self, point: Point, index: usize) -> F::Output {
        self.filter.lock().evaluate(point, index)
    }

    fn region_info(&self) -> &RegionInfo {
        &self.info
    }
}
