//! Compute-on-demand operator graphs.
//!
//! A COD node answers "what is my value at this voxel" only when asked. Nodes
//! hold shared references to their operands, so composing nodes is cheap and
//! a sub-graph can feed several parents. Every node carries a [`RegionInfo`]
//! describing where its linear indices are meaningful:
//! - Leaves over images are bounded by the image
//! - Constants are unbounded and combine with anything
//! - Composites inherit the first bounded operand's region
//!
//! Operands are checked for compatibility when a node is built. Once built, a
//! graph never fails during evaluation.

mod adapter;
mod eigen;
mod leaf;
mod ops;

pub use adapter::PointFilterNode;
pub use eigen::{EigenvalueNode, EigenvectorNode};
pub use leaf::{ConstantNode, DeferredImageNode, ImageNode};
pub use ops::{BinaryNode, BinaryOp, ParamUnaryNode, ParamUnaryOp, QuantizeNode, TernaryNode, UnaryNode, UnaryOp};

use crate::core::error::{CodError, CodResult};
use crate::core::geometry::{Point, Region};
use crate::core::image::Image;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Region info
// ============================================================================

/// Where a node's linear indices are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionInfo {
    /// Defined everywhere; compatible with any other node.
    Unbounded,
    /// Defined over `region`, whose voxels map to `min_index..=max_index`.
    Bounded {
        min_index: usize,
        max_index: usize,
        region: Region,
    },
}

impl RegionInfo {
    pub fn bounded(min_index: usize, max_index: usize, region: Region) -> Self {
        RegionInfo::Bounded {
            min_index,
            max_index,
            region,
        }
    }

    /// Region info of an image's full layout.
    pub fn of_image<T>(image: &Image<T>) -> Self {
        RegionInfo::bounded(0, image.len().saturating_sub(1), *image.region())
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, RegionInfo::Unbounded)
    }

    /// The bounded region, if any.
    pub fn region(&self) -> Option<&Region> {
        match self {
            RegionInfo::Unbounded => None,
            RegionInfo::Bounded { region, .. } => Some(region),
        }
    }

    /// Either side unbounded, or identical index range and region.
    pub fn compatible(&self, other: &RegionInfo) -> bool {
        self.is_unbounded() || other.is_unbounded() || self == other
    }

    /// The first bounded info in `infos`, or `Unbounded`.
    pub fn first_bounded<'a>(infos: impl IntoIterator<Item = &'a RegionInfo>) -> RegionInfo {
        infos
            .into_iter()
            .find(|info| !info.is_unbounded())
            .copied()
            .unwrap_or(RegionInfo::Unbounded)
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionInfo::Unbounded => write!(f, "unbounded"),
            RegionInfo::Bounded {
                min_index,
                max_index,
                region,
            } => write!(f, "index {min_index}..={max_index} over {region}"),
        }
    }
}

/// Fail with [`CodError::Incompatible`] unless the two infos are compatible.
pub fn ensure_compatible(left: &RegionInfo, right: &RegionInfo) -> CodResult<()> {
    if left.compatible(right) {
        Ok(())
    } else {
        log::debug!("rejecting incompatible operands: {left} vs {right}");
        Err(CodError::Incompatible {
            left: *left,
            right: *right,
        })
    }
}

// ============================================================================
// Node trait
// ============================================================================

/// A lazily evaluated value source.
///
/// `get` takes both the coordinate and the linear index of the queried voxel;
/// index-addressable nodes read by index, point filters by coordinate.
pub trait CodNode<T>: Send + Sync {
    /// Value at `point`, whose linear index in the graph's layout is `index`.
    fn get(&self, point: Point, index: usize) -> T;

    fn region_info(&self) -> &RegionInfo;

    fn is_unbounded(&self) -> bool {
        self.region_info().is_unbounded()
    }

    /// True when the value depends on `index` alone.
    fn referable_via_index(&self) -> bool {
        false
    }

    /// Run any deferred work. Composite nodes forward to their operands.
    fn prepare(&self) -> CodResult<()> {
        Ok(())
    }
}

/// Shared handle to a node.
pub type CodRef<T> = Arc<dyn CodNode<T>>;

/// Conversion into a node handle.
pub trait IntoCodNode<T> {
    fn into_cod_node(self) -> CodRef<T>;
}

impl<T: Copy + Send + Sync + 'static> IntoCodNode<T> for Image<T> {
    fn into_cod_node(self) -> CodRef<T> {
        Arc::new(ImageNode::new(Arc::new(self)))
    }
}

impl<T: Copy + Send + Sync + 'static> IntoCodNode<T> for Arc<Image<T>> {
    fn into_cod_node(self) -> CodRef<T> {
        Arc::new(ImageNode::new(self))
    }
}

impl<T> IntoCodNode<T> for CodRef<T> {
    fn into_cod_node(self) -> CodRef<T> {
        self
    }
}

/// Evaluate a bounded node over its region into a new image.
pub fn materialize<T, N>(node: &N) -> CodResult<Image<T>>
where
    T: Copy,
    N: CodNode<T> + ?Sized,
{
    node.prepare()?;
    let (min_index, max_index, region) = match *node.region_info() {
        RegionInfo::Unbounded => {
            return Err(CodError::InvalidArgument(
                "cannot materialize an unbounded node".to_string(),
            ))
        }
        RegionInfo::Bounded {
            min_index,
            max_index,
            region,
        } => (min_index, max_index, region),
    };
    let count = max_index + 1 - min_index;
    if count != region.volume() {
        return Err(CodError::InvariantViolation(format!(
            "index range {min_index}..={max_index} does not cover {region}"
        )));
    }
    let data = region
        .points()
        .enumerate()
        .map(|(i, p)| node.get(p, min_index + i))
        .collect();
    Image::from_vec(region, data).map_err(|e| CodError::InvariantViolation(e.to_string()))
}
