//! Extraction of eigenvalues and eigenvector components.

use super::{CodNode, CodRef, IntoCodNode, RegionInfo};
use crate::core::error::{CodError, CodResult};
use crate::core::geometry::Point;
use crate::point::EigenSystem;

fn check_rank(what: &str, rank: usize) -> CodResult<()> {
    if rank >= 3 {
        return Err(CodError::InvalidArgument(format!("{what} {rank} out of range 0..3")));
    }
    Ok(())
}

/// One component of one eigenvector.
pub struct EigenvectorNode {
    source: CodRef<EigenSystem>,
    rank: usize,
    component: usize,
}

impl EigenvectorNode {
    /// `rank` picks the eigenpair (ascending `|λ|`), `component` the axis.
    pub fn new(source: impl IntoCodNode<EigenSystem>, rank: usize, component: usize) -> CodResult<Self> {
        check_rank("eigenvector rank", rank)?;
        check_rank("component", component)?;
        Ok(Self {
            source: source.into_cod_node(),
            rank,
            component,
        })
    }
}

impl CodNode<f64> for EigenvectorNode {
    fn get(&self, point: Point, index: usize) -> f64 {
        self.source.get(point, index).vectors[self.rank][self.component]
    }

    fn region_info(&self) -> &RegionInfo {
        self.source.region_info()
    }

    fn referable_via_index(&self) -> bool {
        self.source.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.source.prepare()
    }
}

/// One eigenvalue.
pub struct EigenvalueNode {
    source: CodRef<EigenSystem>,
    rank: usize,
}

impl EigenvalueNode {
    pub fn new(source: impl IntoCodNode<EigenSystem>, rank: usize) -> CodResult<Self> {
        check_rank("eigenvalue rank", rank)?;
        Ok(Self {
            source: source.into_cod_node(),
            rank,
        })
    }
}

impl CodNode<f64> for EigenvalueNode {
    fn get(&self, point: Point, index: usize) -> f64 {
        self.source.get(point, index).values[self.rank]
    }

    fn region_info(&self) -> &RegionInfo {
        self.source.region_info()
    }

    fn referable_via_index(&self) -> bool {
        self.source.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.source.prepare()
    }
}
