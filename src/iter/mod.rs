//! Window and neighbour iterators.
//!
//! Two families share the same contract: build once for a layout, then
//! `restart` at each origin and pull positions until exhaustion. The
//! index-only variants yield linear offsets; the point variants also carry the
//! coordinate, which boundary handlers need outside the domain.

mod neighbor;
mod sequencer;
mod window;

pub use neighbor::{Connectivity, NeighborIndexIter, NeighborPointIter};
pub use window::{WindowIndexIter, WindowPointIter};

use crate::boundary::Cursor;
use crate::core::geometry::Point;

/// A coordinate together with its signed linear offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub point: Point,
    pub offset: i64,
}

impl Cursor for Position {
    fn point(&self) -> Point {
        self.point
    }

    fn offset(&self) -> i64 {
        self.offset
    }
}
