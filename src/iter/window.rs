//! Rectangular window iterators.
//!
//! A window is a box of offsets (for convolution, the kernel region). The
//! iterator is built once per window/layout pair and restarted at every
//! origin, so the per-origin cost is a couple of additions.

use super::sequencer::Sequencer;
use super::Position;
use crate::core::geometry::{Point, Region, DIM};
use crate::core::image::Image;

/// Index-only traversal of a window.
#[derive(Debug, Clone)]
pub struct WindowIndexIter {
    window: Region,
    seq: Sequencer,
    current: Option<i64>,
}

impl WindowIndexIter {
    /// Window over an image with the given stride table.
    pub fn new(window: &Region, strides: &[i64; DIM]) -> Self {
        Self {
            window: *window,
            seq: Sequencer::new(window.sizes(), strides),
            current: None,
        }
    }

    /// Window laid out like `image`.
    pub fn for_image<T>(window: &Region, image: &Image<T>) -> Self {
        Self::new(window, image.strides())
    }

    pub fn window(&self) -> &Region {
        &self.window
    }

    /// Number of positions per traversal.
    pub fn window_len(&self) -> usize {
        self.seq.len()
    }

    /// Begin a traversal whose first position has linear offset `first`
    /// (the offset of `origin + window.min()`).
    #[inline]
    pub fn restart(&mut self, first: i64) {
        self.seq.reset();
        self.current = if self.seq.is_empty() { None } else { Some(first) };
    }

    /// Begin a traversal around `origin` in `image`.
    #[inline]
    pub fn restart_at<T>(&mut self, image: &Image<T>, origin: Point) {
        self.restart(image.offset_of(origin + self.window.min()));
    }
}

impl Iterator for WindowIndexIter {
    type Item = i64;

    #[inline]
    fn next(&mut self) -> Option<i64> {
        let current = self.current?;
        self.current = self.seq.advance().map(|d| current + self.seq.carry(d));
        Some(current)
    }
}

/// Window traversal that also tracks the current coordinate.
#[derive(Debug, Clone)]
pub struct WindowPointIter {
    window: Region,
    seq: Sequencer,
    start: Point,
    current: Option<Position>,
}

impl WindowPointIter {
    pub fn new(window: &Region, strides: &[i64; DIM]) -> Self {
        Self {
            window: *window,
            seq: Sequencer::new(window.sizes(), strides),
            start: Point::zero(),
            current: None,
        }
    }

    pub fn for_image<T>(window: &Region, image: &Image<T>) -> Self {
        Self::new(window, image.strides())
    }

    pub fn window(&self) -> &Region {
        &self.window
    }

    /// Begin a traversal around `origin`; `first` is the linear offset of
    /// `origin + window.min()`.
    #[inline]
    pub fn restart(&mut self, origin: Point, first: i64) {
        self.seq.reset();
        self.start = origin + self.window.min();
        self.current = if self.seq.is_empty() {
            None
        } else {
            Some(Position {
                point: self.start,
                offset: first,
            })
        };
    }

    #[inline]
    pub fn restart_at<T>(&mut self, image: &Image<T>, origin: Point) {
        let first = image.offset_of(origin + self.window.min());
        self.restart(origin, first);
    }
}

impl Iterator for WindowPointIter {
    type Item = Position;

    #[inline]
    fn next(&mut self) -> Option<Position> {
        let current = self.current?;
        self.current = self.seq.advance().map(|d| {
            let mut point = current.point;
            point.0[d] += 1;
            for k in 0..d {
                point.0[k] = self.start.0[k];
            }
            Position {
                point,
                offset: current.offset + self.seq.carry(d),
            }
        });
        Some(current)
    }
}
