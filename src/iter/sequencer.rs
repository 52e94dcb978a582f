//! Odometer stepping shared by the rectangular iterators.

use crate::core::geometry::DIM;

/// Multi-axis counter with precomputed linear-offset carries.
///
/// `carry[d]` is the offset change when axis `d` ticks and every faster axis
/// wraps back to its start. Stepping is a counter increment and one addition.
#[derive(Debug, Clone)]
pub(crate) struct Sequencer {
    spans: [usize; DIM],
    carry: [i64; DIM],
    counters: [usize; DIM],
}

impl Sequencer {
    pub(crate) fn new(spans: [usize; DIM], strides: &[i64; DIM]) -> Self {
        let mut carry = [0i64; DIM];
        let mut rewind = 0i64;
        for d in 0..DIM {
            carry[d] = strides[d] - rewind;
            rewind += (spans[d].saturating_sub(1)) as i64 * strides[d];
        }
        Self {
            spans,
            carry,
            counters: [0; DIM],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.spans.iter().any(|&s| s == 0)
    }

    pub(crate) fn len(&self) -> usize {
        self.spans.iter().product()
    }

    pub(crate) fn reset(&mut self) {
        self.counters = [0; DIM];
    }

    /// Tick the odometer. Returns the axis that advanced, or `None` once the
    /// outermost counter runs past its span.
    #[inline]
    pub(crate) fn advance(&mut self) -> Option<usize> {
        for d in 0..DIM {
            self.counters[d] += 1;
            if self.counters[d] < self.spans[d] {
                return Some(d);
            }
            self.counters[d] = 0;
        }
        None
    }

    #[inline]
    pub(crate) fn carry(&self, axis: usize) -> i64 {
        self.carry[axis]
    }
}
