//! Safe/unsafe region partitioning.
//!
//! Given a requested region `R`, a domain `F` and an access footprint `K`
//! (the box of offsets an operation reads around each origin), split `R` into
//! a safe region `S` where every `p + o` with `o ∈ K` lies in `F`, and a
//! disjoint list of unsafe slabs covering `R − S`. Traversals skip bounds
//! checks on `S` and pay for boundary handling only on the slabs.

use crate::core::geometry::{Region, DIM};
use serde::{Deserialize, Serialize};

/// Result of [`partition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Bounds-check-free part of the request (possibly empty).
    pub safe: Region,
    /// Disjoint slabs covering the rest of the request, outermost axis first.
    pub unsafe_regions: Vec<Region>,
}

impl Partition {
    /// Total voxels in the unsafe slabs.
    pub fn unsafe_volume(&self) -> usize {
        self.unsafe_regions.iter().map(Region::volume).sum()
    }

    /// True when the whole request needs boundary handling.
    pub fn is_all_unsafe(&self) -> bool {
        self.safe.is_empty()
    }
}

/// Split `requested` against `domain` for the offsets in `footprint`.
pub fn partition(requested: &Region, domain: &Region, footprint: &Region) -> Partition {
    if requested.is_empty() {
        return Partition {
            safe: Region::empty(),
            unsafe_regions: Vec::new(),
        };
    }

    let too_wide = footprint.is_empty()
        || domain.is_empty()
        || (0..DIM).any(|d| footprint.size(d) > domain.size(d));
    if too_wide {
        return Partition {
            safe: Region::empty(),
            unsafe_regions: vec![*requested],
        };
    }

    let touched = requested.expand(footprint.min(), footprint.max());
    let safe = touched
        .intersect(domain)
        .shrink(footprint.min(), footprint.max())
        .intersect(requested);

    let unsafe_regions = subtract(requested, &safe);
    log::trace!(
        "partition {} in {} by {}: safe {}, {} unsafe slab(s)",
        requested,
        domain,
        footprint,
        safe,
        unsafe_regions.len()
    );

    Partition {
        safe,
        unsafe_regions,
    }
}

/// Box-minus-box: disjoint slabs covering `outer − inner`.
///
/// Slabs are peeled off from the outermost axis inwards, so each slab is as
/// long as possible along the fastest axis.
pub fn subtract(outer: &Region, inner: &Region) -> Vec<Region> {
    if outer.is_empty() {
        return Vec::new();
    }
    let inner = outer.intersect(inner);
    if inner.is_empty() {
        return vec![*outer];
    }

    let mut slabs = Vec::with_capacity(2 * DIM);
    let mut rest = *outer;
    for d in (0..DIM).rev() {
        let (lo, hi) = (rest.min()[d], rest.max()[d]);
        let (in_lo, in_hi) = (inner.min()[d], inner.max()[d]);
        if lo < in_lo {
            slabs.push(rest.with_axis(d, lo, in_lo - 1));
        }
        if in_hi < hi {
            slabs.push(rest.with_axis(d, in_hi + 1, hi));
        }
        rest = rest.with_axis(d, in_lo, in_hi);
    }
    slabs
}
