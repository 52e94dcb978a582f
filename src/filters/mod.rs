//! Whole-image filters.
//!
//! Filters follow a configure → `update()` → `output()` lifecycle:
//! - Builder methods set inputs and parameters
//! - `update()` validates and runs once, failing with a [`FilterError`]
//! - `output()` is `None` until an update succeeds
//!
//! Region-based filters split their work with [`crate::region::partition`]
//! so that only the border slabs pay for boundary handling.
//!
//! [`FilterError`]: crate::core::error::FilterError

mod convolution;
mod derivative;
mod morphology;
mod separable;

pub use convolution::ConvolutionFilter;
pub use derivative::{FiniteDifferenceFilter, HessianEigenFilter};
pub use morphology::{BinaryMorphologyFilter, MorphologyOp};
pub use separable::{GaussianFilter, SeparableConvolutionFilter};

use crate::core::error::FilterResult;
use crate::core::geometry::Region;
use crate::core::image::Image;

/// A single-shot image filter.
pub trait ImageFilter {
    type Output;

    /// Run the filter with the current configuration.
    fn update(&mut self) -> FilterResult<()>;

    /// Result of the last successful update.
    fn output(&self) -> Option<&Self::Output>;
}

/// The process region clipped to the image, or the whole image.
fn resolve_region<T>(image: &Image<T>, process_region: Option<&Region>) -> Region {
    let domain = *image.region();
    match process_region {
        Some(r) => {
            let clipped = r.intersect(&domain);
            if clipped.is_empty() {
                log::warn!("process region {r} does not intersect {domain}");
            }
            clipped
        }
        None => domain,
    }
}
