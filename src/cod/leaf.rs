//! Leaf nodes: images, constants and deferred images.

use super::{CodNode, RegionInfo};
use crate::core::error::{CodError, CodResult};
use crate::core::geometry::{Point, Region};
use crate::core::image::Image;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Leaf over a shared image, addressed by linear index.
#[derive(Debug, Clone)]
pub struct ImageNode<T> {
    image: Arc<Image<T>>,
    info: RegionInfo,
}

impl<T> ImageNode<T> {
    pub fn new(image: Arc<Image<T>>) -> Self {
        let info = RegionInfo::of_image(&image);
        Self { image, info }
    }

    pub fn image(&self) -> &Arc<Image<T>> {
        &self.image
    }
}

impl<T: Copy + Send + Sync> CodNode<T> for ImageNode<T> {
    #[inline]
    fn get(&self, _point: Point, index: usize) -> T {
        self.image.at(index)
    }

    fn region_info(&self) -> &RegionInfo {
        &self.info
    }

    fn referable_via_index(&self) -> bool {
        true
    }
}

/// The same value everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNode<T> {
    value: T,
}

static UNBOUNDED: RegionInfo = RegionInfo::Unbounded;

impl<T> ConstantNode<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Copy + Send + Sync> CodNode<T> for ConstantNode<T> {
    #[inline]
    fn get(&self, _point: Point, _index: usize) -> T {
        self.value
    }

    fn region_info(&self) -> &RegionInfo {
        &UNBOUNDED
    }

    fn referable_via_index(&self) -> bool {
        true
    }
}

type Builder<T> = Box<dyn FnOnce() -> CodResult<Image<T>> + Send>;

/// An image that is produced on first use.
///
/// The node is bounded over a template region fixed at construction, so it can
/// be composed before the image exists. The builder runs once, on the first
/// `prepare()` or `get()`; its result must match the template.
pub struct DeferredImageNode<T> {
    info: RegionInfo,
    template: Region,
    builder: Mutex<Option<Builder<T>>>,
    image: OnceLock<Arc<Image<T>>>,
}

impl<T: Send + Sync> DeferredImageNode<T> {
    pub fn new(template: Region, builder: impl FnOnce() -> CodResult<Image<T>> + Send + 'static) -> Self {
        Self {
            info: RegionInfo::bounded(0, template.volume().saturating_sub(1), template),
            template,
            builder: Mutex::new(Some(Box::new(builder))),
            image: OnceLock::new(),
        }
    }

    /// Deferred image laid out like `like`.
    pub fn like<U>(like: &Image<U>, builder: impl FnOnce() -> CodResult<Image<T>> + Send + 'static) -> Self {
        Self::new(*like.region(), builder)
    }

    pub fn is_built(&self) -> bool {
        self.image.get().is_some()
    }

    /// The built image, running the builder if needed.
    pub fn build(&self) -> CodResult<&Arc<Image<T>>> {
        if let Some(image) = self.image.get() {
            return Ok(image);
        }
        let mut slot = self.builder.lock();
        // another caller may have finished while we waited for the lock
        if let Some(image) = self.image.get() {
            return Ok(image);
        }
        let builder = slot.take().ok_or_else(|| {
            CodError::InvariantViolation("deferred image builder already failed".to_string())
        })?;
        let image = builder()?;
        if *image.region() != self.template || image.len() != self.template.volume() {
            return Err(CodError::InvariantViolation(format!(
                "deferred image over {} ({} voxels) does not match template {}",
                image.region(),
                image.len(),
                self.template
            )));
        }
        log::trace!("deferred image built over {}", self.template);
        Ok(self.image.get_or_init(|| Arc::new(image)))
    }
}

impl<T: Copy + Send + Sync> CodNode<T> for DeferredImageNode<T> {
    /// # Panics
    /// Panics if the image was never prepared and its builder fails. Call
    /// [`CodNode::prepare`] first to get the error instead.
    fn get(&self, _point: Point, index: usize) -> T {
        match self.build() {
            Ok(image) => image.at(index),
            Err(e) => panic!("deferred image unavailable: {e}"),
        }
    }

    fn region_info(&self) -> &RegionInfo {
        &self.info
    }

    fn referable_via_index(&self) -> bool {
        true
    }

    fn prepare(&self) -> CodResult<()> {
        self.build().map(|_| ())
    }
}
