//! Region-partitioned convolution.

use super::{resolve_region, ImageFilter};
use crate::boundary::BoundaryRef;
use crate::core::config::CodConfig;
use crate::core::error::{FilterError, FilterResult};
use crate::core::geometry::{Point, Region};
use crate::core::image::Image;
use crate::core::scalar::Scalar;
use crate::iter::{WindowIndexIter, WindowPointIter};
use crate::kernel::Kernel;
use crate::region::{partition, Partition};
use log::{debug, warn};
use std::sync::Arc;

/// Convolve `requested` (inside the source domain) into `out`.
///
/// `out` must share the source image's layout. With `safe_path` the
/// partition's safe region is traversed by index only; otherwise every voxel
/// goes through the boundary handler. Both paths accumulate in the same order,
/// so their results are bit-identical.
pub(crate) fn convolve_into<T: Scalar, U: Scalar>(
    source: &BoundaryRef<T>,
    kernel: &Kernel,
    requested: &Region,
    safe_path: bool,
    out: &mut Image<U>,
) -> Partition {
    let image = source.image();
    let domain = *image.region();
    let footprint = *kernel.footprint();
    let weights = kernel.values();
    let first_delta = footprint.min().dot(image.strides());

    let parts = if safe_path {
        partition(requested, &domain, &footprint)
    } else {
        Partition {
            safe: Region::empty(),
            unsafe_regions: if requested.is_empty() { Vec::new() } else { vec![*requested] },
        }
    };

    if !parts.safe.is_empty() {
        // centre indices and window indices advance in lockstep
        let mut centers = WindowIndexIter::for_image(&parts.safe, image);
        centers.restart_at(image, Point::zero());
        let mut window = WindowIndexIter::for_image(&footprint, image);
        let data = image.data();
        for center in centers {
            window.restart(center + first_delta);
            let mut acc = 0.0;
            for (offset, w) in window.by_ref().zip(weights) {
                acc += data[offset as usize].to_f64() * w;
            }
            out.set_at(center as usize, U::from_f64(acc));
        }
    }

    let mut window = WindowPointIter::for_image(&footprint, image);
    for slab in &parts.unsafe_regions {
        let mut centers = WindowPointIter::for_image(slab, image);
        centers.restart_at(image, Point::zero());
        for center in centers {
            window.restart(center.point, center.offset + first_delta);
            let mut acc = 0.0;
            for (pos, w) in window.by_ref().zip(weights) {
                acc += source.get_at(&pos).to_f64() * w;
            }
            out.set_at(center.offset as usize, U::from_f64(acc));
        }
    }

    parts
}

/// Convolution of an image with an arbitrary kernel.
///
/// # Example
///
/// ```
/// use codimg::prelude::*;
/// use std::sync::Arc;
///
/// let image = Arc::new(Image::new(Region::from_size(Point::zero(), [5, 5, 1]), 10.0f64));
/// let mut filter = ConvolutionFilter::new()
///     .input(image)
///     .kernel(Kernel::mean([1, 1, 0]));
/// filter.update().unwrap();
/// assert!(filter.output().unwrap().data().iter().all(|&v| (v - 10.0).abs() < 1e-12));
/// ```
pub struct ConvolutionFilter<T: Scalar> {
    input: Option<Arc<Image<T>>>,
    kernel: Option<Arc<Kernel>>,
    boundary: Option<BoundaryRef<T>>,
    process_region: Option<Region>,
    config: CodConfig,
    partition: Option<Partition>,
    output: Option<Image<T>>,
}

impl<T: Scalar> Default for ConvolutionFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ConvolutionFilter<T> {
    pub fn new() -> Self {
        Self {
            input: None,
            kernel: None,
            boundary: None,
            process_region: None,
            config: CodConfig::default(),
            partition: None,
            output: None,
        }
    }

    pub fn input(mut self, image: Arc<Image<T>>) -> Self {
        self.input = Some(image);
        self
    }

    pub fn kernel(mut self, kernel: impl Into<Arc<Kernel>>) -> Self {
        self.kernel = Some(kernel.into());
        self
    }

    /// Boundary handler; it must wrap the input image. Defaults to the
    /// configured policy.
    pub fn boundary(mut self, boundary: BoundaryRef<T>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Restrict processing; voxels outside are copied from the input.
    pub fn process_region(mut self, region: Region) -> Self {
        self.process_region = Some(region);
        self
    }

    pub fn with_config(mut self, config: CodConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle the index-only traversal of the safe region.
    pub fn with_safe_path(mut self, enabled: bool) -> Self {
        self.config.convolution.safe_path = enabled;
        self
    }

    /// Partition used by the last successful update.
    pub fn last_partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    pub fn into_output(self) -> Option<Image<T>> {
        self.output
    }
}

impl<T: Scalar> ImageFilter for ConvolutionFilter<T> {
    type Output = Image<T>;

    fn update(&mut self) -> FilterResult<()> {
        self.output = None;
        self.partition = None;
        let input = self.input.clone().ok_or(FilterError::MissingInput("input"))?;
        let kernel = self.kernel.clone().ok_or(FilterError::MissingInput("kernel"))?;
        let source = match &self.boundary {
            Some(b) if std::ptr::eq(b.image(), input.as_ref()) => b.clone(),
            Some(_) => {
                return Err(FilterError::invalid("boundary", "handler wraps a different image"));
            }
            None => self.config.boundary.handler_for(input.clone()),
        };

        let requested = resolve_region(&input, self.process_region.as_ref());
        let mut out = (*input).clone();
        let parts = convolve_into(
            &source,
            &kernel,
            &requested,
            self.config.convolution.safe_path,
            &mut out,
        );

        if parts.is_all_unsafe() && self.config.convolution.safe_path && !requested.is_empty() {
            warn!(
                "kernel footprint {} leaves no safe voxels in {}",
                kernel.footprint(),
                requested
            );
        }
        debug!(
            "convolution over {}: safe {}, {} unsafe voxel(s) in {} slab(s)",
            requested,
            parts.safe,
            parts.unsafe_volume(),
            parts.unsafe_regions.len()
        );

        self.partition = Some(parts);
        self.output = Some(out);
        Ok(())
    }

    fn output(&self) -> Option<&Image<T>> {
        self.output.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryPolicy, FixedValueBoundary, MirrorBoundary, ZeroFluxBoundary};
    use proptest::prelude::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn noise(size: [usize; 3], seed: u64) -> Arc<Image<f64>> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        Arc::new(Image::from_fn(Region::from_size(Point::zero(), size), |_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 1000) as f64 / 7.0
        }))
    }

    #[test]
    fn test_constant_image_mean_zero_flux() {
        init_logger();
        let image = Arc::new(Image::new(Region::from_size(Point::zero(), [5, 5, 1]), 10.0f64));
        let mut filter = ConvolutionFilter::new()
            .input(image.clone())
            .kernel(Kernel::mean([1, 1, 0]))
            .boundary(Arc::new(ZeroFluxBoundary::new(image)));
        filter.update().unwrap();
        let out = filter.output().unwrap();
        assert!(out.data().iter().all(|&v| (v - 10.0).abs() < 1e-12));

        let parts = filter.last_partition().unwrap();
        assert_eq!(parts.safe, Region::new(Point::new(1, 1, 0), Point::new(3, 3, 0)));
        assert_eq!(parts.unsafe_volume(), 16);
    }

    #[test]
    fn test_safe_and_generic_paths_identical() {
        init_logger();
        let image = noise([9, 7, 4], 3);
        let kernel = Arc::new(Kernel::gaussian(0, 1.0, 3.0).unwrap().outer(&Kernel::mean([1, 1, 1])));
        let run = |safe: bool| {
            let mut f = ConvolutionFilter::new()
                .input(image.clone())
                .kernel(kernel.clone())
                .boundary(Arc::new(MirrorBoundary::new(image.clone())))
                .with_safe_path(safe);
            f.update().unwrap();
            f.into_output().unwrap()
        };
        let fast = run(true);
        let slow = run(false);
        for (a, b) in fast.data().iter().zip(slow.data()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_process_region_copies_outside() {
        let image = noise([6, 6, 1], 9);
        let region = Region::new(Point::new(2, 2, 0), Point::new(3, 3, 0));
        let mut f = ConvolutionFilter::new()
            .input(image.clone())
            .kernel(Kernel::mean([1, 1, 0]))
            .process_region(region);
        f.update().unwrap();
        let out = f.output().unwrap();
        for p in image.region().points() {
            if !region.contains(p) {
                assert_eq!(out.get(p), image.get(p));
            }
        }
        let center = Point::new(2, 2, 0);
        let expected: f64 = Region::centered([1, 1, 0])
            .points()
            .map(|o| image.get(center + o).unwrap())
            .sum::<f64>()
            / 9.0;
        assert!((out.get(center).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_value_from_config() {
        let image = Arc::new(Image::new(Region::from_size(Point::zero(), [3, 1, 1]), 6u8));
        let config = CodConfig::new().with_boundary_policy(BoundaryPolicy::FixedValue(0.0));
        let mut f = ConvolutionFilter::new()
            .input(image)
            .kernel(Kernel::line(0, &[1.0, 1.0, 1.0], 1).unwrap())
            .with_config(config);
        f.update().unwrap();
        assert_eq!(f.output().unwrap().data(), &[12, 18, 12]);
    }

    #[test]
    fn test_wide_kernel_is_all_unsafe() {
        init_logger();
        let image = noise([3, 3, 1], 1);
        let mut f = ConvolutionFilter::new()
            .input(image.clone())
            .kernel(Kernel::mean([2, 0, 0]))
            .boundary(Arc::new(FixedValueBoundary::new(image, 0.0)));
        f.update().unwrap();
        assert!(f.last_partition().unwrap().is_all_unsafe());
    }

    #[test]
    fn test_missing_inputs_and_foreign_boundary() {
        let mut f: ConvolutionFilter<f64> = ConvolutionFilter::new().kernel(Kernel::mean([1, 0, 0]));
        assert_eq!(f.update(), Err(FilterError::MissingInput("input")));
        assert!(f.output().is_none());

        let mut f = ConvolutionFilter::new().input(noise([3, 3, 1], 2));
        assert_eq!(f.update(), Err(FilterError::MissingInput("kernel")));

        let other = noise([3, 3, 1], 2);
        let mut f = ConvolutionFilter::new()
            .input(noise([3, 3, 1], 2))
            .kernel(Kernel::mean([1, 0, 0]))
            .boundary(Arc::new(ZeroFluxBoundary::new(other)));
        assert!(matches!(f.update(), Err(FilterError::InvalidParameter { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_paths_agree_for_any_region(
            sx in 1usize..8, sy in 1usize..8, sz in 1usize..3,
            rx in 0i64..3, ry in 0i64..3,
            seed in any::<u64>(),
        ) {
            let image = noise([sx, sy, sz], seed);
            let kernel = Arc::new(Kernel::mean([rx, ry, 0]));
            let run = |safe: bool| {
                let mut f = ConvolutionFilter::new()
                    .input(image.clone())
                    .kernel(kernel.clone())
                    .with_safe_path(safe);
                f.update().unwrap();
                f.into_output().unwrap()
            };
            prop_assert_eq!(run(true), run(false));
        }
    }
}
