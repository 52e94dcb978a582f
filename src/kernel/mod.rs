//! Convolution kernels and structuring elements.
//!
//! A [`Kernel`] is an image of weights whose region *is* its footprint: the
//! voxel at offset `o` weighs the input sample at `p + o`. Filters therefore
//! compute a correlation, `Σ input[p + o] · k[o]`; derivative kernels are
//! oriented so that this yields the derivative along the positive axis.

mod structuring;

pub use structuring::StructuringElement;

use crate::core::error::{FilterError, FilterResult, ImageError};
use crate::core::geometry::{Point, Region, DIM};
use crate::core::image::Image;

/// Weights over a box of offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Image<f64>,
}

/// Scheme used by finite-difference kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceScheme {
    #[default]
    Central,
    Forward,
    Backward,
}

fn check_axis(axis: usize) -> FilterResult<()> {
    if axis >= DIM {
        return Err(FilterError::invalid("axis", format!("axis {axis} out of range")));
    }
    Ok(())
}

fn check_sigma(sigma: f64, truncate: f64) -> FilterResult<()> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(FilterError::invalid("sigma", format!("must be positive, got {sigma}")));
    }
    if !(truncate > 0.0) {
        return Err(FilterError::invalid("truncate", format!("must be positive, got {truncate}")));
    }
    Ok(())
}

impl Kernel {
    /// Wrap a weight image. The footprint must be non-empty.
    pub fn from_image(weights: Image<f64>) -> FilterResult<Self> {
        if weights.region().is_empty() {
            return Err(ImageError::EmptyRegion.into());
        }
        Ok(Self { weights })
    }

    /// Weights listed in memory order over `footprint`.
    pub fn new(footprint: Region, values: Vec<f64>) -> FilterResult<Self> {
        Self::from_image(Image::from_vec(footprint, values)?)
    }

    /// Uniform averaging kernel over `[-r, r]` per axis.
    pub fn mean(radius: [i64; DIM]) -> Self {
        let footprint = Region::centered(radius.map(|r| r.max(0)));
        let w = 1.0 / footprint.volume() as f64;
        Self {
            weights: Image::new(footprint, w),
        }
    }

    /// One-dimensional kernel along `axis`; `weights[center]` sits at offset 0.
    pub fn line(axis: usize, weights: &[f64], center: usize) -> FilterResult<Self> {
        check_axis(axis)?;
        if weights.is_empty() || center >= weights.len() {
            return Err(FilterError::invalid(
                "weights",
                format!("{} weights with center {center}", weights.len()),
            ));
        }
        let lo = -(center as i64);
        let hi = (weights.len() - 1 - center) as i64;
        let footprint = Region::single(Point::zero()).with_axis(axis, lo, hi);
        Self::new(footprint, weights.to_vec())
    }

    /// Normalised sampled Gaussian along `axis`, radius `ceil(truncate·σ)`.
    pub fn gaussian(axis: usize, sigma: f64, truncate: f64) -> FilterResult<Self> {
        Self::gaussian_derivative(axis, sigma, 0, truncate)
    }

    /// Sampled Gaussian derivative of order 0, 1 or 2 along `axis`.
    ///
    /// Order 0 sums to one. Order 1 satisfies `Σ o·k(o) = 1` and order 2
    /// satisfies `Σ k(o) = 0`, `Σ o²/2·k(o) = 1`, so the kernels are exact on
    /// linear and quadratic ramps.
    pub fn gaussian_derivative(axis: usize, sigma: f64, order: u32, truncate: f64) -> FilterResult<Self> {
        check_axis(axis)?;
        check_sigma(sigma, truncate)?;
        let radius = (truncate * sigma).ceil().max(1.0) as i64;
        let var = sigma * sigma;
        let g: Vec<f64> = (-radius..=radius)
            .map(|x| (-(x * x) as f64 / (2.0 * var)).exp())
            .collect();
        let offsets: Vec<f64> = (-radius..=radius).map(|x| x as f64).collect();

        let weights: Vec<f64> = match order {
            0 => {
                let sum: f64 = g.iter().sum();
                g.iter().map(|v| v / sum).collect()
            }
            1 => {
                let raw: Vec<f64> = g.iter().zip(&offsets).map(|(v, x)| v * x).collect();
                let moment: f64 = raw.iter().zip(&offsets).map(|(v, x)| v * x).sum();
                raw.iter().map(|v| v / moment).collect()
            }
            2 => {
                let raw: Vec<f64> = g
                    .iter()
                    .zip(&offsets)
                    .map(|(v, x)| v * (x * x / var - 1.0))
                    .collect();
                let mean = raw.iter().sum::<f64>() / raw.len() as f64;
                let centered: Vec<f64> = raw.iter().map(|v| v - mean).collect();
                let moment: f64 = centered
                    .iter()
                    .zip(&offsets)
                    .map(|(v, x)| v * x * x / 2.0)
                    .sum();
                centered.iter().map(|v| v / moment).collect()
            }
            _ => {
                return Err(FilterError::invalid("order", format!("unsupported order {order}")));
            }
        };
        Self::line(axis, &weights, radius as usize)
    }

    /// Finite-difference derivative of order 1 or 2 along `axis`.
    pub fn difference(axis: usize, order: u32, scheme: DifferenceScheme) -> FilterResult<Self> {
        match (order, scheme) {
            (1, DifferenceScheme::Central) => Self::line(axis, &[-0.5, 0.0, 0.5], 1),
            (1, DifferenceScheme::Forward) => Self::line(axis, &[-1.0, 1.0], 0),
            (1, DifferenceScheme::Backward) => Self::line(axis, &[-1.0, 1.0], 1),
            (2, DifferenceScheme::Central) => Self::line(axis, &[1.0, -2.0, 1.0], 1),
            (2, DifferenceScheme::Forward) => Self::line(axis, &[1.0, -2.0, 1.0], 0),
            (2, DifferenceScheme::Backward) => Self::line(axis, &[1.0, -2.0, 1.0], 2),
            _ => Err(FilterError::invalid("order", format!("unsupported order {order}"))),
        }
    }

    /// Central mixed second derivative `∂²/∂a∂b` on a 3×3 stencil.
    pub fn cross_difference(a: usize, b: usize) -> FilterResult<Self> {
        check_axis(a)?;
        check_axis(b)?;
        if a == b {
            return Self::difference(a, 2, DifferenceScheme::Central);
        }
        let da = Self::difference(a, 1, DifferenceScheme::Central)?;
        let db = Self::difference(b, 1, DifferenceScheme::Central)?;
        Ok(da.outer(&db))
    }

    /// Separable product: footprint is the Minkowski sum, weights multiply.
    pub fn outer(&self, other: &Kernel) -> Kernel {
        let a = self.footprint();
        let b = other.footprint();
        let footprint = a.expand(b.min(), b.max());
        let weights = Image::from_fn(footprint, |p| {
            let mut sum = 0.0;
            for q in a.points() {
                let r = p - q;
                if let Some(w) = other.weights.get(r) {
                    sum += self.weights.get(q).unwrap_or(0.0) * w;
                }
            }
            sum
        });
        Kernel { weights }
    }

    /// Box of offsets read by this kernel.
    pub fn footprint(&self) -> &Region {
        self.weights.region()
    }

    pub fn weights(&self) -> &Image<f64> {
        &self.weights
    }

    /// Weights in memory order (aligned with a window traversal).
    pub fn values(&self) -> &[f64] {
        self.weights.data()
    }

    pub fn sum(&self) -> f64 {
        self.weights.data().iter().sum()
    }

    /// Half-width along `axis`: the largest distance from the origin.
    pub fn radius(&self, axis: usize) -> i64 {
        let f = self.footprint();
        f.min()[axis].abs().max(f.max()[axis].abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_kernel() {
        let k = Kernel::mean([1, 1, 0]);
        assert_eq!(k.footprint(), &Region::centered([1, 1, 0]));
        assert_eq!(k.values().len(), 9);
        assert!((k.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_line_kernel_footprint() {
        let k = Kernel::line(1, &[1.0, 2.0, 3.0, 4.0], 1).unwrap();
        assert_eq!(k.footprint().min(), Point::new(0, -1, 0));
        assert_eq!(k.footprint().max(), Point::new(0, 2, 0));
        assert_eq!(k.radius(1), 2);
        assert!(Kernel::line(0, &[1.0], 1).is_err());
        assert!(Kernel::line(3, &[1.0], 0).is_err());
    }

    #[test]
    fn test_empty_footprint_rejected() {
        assert_eq!(
            Kernel::new(Region::empty(), Vec::new()),
            Err(FilterError::Image(ImageError::EmptyRegion))
        );
    }

    #[test]
    fn test_gaussian_moments() {
        let g0 = Kernel::gaussian(0, 1.5, 3.0).unwrap();
        assert_eq!(g0.radius(0), 5);
        assert!((g0.sum() - 1.0).abs() < 1e-12);

        let g1 = Kernel::gaussian_derivative(0, 1.5, 1, 3.0).unwrap();
        let m1: f64 = g1
            .footprint()
            .points()
            .zip(g1.values())
            .map(|(p, w)| p.x() as f64 * w)
            .sum();
        assert!(g1.sum().abs() < 1e-12);
        assert!((m1 - 1.0).abs() < 1e-12);

        let g2 = Kernel::gaussian_derivative(0, 1.5, 2, 3.0).unwrap();
        let m2: f64 = g2
            .footprint()
            .points()
            .zip(g2.values())
            .map(|(p, w)| (p.x() * p.x()) as f64 / 2.0 * w)
            .sum();
        assert!(g2.sum().abs() < 1e-12);
        assert!((m2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_sigma() {
        assert!(Kernel::gaussian(0, 0.0, 3.0).is_err());
        assert!(Kernel::gaussian(0, f64::NAN, 3.0).is_err());
        assert!(Kernel::gaussian_derivative(0, 1.0, 3, 3.0).is_err());
    }

    #[test]
    fn test_cross_difference_stencil() {
        let k = Kernel::cross_difference(0, 1).unwrap();
        assert_eq!(k.footprint(), &Region::centered([1, 1, 0]));
        assert_eq!(k.weights().get(Point::new(1, 1, 0)), Some(0.25));
        assert_eq!(k.weights().get(Point::new(-1, 1, 0)), Some(-0.25));
        assert_eq!(k.weights().get(Point::new(0, 1, 0)), Some(0.0));
    }

    #[test]
    fn test_outer_of_means_is_mean() {
        let a = Kernel::mean([1, 0, 0]);
        let b = Kernel::mean([0, 1, 0]);
        let ab = a.outer(&b);
        let m = Kernel::mean([1, 1, 0]);
        assert_eq!(ab.footprint(), m.footprint());
        for (x, y) in ab.values().iter().zip(m.values()) {
            assert!((x - y).abs() < 1e-15);
        }
    }
}
