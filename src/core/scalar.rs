//! Numeric pixel types.
//!
//! Filters accumulate in `f64`; [`Scalar`] converts pixel values in and out.
//! Conversions into integer types round to nearest and saturate.

use std::fmt::Debug;

/// A numeric pixel value.
pub trait Scalar: Copy + Debug + Default + PartialOrd + Send + Sync + 'static {
    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    // `as` saturates and maps NaN to 0
                    v.round() as $t
                }
            }
        )*
    };
}

impl_scalar_int!(u8, u16, i16, i32, u32, i64);

impl Scalar for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Scalar for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion_rounds_and_saturates() {
        assert_eq!(u8::from_f64(2.6), 3);
        assert_eq!(u8::from_f64(-4.0), 0);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(i16::from_f64(-2.5), -3);
        assert_eq!(u16::from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_float_conversion_is_identity() {
        assert_eq!(f64::from_f64(0.125).to_f64(), 0.125);
        assert_eq!(f32::from_f64(0.5), 0.5f32);
    }
}
