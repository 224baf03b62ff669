/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Various traits for types being used as audio samples.

/// Primitive types the rendered audio can be delivered to a device as.
pub trait AudioSample: Copy + Send + Default + 'static {
    /// Creates a silent sample value (with zero amplitude). Useful for filling buffers.
    #[inline(always)]
    fn silence() -> Self {
        Self::default()
    }
}

/// For converting samples between types.
pub trait FromSample<S> {
    /// Converts to Self a sample from the `other`.
    fn from_sample(other: S) -> Self;
}

impl AudioSample for f64 {}
impl AudioSample for f32 {}
impl AudioSample for i32 {}
impl AudioSample for i16 {}
impl AudioSample for u16 {
    #[inline(always)]
    fn silence() -> Self {
        0x8000
    }
}

impl<T: AudioSample> FromSample<T> for T {
    #[inline(always)]
    fn from_sample(other: T) -> T {
        other
    }
}

macro_rules! impl_from_i16_float {
    ($($ft:ty),*) => {$(
        impl FromSample<i16> for $ft {
            #[inline]
            fn from_sample(other: i16) -> $ft {
                if other < 0 {
                    other as $ft / -(i16::MIN as $ft)
                } else {
                    other as $ft / i16::MAX as $ft
                }
            }
        }
    )*};
}

impl_from_i16_float!(f32, f64);

impl FromSample<i16> for i32 {
    #[inline]
    fn from_sample(other: i16) -> i32 {
        (other as i32) << 16
    }
}

impl FromSample<i16> for u16 {
    #[inline]
    fn from_sample(other: i16) -> u16 {
        (other as u16) ^ 0x8000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i16_sample_conversion_works() {
        assert_eq!(f32::from_sample(i16::MAX), 1.0);
        assert_eq!(f32::from_sample(i16::MIN), -1.0);
        assert_eq!(f32::from_sample(0i16), 0.0);
        assert_eq!(f64::from_sample(i16::MIN), -1.0);
        assert_eq!(i32::from_sample(i16::MAX), 0x7fff_0000);
        assert_eq!(i32::from_sample(-1i16), -0x0001_0000);
        assert_eq!(u16::from_sample(0i16), u16::silence());
        assert_eq!(u16::from_sample(i16::MIN), 0);
        assert_eq!(u16::from_sample(i16::MAX), u16::MAX);
        assert_eq!(i16::from_sample(-1234i16), -1234);
        assert_eq!(f32::silence(), 0.0);
    }
}
