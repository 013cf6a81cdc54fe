//! Four-lane f32 batch used by the mixer
//!
//! On x86_64 the lanes live in an SSE register (SSE2 is part of the
//! baseline target, so no runtime detection is needed). Every other target
//! uses a plain `[f32; 4]`. Both paths produce bit-identical results: no
//! fused multiply-add, and rounding to integers is round-half-to-even in
//! both.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m128, __m128i, _mm_add_ps, _mm_cvtps_epi32, _mm_loadu_ps, _mm_max_ps, _mm_min_ps,
    _mm_mul_ps, _mm_packs_epi32, _mm_set1_ps, _mm_setzero_ps, _mm_storeu_ps, _mm_storeu_si128,
    _mm_unpackhi_epi32, _mm_unpacklo_epi32,
};

/// Lanes per batch
pub const LANES: usize = 4;

/// Four f32 samples processed together
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct F32x4(
    #[cfg(target_arch = "x86_64")] __m128,
    #[cfg(not(target_arch = "x86_64"))] [f32; LANES],
);

#[cfg(target_arch = "x86_64")]
impl F32x4 {
    #[inline]
    pub fn zero() -> Self {
        // SAFETY: SSE2 is always available on x86_64.
        Self(unsafe { _mm_setzero_ps() })
    }

    #[inline]
    pub fn splat(value: f32) -> Self {
        // SAFETY: SSE2 is always available on x86_64.
        Self(unsafe { _mm_set1_ps(value) })
    }

    #[inline]
    pub fn from_array(values: [f32; LANES]) -> Self {
        // SAFETY: `values` is 16 readable bytes; loadu has no alignment requirement.
        Self(unsafe { _mm_loadu_ps(values.as_ptr()) })
    }

    #[inline]
    pub fn to_array(self) -> [f32; LANES] {
        let mut out = [0.0; LANES];
        // SAFETY: `out` is 16 writable bytes; storeu has no alignment requirement.
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.0) };
        out
    }

    /// Round both channels to i16 with saturation and interleave them
    /// as `[l0, r0, l1, r1, l2, r2, l3, r3]`.
    #[inline]
    pub fn pack_stereo_i16(left: Self, right: Self) -> [i16; 2 * LANES] {
        let mut out = [0i16; 2 * LANES];
        // SAFETY: SSE2 is always available on x86_64 and `out` is 16 writable
        // bytes; storeu has no alignment requirement.
        unsafe {
            let lo = _mm_set1_ps(i16::MIN as f32);
            let hi = _mm_set1_ps(i16::MAX as f32);
            let l: __m128i = _mm_cvtps_epi32(_mm_min_ps(_mm_max_ps(left.0, lo), hi));
            let r: __m128i = _mm_cvtps_epi32(_mm_min_ps(_mm_max_ps(right.0, lo), hi));
            let lr_low = _mm_unpacklo_epi32(l, r);
            let lr_high = _mm_unpackhi_epi32(l, r);
            let packed = _mm_packs_epi32(lr_low, lr_high);
            _mm_storeu_si128(out.as_mut_ptr().cast::<__m128i>(), packed);
        }
        out
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl F32x4 {
    #[inline]
    pub fn zero() -> Self {
        Self([0.0; LANES])
    }

    #[inline]
    pub fn splat(value: f32) -> Self {
        Self([value; LANES])
    }

    #[inline]
    pub fn from_array(values: [f32; LANES]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn to_array(self) -> [f32; LANES] {
        self.0
    }

    /// Round both channels to i16 with saturation and interleave them
    /// as `[l0, r0, l1, r1, l2, r2, l3, r3]`.
    #[inline]
    pub fn pack_stereo_i16(left: Self, right: Self) -> [i16; 2 * LANES] {
        scalar::pack_stereo_i16(left.0, right.0)
    }
}

impl F32x4 {
    /// `[start, start + step, start + 2 * step, start + 3 * step]`
    #[inline]
    pub fn ramp(start: f32, step: f32) -> Self {
        Self::splat(start) + Self::from_array([0.0, 1.0, 2.0, 3.0]) * Self::splat(step)
    }

    /// `self + a * b`, computed as a separate multiply and add
    #[inline]
    pub fn mul_add(self, a: Self, b: Self) -> Self {
        self + a * b
    }
}

#[cfg(target_arch = "x86_64")]
impl Add for F32x4 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        // SAFETY: SSE2 is always available on x86_64.
        Self(unsafe { _mm_add_ps(self.0, rhs.0) })
    }
}

#[cfg(target_arch = "x86_64")]
impl Mul for F32x4 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        // SAFETY: SSE2 is always available on x86_64.
        Self(unsafe { _mm_mul_ps(self.0, rhs.0) })
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl Add for F32x4 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl Mul for F32x4 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] * rhs.0[i]))
    }
}

impl AddAssign for F32x4 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Default for F32x4 {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for F32x4 {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl fmt::Debug for F32x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("F32x4").field(&self.to_array()).finish()
    }
}

/// Portable reference implementation, also the non-x86 fallback
#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
pub(crate) mod scalar {
    use super::LANES;

    #[inline]
    pub fn to_i16(x: f32) -> i16 {
        x.clamp(i16::MIN as f32, i16::MAX as f32).round_ties_even() as i16
    }

    #[inline]
    pub fn pack_stereo_i16(left: [f32; LANES], right: [f32; LANES]) -> [i16; 2 * LANES] {
        let mut out = [0i16; 2 * LANES];
        for lane in 0..LANES {
            out[2 * lane] = to_i16(left[lane]);
            out[2 * lane + 1] = to_i16(right[lane]);
        }
        out
    }
}
