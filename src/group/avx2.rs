//! 256-bit group backed by AVX2 compares.
//!
//! These methods are only ever inlined into functions compiled with
//! `#[target_feature(enable = "avx2,bmi1")]`, which is where the intrinsics
//! end up being emitted.

use std::arch::x86_64::{
    __m256i, _mm256_cmpeq_epi8, _mm256_load_si256, _mm256_movemask_epi8, _mm256_set1_epi8,
};

use super::bitmask::BitMask;

#[derive(Clone, Copy)]
pub(crate) struct Group(__m256i);

impl super::Group for Group {
    #[inline(always)]
    unsafe fn load_aligned(ptr: *const u8) -> Self {
        // Safety: the caller guarantees alignment, readable bytes and AVX2.
        Group(unsafe { _mm256_load_si256(ptr.cast::<__m256i>()) })
    }

    #[inline(always)]
    fn match_empty(self) -> BitMask {
        // Empty lanes have the top bit clear, so they are the zeros of movemask.
        // Safety: a Group only exists once AVX2 has been detected.
        BitMask(!(unsafe { _mm256_movemask_epi8(self.0) }) as u32)
    }

    #[inline(always)]
    fn match_tag(self, tag: u8) -> BitMask {
        // Safety: as above.
        unsafe {
            let cmp = _mm256_cmpeq_epi8(self.0, _mm256_set1_epi8(tag as i8));
            BitMask(_mm256_movemask_epi8(cmp) as u32)
        }
    }
}
