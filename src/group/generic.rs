//! Portable group: four little-endian u64 words scanned with SWAR tricks.

use super::GROUP_WIDTH;
use super::bitmask::BitMask;

const WORDS: usize = GROUP_WIDTH / 8;
const LOW7: u64 = 0x7f7f_7f7f_7f7f_7f7f;
const HIGH: u64 = 0x8080_8080_8080_8080;
const LSB: u64 = 0x0101_0101_0101_0101;

#[derive(Clone, Copy)]
pub(crate) struct Group([u64; WORDS]);

/// Packs the high bit of each byte of `word` into the low 8 bits, byte 0 first.
#[inline(always)]
fn high_bits(word: u64) -> u32 {
    (((word >> 7) & LSB).wrapping_mul(0x0102_0408_1020_4080) >> 56) as u32
}

impl Group {
    #[inline(always)]
    fn mask(self, f: impl Fn(u64) -> u64) -> BitMask {
        let mut mask = 0u32;
        for (i, &word) in self.0.iter().enumerate() {
            mask |= high_bits(f(word)) << (i * 8);
        }
        BitMask(mask)
    }
}

impl super::Group for Group {
    #[inline(always)]
    unsafe fn load_aligned(ptr: *const u8) -> Self {
        // Safety: the caller guarantees GROUP_WIDTH readable bytes.
        let bytes = unsafe { ptr.cast::<[u8; GROUP_WIDTH]>().read() };
        let mut words = [0u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        Group(words)
    }

    #[inline(always)]
    fn match_empty(self) -> BitMask {
        self.mask(|word| !word & HIGH)
    }

    #[inline(always)]
    fn match_tag(self, tag: u8) -> BitMask {
        let repeated = LSB.wrapping_mul(u64::from(tag));
        // Exact zero-byte test: high bit set only where `word ^ repeated` is 0.
        self.mask(|word| {
            let x = word ^ repeated;
            !(((x & LOW7) + LOW7) | x | LOW7)
        })
    }
}
