//! Key hashing and the h1/h2 split.
//!
//! One 64-bit hash is reduced twice: `h1 = hash % (2^57 - 1)` picks the group the
//! probe starts at, `h2 = hash % 127` is the 7-bit tag kept in the control byte.
//! Both are packed back into a single u64 (`h1 << 7 | h2`) which is what entries
//! store, so growth can re-place an entry without touching its key bytes.

use std::hash::{BuildHasher, Hasher};

use foldhash::quality::FixedState;

pub const H1_MODULUS: u64 = 0x01ff_ffff_ffff_ffff;
pub const H2_MODULUS: u64 = 0x7f;

/// Top bit of a control byte; set for occupied slots.
pub const OCCUPIED: u8 = 0x80;

pub trait KeyHasher {
    fn hash_bytes(&self, bytes: &[u8]) -> u64;

    #[inline(always)]
    fn split(&self, bytes: &[u8]) -> SplitHash {
        SplitHash::from_hash(self.hash_bytes(bytes))
    }
}

/// Seeded foldhash over raw bytes (no length prefix).
#[derive(Clone)]
pub struct FoldKeyHasher {
    seed: u64,
    state: FixedState,
}

impl FoldKeyHasher {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            state: FixedState::with_seed(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl std::fmt::Debug for FoldKeyHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoldKeyHasher")
            .field("seed", &self.seed)
            .finish()
    }
}

impl KeyHasher for FoldKeyHasher {
    #[inline(always)]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.state.build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }
}

/// A hash already reduced into its (h1, h2) halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SplitHash(u64);

impl SplitHash {
    #[inline(always)]
    pub fn from_hash(hash: u64) -> Self {
        let h1 = hash % H1_MODULUS;
        let h2 = hash % H2_MODULUS;
        Self((h1 << 7) | h2)
    }

    /// Rebuild from the packed form stored in an entry.
    #[inline(always)]
    pub const fn from_packed(packed: u64) -> Self {
        Self(packed)
    }

    #[inline(always)]
    pub const fn packed(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn h1(self) -> u64 {
        self.0 >> 7
    }

    #[inline(always)]
    pub const fn h2(self) -> u8 {
        (self.0 & 0x7f) as u8
    }

    /// Control byte written for a slot holding this hash.
    #[inline(always)]
    pub const fn tag(self) -> u8 {
        self.h2() | OCCUPIED
    }
}
