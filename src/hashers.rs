//! `std::hash` adapters for benchmark keys that are already stset hashes.

use std::hash::{BuildHasherDefault, Hasher};

/// Passes a precomputed u64 through unchanged.
#[derive(Default)]
pub struct PrehashedHasher {
    result: u64,
}

impl Hasher for PrehashedHasher {
    fn write(&mut self, _bytes: &[u8]) {
        unreachable!("PrehashedHasher only hashes u64 keys");
    }

    #[inline(always)]
    fn write_u64(&mut self, value: u64) {
        self.result = value;
    }

    #[inline(always)]
    fn finish(&self) -> u64 {
        self.result
    }
}

pub type BuildPrehashed = BuildHasherDefault<PrehashedHasher>;
