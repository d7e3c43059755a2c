//! The open-addressing engine behind `StSet`.
//!
//! Layout: `capacity` control bytes (aligned to `GROUP_WIDTH`) and `capacity`
//! entries. A control byte is `0x00` when empty and `0x80 | h2` when occupied.
//! Probing starts at the group containing `h1 % capacity` and walks group by
//! group, wrapping around. Within a group, the first empty lane ends the probe.
//!
//! There is no deletion, so a key always sits before the first empty lane of
//! its group and every group between its start group and its own is full. That
//! is what lets lookups stop at the first empty lane.
//!
//! The table holds no live count. It grows (doubles) only when an insert walks
//! all the way around without seeing an empty lane.

use std::marker::PhantomData;

use crate::error::{Fallibility, StSetError};
use crate::group::{GROUP_WIDTH, Group};
use crate::hash::{OCCUPIED, SplitHash};
use crate::mem::{ZeroedBuf, Zeroable, align_down, align_up};

pub const MIN_CAPACITY: usize = 1024;

/// A stored key: its packed hash plus a borrowed pointer/length pair.
///
/// `hash` holds `h1 << 7 | h2` as produced by [`SplitHash::packed`], not the
/// raw 64-bit hash. That is all growth needs to re-place the entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub(crate) struct Entry {
    hash: u64,
    ptr: *const u8,
    len: usize,
}

// Safety: a null pointer and zero integers are a valid (unused) Entry.
unsafe impl Zeroable for Entry {}

/// Effective capacity for a requested one.
#[inline]
pub fn effective_capacity(requested: usize) -> usize {
    if requested <= MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        align_up(requested, GROUP_WIDTH)
    }
}

pub(crate) struct RawTable<'k> {
    ctrl: ZeroedBuf<u8>,
    entries: ZeroedBuf<Entry>,
    marker: PhantomData<&'k [u8]>,
}

// Safety: entries only ever point at `&'k [u8]` data, which is Send + Sync.
// Mutation goes through `&mut self`.
unsafe impl Send for RawTable<'_> {}
unsafe impl Sync for RawTable<'_> {}

impl<'k> RawTable<'k> {
    pub(crate) fn with_capacity(
        requested: usize,
        fallibility: Fallibility,
    ) -> Result<Self, StSetError> {
        if requested > usize::MAX - GROUP_WIDTH {
            return Err(fallibility.capacity_overflow());
        }
        Self::allocate(effective_capacity(requested), fallibility)
    }

    fn allocate(capacity: usize, fallibility: Fallibility) -> Result<Self, StSetError> {
        debug_assert!(capacity >= MIN_CAPACITY && capacity % GROUP_WIDTH == 0);
        let ctrl = ZeroedBuf::new(capacity, GROUP_WIDTH, fallibility)?;
        let entries = ZeroedBuf::new(capacity, std::mem::align_of::<Entry>(), fallibility)?;
        Ok(Self {
            ctrl,
            entries,
            marker: PhantomData,
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.ctrl.len()
    }

    /// First slot of the group a probe for `hash` starts at.
    #[inline(always)]
    fn start_group(&self, hash: SplitHash) -> usize {
        align_down((hash.h1() % self.capacity() as u64) as usize, GROUP_WIDTH)
    }

    #[inline(always)]
    fn next_group(&self, pos: usize) -> usize {
        (pos + GROUP_WIDTH) % self.capacity()
    }

    /// # Safety
    /// `pos` must be a multiple of `GROUP_WIDTH` below capacity, and `G` must be
    /// supported by the running CPU.
    #[inline(always)]
    unsafe fn load<G: Group>(&self, pos: usize) -> G {
        unsafe { G::load_aligned(self.ctrl.as_ptr().add(pos)) }
    }

    #[inline(always)]
    fn key_at(&self, index: usize) -> &'k [u8] {
        let entry = &self.entries.as_slice()[index];
        // Safety: occupied entries were built from a `&'k [u8]`.
        unsafe { std::slice::from_raw_parts(entry.ptr, entry.len) }
    }

    #[inline(always)]
    fn is_occupied(&self, index: usize) -> bool {
        self.ctrl.as_slice()[index] & OCCUPIED != 0
    }

    #[inline(always)]
    fn write(&mut self, index: usize, hash: SplitHash, key: &'k [u8]) {
        self.ctrl.as_mut_slice()[index] = hash.tag();
        self.entries.as_mut_slice()[index] = Entry {
            hash: hash.packed(),
            ptr: key.as_ptr(),
            len: key.len(),
        };
    }

    /// Inserts without looking for an existing copy of `key`.
    ///
    /// # Safety
    /// `G` must be supported by the running CPU.
    #[inline(always)]
    pub(crate) unsafe fn insert_unchecked<G: Group>(&mut self, hash: SplitHash, key: &'k [u8]) {
        let mut start = self.start_group(hash);
        let mut pos = start;
        loop {
            let group = unsafe { self.load::<G>(pos) };
            if let Some(lane) = group.match_empty().lowest_set_bit() {
                self.write(pos + lane, hash, key);
                return;
            }
            pos = self.next_group(pos);
            if pos == start {
                unsafe { self.grow::<G>() };
                start = self.start_group(hash);
                pos = start;
            }
        }
    }

    /// Inserts `key` unless a byte-identical key is already present.
    /// Returns whether the key was inserted.
    ///
    /// # Safety
    /// `G` must be supported by the running CPU.
    #[inline(always)]
    pub(crate) unsafe fn try_insert<G: Group>(&mut self, hash: SplitHash, key: &'k [u8]) -> bool {
        let tag = hash.tag();
        let mut start = self.start_group(hash);
        let mut pos = start;
        loop {
            let group = unsafe { self.load::<G>(pos) };
            let first_empty = group.match_empty().trailing_zeros();
            for lane in group.match_tag(tag) {
                if lane > first_empty {
                    break;
                }
                if self.key_at(pos + lane) == key {
                    return false;
                }
            }
            if first_empty < GROUP_WIDTH {
                self.write(pos + first_empty, hash, key);
                return true;
            }
            pos = self.next_group(pos);
            if pos == start {
                unsafe { self.grow::<G>() };
                start = self.start_group(hash);
                pos = start;
            }
        }
    }

    /// # Safety
    /// `G` must be supported by the running CPU.
    #[inline(always)]
    pub(crate) unsafe fn exists<G: Group>(&self, hash: SplitHash, key: &[u8]) -> bool {
        let tag = hash.tag();
        let start = self.start_group(hash);
        let mut pos = start;
        loop {
            let group = unsafe { self.load::<G>(pos) };
            let first_empty = group.match_empty().trailing_zeros();
            for lane in group.match_tag(tag) {
                if lane > first_empty {
                    break;
                }
                if self.key_at(pos + lane) == key {
                    return true;
                }
            }
            if first_empty < GROUP_WIDTH {
                return false;
            }
            pos = self.next_group(pos);
            if pos == start {
                return false;
            }
        }
    }

    /// Doubles capacity and re-places every occupied entry from its stored hash.
    ///
    /// # Safety
    /// `G` must be supported by the running CPU.
    #[inline(always)]
    pub(crate) unsafe fn grow<G: Group>(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .unwrap_or_else(|| panic!("stset capacity overflow"));
        // Infallible: allocation failure aborts inside `allocate`.
        let Ok(mut new) = Self::allocate(new_capacity, Fallibility::Infallible) else {
            unreachable!("infallible allocation returned an error");
        };

        for index in 0..old_capacity {
            if !self.is_occupied(index) {
                continue;
            }
            let entry = self.entries.as_slice()[index];
            let hash = SplitHash::from_packed(entry.hash);
            let mut pos = new.start_group(hash);
            let slot = loop {
                let group = unsafe { new.load::<G>(pos) };
                if let Some(lane) = group.match_empty().lowest_set_bit() {
                    break pos + lane;
                }
                pos = new.next_group(pos);
            };
            new.ctrl.as_mut_slice()[slot] = hash.tag();
            new.entries.as_mut_slice()[slot] = entry;
        }

        log::debug!("stset grew from {} to {} slots", old_capacity, new_capacity);
        *self = new;
    }

    /// Occupied keys in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &'k [u8]> + '_ {
        (0..self.capacity())
            .filter(move |&index| self.is_occupied(index))
            .map(move |index| self.key_at(index))
    }
}
