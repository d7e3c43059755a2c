//! Aligned, zero-filled buffers for the control bytes and entries.

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{Fallibility, StSetError};

/// Types for which the all-zero bit pattern is a valid value.
///
/// # Safety
/// Implementors must be `Copy`, without drop glue, and valid when zeroed.
pub(crate) unsafe trait Zeroable: Copy {}

unsafe impl Zeroable for u8 {}

/// A fixed-length heap array allocated with `alloc_zeroed`.
pub(crate) struct ZeroedBuf<T: Zeroable> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
    marker: PhantomData<T>,
}

impl<T: Zeroable> ZeroedBuf<T> {
    /// Allocates `len` zeroed elements aligned to at least `align` bytes.
    pub(crate) fn new(len: usize, align: usize, fallibility: Fallibility) -> Result<Self, StSetError> {
        let layout = Layout::array::<T>(len)
            .and_then(|layout| layout.align_to(align))
            .map_err(|_| fallibility.capacity_overflow())?;
        if layout.size() == 0 {
            return Err(fallibility.capacity_overflow());
        }
        // Safety: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or_else(|| fallibility.alloc_err(layout))?;
        Ok(Self {
            ptr,
            len,
            layout,
            marker: PhantomData,
        })
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub(crate) fn as_slice(&self) -> &[T] {
        // Safety: ptr covers len initialized (zeroed or written) elements.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: as above, and we hold the only reference.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> Drop for ZeroedBuf<T> {
    fn drop(&mut self) {
        // Safety: allocated in `new` with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) };
    }
}

// Safety: ZeroedBuf uniquely owns its allocation, like a Box<[T]>.
unsafe impl<T: Zeroable + Send> Send for ZeroedBuf<T> {}
unsafe impl<T: Zeroable + Sync> Sync for ZeroedBuf<T> {}

#[inline(always)]
pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[inline(always)]
pub(crate) const fn align_down(value: usize, align: usize) -> usize {
    value & !(align - 1)
}
