use std::alloc::Layout;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StSetError {
    #[error("capacity overflow")]
    CapacityOverflow,
    #[error("allocation of {} bytes (align {}) failed", .layout.size(), .layout.align())]
    AllocError { layout: Layout },
}

/// Whether allocation problems are returned to the caller or are fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[inline]
    pub(crate) fn capacity_overflow(self) -> StSetError {
        match self {
            Fallibility::Fallible => StSetError::CapacityOverflow,
            Fallibility::Infallible => panic!("stset capacity overflow"),
        }
    }

    #[inline]
    pub(crate) fn alloc_err(self, layout: Layout) -> StSetError {
        match self {
            Fallibility::Fallible => StSetError::AllocError { layout },
            Fallibility::Infallible => std::alloc::handle_alloc_error(layout),
        }
    }
}
