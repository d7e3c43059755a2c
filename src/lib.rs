//! A dense set for deduplicating borrowed byte strings.
//!
//! Swiss-table style open addressing: one control byte per slot, probed 32 at
//! a time, with an AVX2 engine picked at runtime when the CPU has it and a
//! portable engine otherwise.
//!
//! ```
//! let text = b"the cat saw the other cat".to_vec();
//! let mut seen = stset::StSet::new(0);
//! let unique = text
//!     .split(|&b| b == b' ')
//!     .filter(|&word| seen.try_insert(word))
//!     .count();
//! assert_eq!(unique, 4);
//! ```

pub mod config;
pub mod cpu;
pub mod dispatch;
pub mod error;
mod group;
pub mod hash;
mod mem;
mod raw;
pub mod set;
pub mod words;

pub use dispatch::get_alignment;
pub use error::StSetError;
pub use group::GROUP_WIDTH;
pub use raw::{MIN_CAPACITY, effective_capacity};
pub use set::StSet;
