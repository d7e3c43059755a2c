use crate::dispatch::{Dispatch, dispatch};
use crate::error::{Fallibility, StSetError};
use crate::hash::{FoldKeyHasher, KeyHasher};
use crate::raw::RawTable;

/// A set of borrowed byte strings.
///
/// The set never copies key bytes: it stores a pointer and length into the
/// caller's buffer, which is why keys are `&'k [u8]` and the set cannot outlive
/// them. There is no removal and no len; membership is all it answers.
///
/// Capacity starts at `max(1024, requested rounded up to 32)` and doubles
/// whenever an insert finds every slot taken. Allocation failure aborts, except
/// in [`StSet::try_new`].
pub struct StSet<'k> {
    table: RawTable<'k>,
    hasher: FoldKeyHasher,
    dispatch: &'static Dispatch,
}

impl<'k> StSet<'k> {
    /// Creates a set using the process-wide seed.
    pub fn new(capacity: usize) -> Self {
        let dispatch = dispatch();
        Self::build(capacity, dispatch.hasher(), dispatch, Fallibility::Infallible)
            .unwrap_or_else(|_| unreachable!("infallible allocation returned an error"))
    }

    /// Like [`StSet::new`], but reports capacity overflow or allocation failure.
    pub fn try_new(capacity: usize) -> Result<Self, StSetError> {
        let dispatch = dispatch();
        Self::build(capacity, dispatch.hasher(), dispatch, Fallibility::Fallible)
    }

    /// Creates a set with its own hash seed, giving a reproducible layout.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::build(
            capacity,
            FoldKeyHasher::with_seed(seed),
            dispatch(),
            Fallibility::Infallible,
        )
        .unwrap_or_else(|_| unreachable!("infallible allocation returned an error"))
    }

    fn build(
        capacity: usize,
        hasher: FoldKeyHasher,
        dispatch: &'static Dispatch,
        fallibility: Fallibility,
    ) -> Result<Self, StSetError> {
        Ok(Self {
            table: RawTable::with_capacity(capacity, fallibility)?,
            hasher,
            dispatch,
        })
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Name of the probe engine in use, `"avx2"` or `"scalar"`.
    pub fn strategy_name(&self) -> &'static str {
        self.dispatch.strategy_name()
    }

    /// Inserts `key` without checking whether it is already present.
    ///
    /// Inserting a key twice stores it twice. Use this only when the input is
    /// known to be duplicate-free, e.g. when loading a sorted word list.
    #[inline]
    pub fn insert_unchecked(&mut self, key: &'k [u8]) {
        let hash = self.hasher.split(key);
        self.dispatch
            .strategy()
            .insert_unchecked(&mut self.table, hash, key);
    }

    /// Inserts `key` if no byte-identical key is present. Returns `true` if it
    /// was inserted.
    #[inline]
    pub fn try_insert(&mut self, key: &'k [u8]) -> bool {
        let hash = self.hasher.split(key);
        self.dispatch.strategy().try_insert(&mut self.table, hash, key)
    }

    #[inline]
    pub fn exists(&self, key: &[u8]) -> bool {
        let hash = self.hasher.split(key);
        self.dispatch.strategy().exists(&self.table, hash, key)
    }

    /// Doubles the capacity now instead of on the next full wrap.
    pub fn grow(&mut self) {
        self.dispatch.strategy().grow(&mut self.table);
    }

    /// Releases both arrays. Dropping the set does the same.
    pub fn free(self) {
        drop(self);
    }

    /// Stored keys in slot order. Walks the whole control array.
    pub fn iter(&self) -> impl Iterator<Item = &'k [u8]> + '_ {
        self.table.iter()
    }
}

impl<'k> Extend<&'k [u8]> for StSet<'k> {
    fn extend<I: IntoIterator<Item = &'k [u8]>>(&mut self, iter: I) {
        for key in iter {
            self.try_insert(key);
        }
    }
}

impl std::fmt::Debug for StSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StSet")
            .field("capacity", &self.capacity())
            .field("strategy", &self.strategy_name())
            .finish_non_exhaustive()
    }
}
