use std::marker::PhantomData;

use crate::{
    DEFAULT_CAPACITY, DropPolicy, FreeIndexStore, GlobalStorage, SparseVector, StorageProvider,
};

/// Builder for creating an instance of [`SparseVector`].
///
/// You only need to use this builder if you want to customize the vector configuration.
/// The default configuration used by [`SparseVector::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use smallvec::SmallVec;
/// use sparse_vector::{DropPolicy, GlobalStorage, SparseVector};
///
/// let vector = SparseVector::<u32>::builder()
///     .initial_capacity(16)
///     .storage(GlobalStorage)
///     .free_index_store(SmallVec::<[usize; 8]>::new())
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
///
/// assert_eq!(vector.capacity(), 16);
/// ```
///
/// [1]: SparseVector::new
#[must_use]
pub struct SparseVectorBuilder<T, S = GlobalStorage, F = Vec<usize>> {
    initial_capacity: usize,
    storage: S,
    free_index_store: F,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T, S, F> std::fmt::Debug for SparseVectorBuilder<T, S, F>
where
    S: std::fmt::Debug,
    F: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseVectorBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("initial_capacity", &self.initial_capacity)
            .field("storage", &self.storage)
            .field("free_index_store", &self.free_index_store)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> SparseVectorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            storage: GlobalStorage,
            free_index_store: Vec::new(),
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }
}

impl<T, S, F> SparseVectorBuilder<T, S, F> {
    /// Sets the number of cells allocated up front. Defaults to 2.
    ///
    /// A capacity of zero defers allocation until the first insertion.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the vector. This governs how
    /// to treat remaining values in the vector when the vector is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use sparse_vector::{DropPolicy, SparseVector};
    ///
    /// let vector = SparseVector::<u32>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Sets the [`StorageProvider`] that the vector obtains its cell memory from.
    pub fn storage<S2>(self, storage: S2) -> SparseVectorBuilder<T, S2, F>
    where
        S2: StorageProvider,
    {
        SparseVectorBuilder {
            initial_capacity: self.initial_capacity,
            storage,
            free_index_store: self.free_index_store,
            drop_policy: self.drop_policy,
            _item: PhantomData,
        }
    }

    /// Sets the [`FreeIndexStore`] that the vector keeps its vacant indices in.
    ///
    /// Any indices already in the store are discarded when the vector is built.
    pub fn free_index_store<F2>(self, store: F2) -> SparseVectorBuilder<T, S, F2>
    where
        F2: FreeIndexStore,
    {
        SparseVectorBuilder {
            initial_capacity: self.initial_capacity,
            storage: self.storage,
            free_index_store: store,
            drop_policy: self.drop_policy,
            _item: PhantomData,
        }
    }

    /// Builds the sparse vector with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let vector = SparseVector::<u32>::builder().build();
    /// ```
    #[must_use]
    pub fn build(mut self) -> SparseVector<T, S, F>
    where
        S: StorageProvider,
        F: FreeIndexStore,
    {
        self.free_index_store.clear();

        SparseVector::new_inner(
            self.initial_capacity,
            self.storage,
            self.free_index_store,
            self.drop_policy,
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::alloc::Layout;
    use std::cell::Cell;
    use std::ptr::NonNull;
    use std::rc::Rc;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(SparseVectorBuilder<u32>: Send, Sync, std::fmt::Debug);

    /// Forwards to the global allocator while counting outstanding blocks.
    #[derive(Clone, Debug, Default)]
    struct CountingStorage {
        outstanding: Rc<Cell<isize>>,
    }

    // SAFETY: Forwards to `GlobalStorage`, which upholds the contract.
    unsafe impl StorageProvider for CountingStorage {
        fn allocate(&self, layout: Layout) -> NonNull<u8> {
            self.outstanding.set(self.outstanding.get() + 1);
            GlobalStorage.allocate(layout)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.outstanding.set(self.outstanding.get() - 1);

            // SAFETY: Forwarding the caller's guarantee.
            unsafe {
                GlobalStorage.deallocate(ptr, layout);
            }
        }
    }

    #[test]
    fn builder_new_creates_default_state() {
        let builder = SparseVectorBuilder::<u32>::new();

        assert_eq!(builder.initial_capacity, DEFAULT_CAPACITY);
        assert_eq!(builder.drop_policy, DropPolicy::default());
        assert!(builder.free_index_store.is_empty());
    }

    #[test]
    fn initial_capacity_is_applied() {
        let vector = SparseVectorBuilder::<u32>::new()
            .initial_capacity(10)
            .build();

        assert_eq!(vector.capacity(), 10);
        assert_eq!(vector.size(), 0);
    }

    #[test]
    fn zero_initial_capacity_defers_allocation() {
        let storage = CountingStorage::default();

        let mut vector = SparseVectorBuilder::<u32>::new()
            .initial_capacity(0)
            .storage(storage.clone())
            .build();

        assert_eq!(storage.outstanding.get(), 0);

        vector.push_free(1);
        assert_eq!(storage.outstanding.get(), 1);
        assert_eq!(vector.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn drop_policy_can_be_overridden() {
        let builder = SparseVectorBuilder::<u32>::new()
            .drop_policy(DropPolicy::MustNotDropItems)
            .drop_policy(DropPolicy::MayDropItems);

        assert_eq!(builder.drop_policy, DropPolicy::MayDropItems);
    }

    #[test]
    fn prefilled_free_index_store_is_cleared() {
        let vector = SparseVectorBuilder::<u32>::new()
            .free_index_store(vec![4, 5, 6])
            .build();

        assert!(vector.free_cells().is_empty());
    }

    #[test]
    fn custom_storage_sees_balanced_allocations() {
        let storage = CountingStorage::default();

        {
            let mut vector = SparseVectorBuilder::<String>::new()
                .storage(storage.clone())
                .build();

            for value in 0..20 {
                vector.push_free(value.to_string());
            }

            // 2 -> 4 -> 8 -> 16 -> 32, each growth releasing the previous block.
            assert_eq!(vector.capacity(), 32);
            assert_eq!(storage.outstanding.get(), 1);

            let clone = vector.clone();
            assert_eq!(storage.outstanding.get(), 2);
            drop(clone);
        }

        assert_eq!(storage.outstanding.get(), 0);
    }

    #[test]
    fn builder_chaining_works() {
        let builder = SparseVectorBuilder::<u32>::new()
            .initial_capacity(3)
            .drop_policy(DropPolicy::MustNotDropItems);

        assert_eq!(builder.initial_capacity, 3);
        assert_eq!(builder.drop_policy, DropPolicy::MustNotDropItems);

        let debug = format!("{builder:?}");
        assert!(debug.contains("u32"));
        assert!(debug.contains("MustNotDropItems"));
    }
}
