use std::alloc::Layout;
use std::any::type_name;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};
use std::ptr::{self, NonNull};
use std::{fmt, mem, slice, thread};

use tracing::{debug, trace};

use crate::{
    DropPolicy, Error, FreeIndexStore, GlobalStorage, IntoIter, Iter, IterIndexed,
    IterIndexedMut, IterMut, Result, SparseVectorBuilder, StorageProvider,
};

/// Capacity of a vector created without an explicit initial capacity. Also the capacity that
/// a zero-capacity vector grows to on its first insertion.
pub(crate) const DEFAULT_CAPACITY: usize = 2;

/// A growable vector whose items keep their index for as long as they are in the vector.
///
/// Removing an item does not shift the items after it. Instead, the cell the item occupied
/// becomes vacant and its index is remembered, to be handed out again by the next insertion
/// via [`push_free()`][1] or [`emplace_free()`][2]. The most recently vacated index is reused
/// first.
///
/// # Size and capacity
///
/// The [`size()`][3] of the vector is the number of cells that have ever been assigned an index,
/// whether they currently hold a value or not. It is not the number of values - that is
/// [`len()`][4]. The [`capacity()`][5] is the number of cells allocated; it doubles whenever an
/// insertion needs a fresh cell and all allocated cells are assigned. The vector never shrinks
/// its allocation.
///
/// # Iteration
///
/// Iterating visits only the occupied cells, in ascending index order.
///
/// # Collaborators
///
/// The memory for the cells comes from a [`StorageProvider`] (by default, the global
/// allocator) and vacant indices are kept in a [`FreeIndexStore`] (by default, a `Vec<usize>`).
/// Both can be replaced via [`builder()`][6].
///
/// # Example
///
/// ```
/// use sparse_vector::SparseVector;
///
/// let mut vector = SparseVector::new();
///
/// let ten = vector.push_free(10);
/// let twenty = vector.push_free(20);
/// assert_eq!((ten, twenty), (0, 1));
///
/// vector.erase_at(ten).unwrap();
///
/// // The vacated index is reused.
/// assert_eq!(vector.push_free(30), 0);
///
/// assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [30, 20]);
/// ```
///
/// [1]: Self::push_free
/// [2]: Self::emplace_free
/// [3]: Self::size
/// [4]: Self::len
/// [5]: Self::capacity
/// [6]: Self::builder
pub struct SparseVector<T, S = GlobalStorage, F = Vec<usize>>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    /// First of `capacity` cells. Every cell in the allocation is an initialized `Option<T>`,
    /// and every cell at or beyond `size` is `None`.
    cells: NonNull<Option<T>>,

    /// Number of cells that have been assigned an index, occupied or vacant.
    size: usize,

    capacity: usize,

    /// Number of occupied cells.
    count: usize,

    /// Indices below `size` whose cells are vacant, each registered exactly once.
    free_indices: F,

    storage: S,

    drop_policy: DropPolicy,

    _owns: PhantomData<T>,
}

impl<T> SparseVector<T> {
    /// Creates an empty vector with room for two items, backed by the global allocator.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let vector = SparseVector::<String>::new();
    ///
    /// assert_eq!(vector.size(), 0);
    /// assert_eq!(vector.capacity(), 2);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a vector with a custom configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::{DropPolicy, SparseVector};
    ///
    /// let vector = SparseVector::<u64>::builder()
    ///     .initial_capacity(64)
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert_eq!(vector.capacity(), 64);
    /// ```
    pub fn builder() -> SparseVectorBuilder<T> {
        SparseVectorBuilder::new()
    }
}

impl<T, S, F> SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    /// The free-index store is taken as-is, so the caller is responsible for its contents
    /// matching the size the vector ends up with.
    pub(crate) fn new_inner(
        capacity: usize,
        storage: S,
        free_indices: F,
        drop_policy: DropPolicy,
    ) -> Self {
        let cells = Self::allocate_cells(&storage, capacity);

        // SAFETY: The allocation holds `capacity` cells.
        unsafe {
            Self::mark_vacant(cells, 0..capacity);
        }

        Self {
            cells,
            size: 0,
            capacity,
            count: 0,
            free_indices,
            storage,
            drop_policy,
            _owns: PhantomData,
        }
    }

    #[must_use]
    fn layout(capacity: usize) -> Layout {
        Layout::array::<Option<T>>(capacity)
            .expect("sparse vector capacity must fit in the address space")
    }

    /// Allocates room for `capacity` cells without initializing any of them.
    fn allocate_cells(storage: &S, capacity: usize) -> NonNull<Option<T>> {
        let layout = Self::layout(capacity);

        if layout.size() == 0 {
            return NonNull::dangling();
        }

        storage.allocate(layout).cast()
    }

    /// # Safety
    ///
    /// `cells` must have come from `allocate_cells()` with the same storage and capacity, and
    /// every value in it must already have been dropped or moved out.
    unsafe fn release_cells(storage: &S, cells: NonNull<Option<T>>, capacity: usize) {
        let layout = Self::layout(capacity);

        if layout.size() == 0 {
            return;
        }

        // SAFETY: Forwarding the caller's guarantee about the origin of the block.
        unsafe {
            storage.deallocate(cells.cast(), layout);
        }
    }

    /// Writes `None` into every cell of `range`, without dropping what was there.
    ///
    /// # Safety
    ///
    /// Every index in `range` must be within the allocation behind `cells`.
    unsafe fn mark_vacant(cells: NonNull<Option<T>>, range: Range<usize>) {
        for index in range {
            // SAFETY: The caller guarantees the index is within the allocation.
            let cell = unsafe { cells.add(index) };

            // SAFETY: The pointer is in bounds, aligned and of the right type.
            unsafe {
                cell.write(None);
            }
        }
    }

    /// The cells that have been assigned an index.
    fn cells(&self) -> &[Option<T>] {
        // SAFETY: The first `size` cells are within the allocation and initialized.
        unsafe { slice::from_raw_parts(self.cells.as_ptr(), self.size) }
    }

    #[expect(clippy::needless_pass_by_ref_mut, reason = "false positive")]
    fn cells_mut(&mut self) -> &mut [Option<T>] {
        // SAFETY: The first `size` cells are within the allocation and initialized, and we hold
        // an exclusive reference to the vector.
        unsafe { slice::from_raw_parts_mut(self.cells.as_ptr(), self.size) }
    }

    /// Every allocated cell, including the ones beyond `size`.
    #[expect(clippy::needless_pass_by_ref_mut, reason = "false positive")]
    fn buffer_mut(&mut self) -> &mut [Option<T>] {
        // SAFETY: All `capacity` cells are initialized and we hold an exclusive reference.
        unsafe { slice::from_raw_parts_mut(self.cells.as_ptr(), self.capacity) }
    }

    /// Number of cells that have been assigned an index, whether occupied or vacant.
    ///
    /// This is one more than the highest index the vector has ever handed out, unless trailing
    /// cells have since been removed via [`pop_back()`][Self::pop_back].
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells the vector can hold before it needs to grow its allocation.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values in the vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the vector holds no values. It may still have a non-zero size.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of cells below [`size()`][Self::size] that hold no value.
    #[must_use]
    pub fn vacant_count(&self) -> usize {
        self.size
            .checked_sub(self.count)
            .expect("occupied cells are a subset of the assigned cells")
    }

    /// The indices of vacant cells that the next insertions will reuse, in the order they
    /// were vacated. The last one is reused first.
    #[must_use]
    pub fn free_cells(&self) -> &[usize] {
        self.free_indices.as_slice()
    }

    /// Whether `index` is below [`size()`][Self::size] and its cell holds a value.
    #[must_use]
    pub fn exist_at(&self, index: usize) -> bool {
        matches!(self.cells().get(index), Some(Some(_)))
    }

    /// The value at `index`, if the cell exists and is occupied.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.cells().get(index)?.as_ref()
    }

    /// The value at `index`, if the cell exists and is occupied.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.cells_mut().get_mut(index)?.as_mut()
    }

    /// The value at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Vacant`] if the cell at `index` holds no value.
    pub fn at(&self, index: usize) -> Result<&T> {
        match self.cells().get(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::Vacant { index }),
            None => Err(Error::OutOfRange {
                index,
                size: self.size,
            }),
        }
    }

    /// The value at `index`, for modification.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Vacant`] if the cell at `index` holds no value.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let size = self.size;

        match self.cells_mut().get_mut(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::Vacant { index }),
            None => Err(Error::OutOfRange { index, size }),
        }
    }

    /// The value at `index`, without checking that there is one.
    ///
    /// # Safety
    ///
    /// `index` must be below [`size()`][Self::size] and the cell at `index` must be occupied.
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: The caller guarantees the index is below `size`, so the cell is in bounds.
        let cell = unsafe { self.cells.add(index) };

        // SAFETY: The cell is initialized and we only hand out a shared reference.
        let cell = unsafe { cell.as_ref() };

        // SAFETY: The caller guarantees the cell is occupied.
        unsafe { cell.as_ref().unwrap_unchecked() }
    }

    /// The value at `index`, for modification, without checking that there is one.
    ///
    /// # Safety
    ///
    /// `index` must be below [`size()`][Self::size] and the cell at `index` must be occupied.
    #[must_use]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: The caller guarantees the index is below `size`, so the cell is in bounds.
        let mut cell = unsafe { self.cells.add(index) };

        // SAFETY: The cell is initialized and we hold an exclusive reference to the vector, so
        // nobody else views the cell.
        let cell = unsafe { cell.as_mut() };

        // SAFETY: The caller guarantees the cell is occupied.
        unsafe { cell.as_mut().unwrap_unchecked() }
    }

    /// Inserts a value into a vacant cell and returns its index.
    ///
    /// The most recently vacated cell is used if there is one. Otherwise the value is placed
    /// at index [`size()`][Self::size], doubling the capacity first if every allocated cell is
    /// already assigned.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let mut vector = SparseVector::new();
    ///
    /// assert_eq!(vector.push_free("a"), 0);
    /// assert_eq!(vector.push_free("b"), 1);
    /// assert_eq!(vector.push_free("c"), 2);
    /// assert_eq!(vector.capacity(), 4);
    /// ```
    pub fn push_free(&mut self, value: T) -> usize {
        #[cfg(debug_assertions)]
        self.integrity_check();

        let index = self.claim_index();

        let cell = self
            .cells_mut()
            .get_mut(index)
            .expect("claimed index is always below the logical size");

        debug_assert!(
            cell.is_none(),
            "claimed cell {index} was occupied in sparse vector of {}",
            type_name::<T>()
        );

        *cell = Some(value);

        self.count = self
            .count
            .checked_add(1)
            .expect("count is bounded by size, which fits in usize");

        index
    }

    /// Inserts the value produced by `make` into a vacant cell and returns its index.
    ///
    /// The cell is picked exactly like [`push_free()`][Self::push_free] picks it. If `make`
    /// panics, the vector is left unchanged.
    pub fn emplace_free(&mut self, make: impl FnOnce() -> T) -> usize {
        self.push_free(make())
    }

    /// Picks the cell for the next insertion, growing the allocation if needed.
    fn claim_index(&mut self) -> usize {
        if let Some(index) = self.free_indices.pop() {
            trace!(index, "reusing vacant cell");
            return index;
        }

        if self.size == self.capacity {
            self.reallocate(self.grown_capacity());
        }

        let index = self.size;

        self.size = index
            .checked_add(1)
            .expect("size is bounded by capacity, which fits in usize");

        index
    }

    fn grown_capacity(&self) -> usize {
        if self.capacity == 0 {
            return DEFAULT_CAPACITY;
        }

        self.capacity
            .checked_mul(2)
            .expect("sparse vector capacity overflow")
    }

    /// Moves every cell into a new allocation of `new_capacity` cells.
    fn reallocate(&mut self, new_capacity: usize) {
        assert!(
            new_capacity > self.capacity,
            "reallocate({new_capacity}) must grow beyond the current capacity {} of sparse vector of {}",
            self.capacity,
            type_name::<T>()
        );

        debug!(
            old_capacity = self.capacity,
            new_capacity,
            size = self.size,
            "relocating sparse vector cells"
        );

        let new_cells = Self::allocate_cells(&self.storage, new_capacity);

        // SAFETY: Both allocations hold at least `size` cells and are distinct, so the ranges
        // do not overlap. The copy moves the values; the old cells are never read again.
        unsafe {
            ptr::copy_nonoverlapping(self.cells.as_ptr(), new_cells.as_ptr(), self.size);
        }

        // SAFETY: `size <= capacity < new_capacity`, so the range is within the new allocation.
        unsafe {
            Self::mark_vacant(new_cells, self.size..new_capacity);
        }

        let old_cells = mem::replace(&mut self.cells, new_cells);
        let old_capacity = mem::replace(&mut self.capacity, new_capacity);

        // SAFETY: The old block came from `allocate_cells()` with the old capacity and its
        // values were all moved into the new block above.
        unsafe {
            Self::release_cells(&self.storage, old_cells, old_capacity);
        }
    }

    /// Drops the value at `index` and makes its cell available for reuse.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Vacant`] if the cell at `index` holds no value.
    pub fn erase_at(&mut self, index: usize) -> Result<()> {
        drop(self.remove(index)?);
        Ok(())
    }

    /// Takes the value at `index` out of the vector and makes its cell available for reuse.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Vacant`] if the cell at `index` holds no value.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        let size = self.size;

        let value = self
            .cells_mut()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, size })?
            .take()
            .ok_or(Error::Vacant { index })?;

        self.free_indices.push(index);

        self.count = self
            .count
            .checked_sub(1)
            .expect("the cell was occupied so count must be non-zero");

        Ok(value)
    }

    /// Shrinks the logical size by one, returning the value of the last cell if it was occupied.
    ///
    /// Unlike [`erase_at()`][Self::erase_at], the removed cell is not made available for reuse:
    /// it is no longer below the logical size. If the cell was vacant, its index is withdrawn
    /// from the free cells for the same reason.
    ///
    /// # Errors
    ///
    /// [`Error::Empty`] if the size is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let mut vector = SparseVector::new();
    /// vector.push_free('x');
    ///
    /// assert_eq!(vector.pop_back(), Ok(Some('x')));
    /// assert_eq!(vector.size(), 0);
    /// assert!(vector.free_cells().is_empty());
    /// ```
    pub fn pop_back(&mut self) -> Result<Option<T>> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        let last = self.size.checked_sub(1).ok_or(Error::Empty)?;

        let value = self
            .cells_mut()
            .get_mut(last)
            .expect("last index is below the logical size")
            .take();

        self.size = last;

        if value.is_some() {
            self.count = self
                .count
                .checked_sub(1)
                .expect("the cell was occupied so count must be non-zero");
        } else {
            let was_registered = self.free_indices.remove_index(last);
            debug_assert!(
                was_registered,
                "vacant cell {last} was not registered as free in sparse vector of {}",
                type_name::<T>()
            );
        }

        trace!(index = last, occupied = value.is_some(), "popped trailing cell");

        Ok(value)
    }

    /// Places `value` into the vacant cell at `index`.
    ///
    /// The index stops being one of the [`free_cells()`][Self::free_cells], so later insertions
    /// will not pick it.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Occupied`] if the cell at `index` already holds a value.
    pub fn emplace_at(&mut self, index: usize, value: T) -> Result<()> {
        self.emplace_at_with(index, || value)
    }

    /// Places the value produced by `make` into the vacant cell at `index`.
    ///
    /// `make` is only called if the cell exists and is vacant. If it panics, the vector is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index` is not below [`size()`][Self::size].
    /// [`Error::Occupied`] if the cell at `index` already holds a value.
    pub fn emplace_at_with(&mut self, index: usize, make: impl FnOnce() -> T) -> Result<()> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        match self.cells().get(index) {
            None => {
                return Err(Error::OutOfRange {
                    index,
                    size: self.size,
                });
            }
            Some(Some(_)) => return Err(Error::Occupied { index }),
            Some(None) => {}
        }

        let value = make();

        *self
            .cells_mut()
            .get_mut(index)
            .expect("bounds checked above") = Some(value);

        self.count = self
            .count
            .checked_add(1)
            .expect("count is bounded by size, which fits in usize");

        let was_registered = self.free_indices.remove_index(index);
        debug_assert!(
            was_registered,
            "vacant cell {index} was not registered as free in sparse vector of {}",
            type_name::<T>()
        );

        Ok(())
    }

    /// Fills every vacant cell below [`size()`][Self::size] with a value from `factory`, in
    /// ascending index order. Afterwards there are no free cells.
    ///
    /// If `factory` panics, the cells filled so far keep their values and the rest remain
    /// available for reuse.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let mut vector = SparseVector::new();
    /// vector.resize(3);
    ///
    /// let mut next = 0;
    /// vector.fill_free_cells(|| {
    ///     next += 1;
    ///     next
    /// });
    ///
    /// assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// assert!(vector.free_cells().is_empty());
    /// ```
    pub fn fill_free_cells(&mut self, mut factory: impl FnMut() -> T) {
        #[cfg(debug_assertions)]
        self.integrity_check();

        self.free_indices.clear();

        let mut this = scopeguard::guard_on_unwind(self, |this| this.rebuild_bookkeeping());

        let mut filled: usize = 0;

        for cell in this.cells_mut().iter_mut().filter(|cell| cell.is_none()) {
            *cell = Some(factory());

            filled = filled
                .checked_add(1)
                .expect("filled cells are bounded by size, which fits in usize");
        }

        this.count = this
            .count
            .checked_add(filled)
            .expect("count is bounded by size, which fits in usize");

        debug!(filled, "filled vacant cells");
    }

    /// Recomputes the value count and re-registers every vacant cell as free.
    fn rebuild_bookkeeping(&mut self) {
        self.free_indices.clear();
        self.count = 0;

        for index in 0..self.size {
            if self.exist_at(index) {
                self.count = self
                    .count
                    .checked_add(1)
                    .expect("count is bounded by size, which fits in usize");
            } else {
                self.free_indices.push(index);
            }
        }
    }

    /// Ensures the vector can hold at least `new_capacity` cells without growing again.
    ///
    /// Does nothing if the capacity is already sufficient; the allocation never shrinks.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity > self.capacity {
            self.reallocate(new_capacity);
        }
    }

    /// Grows the logical size to `new_size`, registering every new cell as vacant and free.
    ///
    /// Does nothing if `new_size` is not larger than the current size. Use
    /// [`pop_back()`][Self::pop_back] to remove trailing cells.
    ///
    /// # Example
    ///
    /// ```
    /// use sparse_vector::SparseVector;
    ///
    /// let mut vector = SparseVector::<u8>::new();
    /// vector.resize(5);
    ///
    /// assert_eq!(vector.size(), 5);
    /// assert_eq!(vector.free_cells(), [0, 1, 2, 3, 4]);
    /// assert!(vector.at(2).is_err());
    /// ```
    pub fn resize(&mut self, new_size: usize) {
        if new_size <= self.size {
            return;
        }

        self.reserve(new_size);

        // Cells at or beyond the old size are already vacant.
        for index in self.size..new_size {
            self.free_indices.push(index);
        }

        trace!(old_size = self.size, new_size, "resized sparse vector");

        self.size = new_size;
    }

    /// Drops every value and resets the logical size to zero. The capacity is retained.
    ///
    /// No free cells remain afterwards; insertions start again from index zero. If dropping a
    /// value panics, the remaining values are still dropped and the vector is left empty.
    pub fn clear(&mut self) {
        debug!(size = self.size, len = self.count, "clearing sparse vector");

        let size = mem::replace(&mut self.size, 0);
        self.count = 0;
        self.free_indices.clear();

        // Runs even if a destructor panics, so every cell at or beyond the new size is `None`.
        let _vacate = scopeguard::guard(self.cells, |cells| {
            // SAFETY: The first `size` cells are within the allocation and their values have
            // been dropped, so overwriting them without dropping is correct.
            unsafe {
                Self::mark_vacant(cells, 0..size);
            }
        });

        let assigned = ptr::slice_from_raw_parts_mut(self.cells.as_ptr(), size);

        // SAFETY: The first `size` cells are initialized and the vector no longer considers
        // them assigned, so this is the only view of them. They are overwritten with `None`
        // by the guard above before anything can observe them again.
        unsafe {
            ptr::drop_in_place(assigned);
        }
    }

    /// Iterates over the values in ascending index order, skipping vacant cells.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.cells(), self.count)
    }

    /// Iterates over the values in ascending index order, skipping vacant cells.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let count = self.count;
        IterMut::new(self.cells_mut(), count)
    }

    /// Iterates over `(index, value)` pairs in ascending index order, skipping vacant cells.
    pub fn iter_indexed(&self) -> IterIndexed<'_, T> {
        IterIndexed::new(self.cells(), self.count)
    }

    /// Iterates over `(index, value)` pairs in ascending index order, skipping vacant cells.
    pub fn iter_indexed_mut(&mut self) -> IterIndexedMut<'_, T> {
        let count = self.count;
        IterIndexedMut::new(self.cells_mut(), count)
    }

    /// Takes the value out of the cell at `index` without registering the cell as free.
    ///
    /// Only for owned iteration, which consumes the vector and so never inserts again.
    pub(crate) fn take_for_iteration(&mut self, index: usize) -> Option<T> {
        let value = self.cells_mut().get_mut(index)?.take()?;

        self.count = self
            .count
            .checked_sub(1)
            .expect("the cell was occupied so count must be non-zero");

        Some(value)
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        assert!(
            self.size <= self.capacity,
            "size {} exceeds capacity {} in sparse vector of {}",
            self.size,
            self.capacity,
            type_name::<T>()
        );

        let mut registered = vec![false; self.size];

        for &index in self.free_indices.as_slice() {
            let is_registered = registered.get_mut(index).unwrap_or_else(|| {
                panic!(
                    "free index {index} is not below size {} in sparse vector of {}",
                    self.size,
                    type_name::<T>()
                )
            });

            assert!(
                !*is_registered,
                "free index {index} is registered more than once in sparse vector of {}",
                type_name::<T>()
            );

            *is_registered = true;
        }

        let mut observed_count: usize = 0;

        for (index, (cell, is_registered)) in self.cells().iter().zip(&registered).enumerate() {
            match (cell.is_some(), *is_registered) {
                (true, false) => {
                    observed_count = observed_count
                        .checked_add(1)
                        .expect("bounded by size, which fits in usize");
                }
                (true, true) => panic!(
                    "occupied cell {index} is registered as free in sparse vector of {}",
                    type_name::<T>()
                ),
                (false, false) => panic!(
                    "vacant cell {index} is not registered as free in sparse vector of {}",
                    type_name::<T>()
                ),
                (false, true) => {}
            }
        }

        assert!(
            self.count == observed_count,
            "self.count {} does not match the observed occupied count {} in sparse vector of {}",
            self.count,
            observed_count,
            type_name::<T>()
        );
    }
}

impl<T, S, F> Drop for SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        // Every allocated cell is initialized and the ones beyond the logical size are `None`,
        // so dropping all of them drops exactly the remaining values.
        let buffer = ptr::slice_from_raw_parts_mut(self.cells.as_ptr(), self.capacity);

        // SAFETY: The slice covers initialized cells that nothing else references and that we
        // never touch again.
        unsafe {
            ptr::drop_in_place(buffer);
        }

        // SAFETY: The block came from `allocate_cells()` with this capacity and its values were
        // dropped above.
        unsafe {
            Self::release_cells(&self.storage, self.cells, self.capacity);
        }

        // We do this check at the end so we clean up the memory first. If we are already
        // panicking, we do not want to panic again and obscure the original panic.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                was_empty,
                "dropped a non-empty sparse vector of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}

// SAFETY: The raw cell pointer is owned exclusively by the vector, so the vector can move
// between threads as long as its values and collaborators can.
unsafe impl<T, S, F> Send for SparseVector<T, S, F>
where
    T: Send,
    S: StorageProvider + Send,
    F: FreeIndexStore + Send,
{
}

// SAFETY: Shared references to the vector only hand out shared references to the values.
unsafe impl<T, S, F> Sync for SparseVector<T, S, F>
where
    T: Sync,
    S: StorageProvider + Sync,
    F: FreeIndexStore + Sync,
{
}

impl<T> Default for SparseVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, F> Clone for SparseVector<T, S, F>
where
    T: Clone,
    S: StorageProvider + Clone,
    F: FreeIndexStore + Clone,
{
    /// Clones every value into a new allocation of the same capacity. Vacant cells stay vacant
    /// and the free cells are reused in the same order as in the original.
    fn clone(&self) -> Self {
        let mut clone = Self::new_inner(
            self.capacity,
            self.storage.clone(),
            self.free_indices.clone(),
            self.drop_policy,
        );

        for (target, cell) in clone.buffer_mut().iter_mut().zip(self.cells()) {
            target.clone_from(cell);
        }

        clone.size = self.size;
        clone.count = self.count;

        clone
    }
}

impl<T, S, F> PartialEq for SparseVector<T, S, F>
where
    T: PartialEq,
    S: StorageProvider,
    F: FreeIndexStore,
{
    /// Two vectors are equal if they have the same size and every cell has the same occupancy
    /// and value. Capacity and the order of the free cells are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.cells() == other.cells()
    }
}

impl<T, S, F> Eq for SparseVector<T, S, F>
where
    T: Eq,
    S: StorageProvider,
    F: FreeIndexStore,
{
}

impl<T, S, F> fmt::Debug for SparseVector<T, S, F>
where
    T: fmt::Debug,
    S: StorageProvider,
    F: FreeIndexStore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseVector")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("len", &self.count)
            .field("free_cells", &self.free_cells())
            .field("cells", &self.cells())
            .finish_non_exhaustive()
    }
}

impl<T, S, F> Index<usize> for SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    type Output = T;

    /// # Panics
    ///
    /// Panics if the index is out of range or the cell at the index is vacant.
    fn index(&self, index: usize) -> &Self::Output {
        match self.at(index) {
            Ok(value) => value,
            Err(error) => panic!("[{index}] in sparse vector of {}: {error}", type_name::<T>()),
        }
    }
}

impl<T, S, F> IndexMut<usize> for SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    /// # Panics
    ///
    /// Panics if the index is out of range or the cell at the index is vacant.
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.at_mut(index) {
            Ok(value) => value,
            Err(error) => panic!("[{index}] in sparse vector of {}: {error}", type_name::<T>()),
        }
    }
}

impl<T> From<Vec<T>> for SparseVector<T> {
    /// Creates a vector whose size and capacity both equal the number of values, with every
    /// cell occupied.
    fn from(values: Vec<T>) -> Self {
        let len = values.len();

        let mut vector = Self::builder().initial_capacity(len).build();

        for (cell, value) in vector.buffer_mut().iter_mut().zip(values) {
            *cell = Some(value);
        }

        vector.size = len;
        vector.count = len;

        vector
    }
}

impl<T, const N: usize> From<[T; N]> for SparseVector<T> {
    fn from(values: [T; N]) -> Self {
        Self::from(Vec::from(values))
    }
}

impl<T> FromIterator<T> for SparseVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T, S, F> Extend<T> for SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_free(value);
        }
    }
}

impl<'a, T, S, F> IntoIterator for &'a SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, S, F> IntoIterator for &'a mut SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, S, F> IntoIterator for SparseVector<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    type Item = T;
    type IntoIter = IntoIter<T, S, F>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::unwrap_used,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use smallvec::SmallVec;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SparseVector<u32>: Send, Sync, Clone, Default, fmt::Debug);
    assert_not_impl_any!(SparseVector<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(SparseVector<Cell<u32>>: Sync);

    /// Counts how many times values created through it have been dropped.
    #[derive(Clone, Default)]
    struct DropCounter {
        drops: Rc<Cell<usize>>,
    }

    impl DropCounter {
        fn item(&self) -> Droppable {
            Droppable {
                drops: Rc::clone(&self.drops),
            }
        }

        fn drops(&self) -> usize {
            self.drops.get()
        }
    }

    struct Droppable {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Droppable {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn smoke_test() {
        let mut vector = SparseVector::new();

        let a = vector.push_free(42);
        let b = vector.push_free(43);
        let c = vector.push_free(44);

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(vector.len(), 3);
        assert_eq!(vector.size(), 3);

        vector.erase_at(b).unwrap();

        assert_eq!(vector.len(), 2);
        assert_eq!(vector.size(), 3);
        assert_eq!(vector.vacant_count(), 1);

        let d = vector.push_free(45);
        assert_eq!(d, b);

        assert_eq!(vector[a], 42);
        assert_eq!(vector[c], 44);
        assert_eq!(vector[d], 45);
    }

    #[test]
    fn new_vector_has_default_capacity() {
        let vector = SparseVector::<u32>::new();

        assert_eq!(vector.size(), 0);
        assert_eq!(vector.capacity(), DEFAULT_CAPACITY);
        assert!(vector.is_empty());
        assert!(vector.free_cells().is_empty());
        assert_eq!(vector.iter().count(), 0);
    }

    #[test]
    fn reuses_most_recently_freed_first() {
        let mut vector = SparseVector::new();

        for value in 0..5 {
            vector.push_free(value);
        }

        vector.erase_at(1).unwrap();
        vector.erase_at(3).unwrap();

        assert_eq!(vector.free_cells(), [1, 3]);

        assert_eq!(vector.push_free(30), 3);
        assert_eq!(vector.push_free(10), 1);
        assert_eq!(vector.push_free(5), 5);
    }

    #[test]
    fn growth_doubles_capacity_and_preserves_cells() {
        let mut vector = SparseVector::new();

        vector.push_free("a".to_string());
        vector.push_free("b".to_string());
        assert_eq!(vector.capacity(), 2);

        vector.erase_at(0).unwrap();

        // The free cell is reused, so no growth happens yet.
        vector.push_free("c".to_string());
        assert_eq!(vector.capacity(), 2);

        vector.push_free("d".to_string());
        assert_eq!(vector.capacity(), 4);

        vector.push_free("e".to_string());
        vector.erase_at(3).unwrap();
        vector.push_free("f".to_string());
        vector.push_free("g".to_string());
        assert_eq!(vector.capacity(), 8);

        assert_eq!(vector.at(0).unwrap(), "c");
        assert_eq!(vector.at(1).unwrap(), "b");
        assert_eq!(vector.at(2).unwrap(), "d");
        assert_eq!(vector.at(3).unwrap(), "f");
        assert_eq!(vector.at(4).unwrap(), "g");
    }

    #[test]
    fn growth_keeps_vacant_cells_vacant() {
        let mut vector = SparseVector::new();
        vector.resize(2);

        vector.emplace_at(1, 11).unwrap();
        assert_eq!(vector.free_cells(), [0]);

        vector.reserve(16);

        assert!(!vector.exist_at(0));
        assert_eq!(vector.at(1), Ok(&11));
        assert_eq!(vector.free_cells(), [0]);
        assert_eq!(vector.capacity(), 16);
    }

    #[test]
    fn erase_out_of_range_is_error() {
        let mut vector = SparseVector::new();
        vector.push_free(1);

        assert_eq!(
            vector.erase_at(1),
            Err(Error::OutOfRange { index: 1, size: 1 })
        );
        assert_eq!(vector.len(), 1);
    }

    #[test]
    fn erase_vacant_is_error() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.erase_at(0).unwrap();

        assert_eq!(vector.erase_at(0), Err(Error::Vacant { index: 0 }));
        assert_eq!(vector.free_cells(), [0]);
    }

    #[test]
    fn remove_returns_value() {
        let mut vector = SparseVector::new();
        let index = vector.push_free("hello".to_string());

        assert_eq!(vector.remove(index).unwrap(), "hello");
        assert!(!vector.exist_at(index));
        assert_eq!(vector.remove(index), Err(Error::Vacant { index }));
    }

    #[test]
    fn at_distinguishes_out_of_range_and_vacant() {
        let mut vector = SparseVector::<u8>::new();
        vector.resize(3);

        assert_eq!(vector.at(2), Err(Error::Vacant { index: 2 }));
        assert_eq!(vector.at(3), Err(Error::OutOfRange { index: 3, size: 3 }));
        assert_eq!(
            vector.at_mut(9).unwrap_err(),
            Error::OutOfRange { index: 9, size: 3 }
        );
        assert_eq!(vector.get(2), None);
        assert_eq!(vector.get(3), None);
    }

    #[test]
    fn at_mut_modifies_in_place() {
        let mut vector = SparseVector::new();
        let index = vector.push_free(1);

        *vector.at_mut(index).unwrap() += 10;
        *vector.get_mut(index).unwrap() += 100;
        vector[index] += 1000;

        assert_eq!(vector[index], 1111);
    }

    #[test]
    fn exist_at_never_fails() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.push_free(2);
        vector.erase_at(0).unwrap();

        assert!(!vector.exist_at(0));
        assert!(vector.exist_at(1));
        assert!(!vector.exist_at(2));
        assert!(!vector.exist_at(usize::MAX));
    }

    #[test]
    fn unchecked_access_reads_occupied_cell() {
        let mut vector = SparseVector::new();
        vector.push_free(5);
        let index = vector.push_free(6);

        // SAFETY: The index was just returned by an insertion, so the cell is occupied.
        unsafe {
            *vector.get_unchecked_mut(index) *= 2;
            assert_eq!(*vector.get_unchecked(index), 12);
        }
    }

    #[test]
    #[should_panic]
    fn index_vacant_panics() {
        let mut vector = SparseVector::<u32>::new();
        vector.resize(1);

        _ = vector[0];
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let vector = SparseVector::<u32>::new();

        _ = vector[0];
    }

    #[test]
    fn pop_back_on_empty_is_error() {
        let mut vector = SparseVector::<u32>::new();

        assert_eq!(vector.pop_back(), Err(Error::Empty));
    }

    #[test]
    fn pop_back_does_not_register_free_cell() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.push_free(2);

        assert_eq!(vector.pop_back(), Ok(Some(2)));

        assert_eq!(vector.size(), 1);
        assert!(vector.free_cells().is_empty());

        // The next insertion takes the trailing index again, as a fresh cell.
        assert_eq!(vector.push_free(3), 1);
        assert_eq!(vector.size(), 2);
    }

    #[test]
    fn pop_back_of_vacant_cell_withdraws_it_from_free_cells() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.push_free(2);
        vector.push_free(3);
        vector.erase_at(0).unwrap();
        vector.erase_at(2).unwrap();

        assert_eq!(vector.pop_back(), Ok(None));

        assert_eq!(vector.size(), 2);
        assert_eq!(vector.free_cells(), [0]);

        assert_eq!(vector.push_free(4), 0);
        assert_eq!(vector.push_free(5), 2);
    }

    #[test]
    fn resize_after_pop_back_marks_cells_free_again() {
        let mut vector = SparseVector::new();
        vector.push_free('a');
        vector.push_free('b');

        vector.pop_back().unwrap();
        vector.resize(3);

        assert_eq!(vector.free_cells(), [1, 2]);
        assert!(!vector.exist_at(1));
        assert!(!vector.exist_at(2));
        assert_eq!(vector.at(0), Ok(&'a'));
    }

    #[test]
    fn resize_smaller_is_noop() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.push_free(2);

        vector.resize(1);

        assert_eq!(vector.size(), 2);
        assert!(vector.free_cells().is_empty());
    }

    #[test]
    fn resize_grows_capacity_to_exact_size() {
        let mut vector = SparseVector::<u8>::new();
        vector.resize(5);

        assert_eq!(vector.capacity(), 5);
        assert_eq!(vector.size(), 5);
        assert_eq!(vector.vacant_count(), 5);
        assert!(vector.is_empty());
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut vector = SparseVector::<u8>::new();

        vector.reserve(10);
        assert_eq!(vector.capacity(), 10);

        vector.reserve(3);
        assert_eq!(vector.capacity(), 10);
    }

    #[test]
    fn emplace_at_fills_vacant_cell_and_withdraws_it() {
        let mut vector = SparseVector::new();
        vector.resize(3);

        vector.emplace_at(1, 7).unwrap();

        assert_eq!(vector.at(1), Ok(&7));
        assert_eq!(vector.free_cells(), [0, 2]);

        // Insertions never pick the emplaced cell.
        assert_eq!(vector.push_free(8), 2);
        assert_eq!(vector.push_free(9), 0);
        assert_eq!(vector.push_free(10), 3);
    }

    #[test]
    fn emplace_at_errors() {
        let mut vector = SparseVector::new();
        vector.push_free(1);

        assert_eq!(vector.emplace_at(0, 2), Err(Error::Occupied { index: 0 }));
        assert_eq!(
            vector.emplace_at(1, 2),
            Err(Error::OutOfRange { index: 1, size: 1 })
        );
        assert_eq!(vector.at(0), Ok(&1));
    }

    #[test]
    fn emplace_at_with_skips_factory_on_error() {
        let mut vector = SparseVector::new();
        vector.push_free(1);

        let called = Cell::new(false);

        let result = vector.emplace_at_with(0, || {
            called.set(true);
            2
        });

        assert_eq!(result, Err(Error::Occupied { index: 0 }));
        assert!(!called.get());
    }

    #[test]
    fn erase_then_emplace_round_trip() {
        let mut vector = SparseVector::new();
        vector.push_free("one");
        vector.push_free("two");

        vector.erase_at(0).unwrap();
        vector.emplace_at(0, "uno").unwrap();

        assert_eq!(vector.at(0), Ok(&"uno"));
        assert!(vector.free_cells().is_empty());
    }

    #[test]
    fn emplace_free_uses_factory() {
        let mut vector = SparseVector::new();

        let index = vector.emplace_free(|| vec![1, 2, 3]);

        assert_eq!(vector.at(index).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn emplace_free_panic_leaves_vector_unchanged() {
        let mut vector = SparseVector::new();
        vector.push_free(1);
        vector.erase_at(0).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            vector.emplace_free(|| panic!("factory failed"));
        }));

        assert!(result.is_err());
        assert_eq!(vector.free_cells(), [0]);
        assert!(vector.is_empty());
    }

    #[test]
    fn fill_free_cells_fills_in_ascending_order() {
        let mut vector = SparseVector::new();
        for value in 0..4 {
            vector.push_free(value * 10);
        }

        vector.erase_at(3).unwrap();
        vector.erase_at(1).unwrap();

        let mut next = 100;
        vector.fill_free_cells(|| {
            next += 1;
            next
        });

        assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [0, 101, 20, 102]);
        assert!(vector.free_cells().is_empty());
        assert_eq!(vector.len(), 4);
    }

    #[test]
    fn fill_free_cells_panic_keeps_remaining_cells_free() {
        let mut vector = SparseVector::new();
        vector.resize(4);

        let mut calls = 0;
        let result = catch_unwind(AssertUnwindSafe(|| {
            vector.fill_free_cells(|| {
                calls += 1;
                assert!(calls < 3, "factory exhausted");
                calls
            });
        }));

        assert!(result.is_err());
        assert_eq!(vector.len(), 2);
        assert_eq!(vector.at(0), Ok(&1));
        assert_eq!(vector.at(1), Ok(&2));
        assert_eq!(vector.free_cells(), [2, 3]);
    }

    #[test]
    fn clear_resets_size_but_keeps_capacity() {
        let mut vector = SparseVector::new();
        for value in 0..5 {
            vector.push_free(value);
        }
        vector.erase_at(2).unwrap();

        let capacity = vector.capacity();

        vector.clear();

        assert_eq!(vector.size(), 0);
        assert_eq!(vector.len(), 0);
        assert_eq!(vector.capacity(), capacity);
        assert!(vector.free_cells().is_empty());
        assert_eq!(vector.push_free(9), 0);
    }

    #[test]
    fn clear_with_panicking_destructor_leaves_vector_empty() {
        struct Fragile {
            panics_on_drop: bool,
            drops: Rc<Cell<usize>>,
        }

        impl Drop for Fragile {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
                assert!(!self.panics_on_drop, "value refused to be dropped");
            }
        }

        let drops = Rc::new(Cell::new(0));
        let fragile = |panics_on_drop| Fragile {
            panics_on_drop,
            drops: Rc::clone(&drops),
        };

        let mut vector = SparseVector::new();
        vector.push_free(fragile(true));
        vector.push_free(fragile(false));
        vector.push_free(fragile(false));

        let result = catch_unwind(AssertUnwindSafe(|| vector.clear()));

        assert!(result.is_err());
        assert_eq!(drops.get(), 3);
        assert_eq!(vector.size(), 0);
        assert!(vector.is_empty());
        assert!(vector.free_cells().is_empty());

        assert_eq!(vector.push_free(fragile(false)), 0);
        assert_eq!(vector.push_free(fragile(false)), 1);
        assert_eq!(vector.iter().count(), 2);

        drop(vector);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn values_are_dropped_exactly_once() {
        let counter = DropCounter::default();

        {
            let mut vector = SparseVector::new();

            for _ in 0..6 {
                vector.push_free(counter.item());
            }

            vector.erase_at(0).unwrap();
            assert_eq!(counter.drops(), 1);

            drop(vector.pop_back().unwrap());
            assert_eq!(counter.drops(), 2);

            // Growth relocates without dropping.
            vector.reserve(64);
            assert_eq!(counter.drops(), 2);

            vector.clear();
            assert_eq!(counter.drops(), 6);

            vector.push_free(counter.item());
            vector.push_free(counter.item());
        }

        assert_eq!(counter.drops(), 8);
    }

    #[test]
    fn clone_preserves_layout_and_free_cells() {
        let mut vector = SparseVector::new();
        for value in 0..5 {
            vector.push_free(value.to_string());
        }
        vector.erase_at(1).unwrap();
        vector.erase_at(3).unwrap();

        let mut clone = vector.clone();

        assert_eq!(clone, vector);
        assert_eq!(clone.capacity(), vector.capacity());
        assert_eq!(clone.free_cells(), vector.free_cells());
        assert_eq!(clone.len(), 3);

        clone.at_mut(0).unwrap().push('!');
        assert_eq!(vector.at(0).unwrap(), "0");
        assert_eq!(clone.push_free("x".to_string()), 3);
    }

    #[test]
    fn take_leaves_empty_default() {
        let mut vector = SparseVector::from([1, 2, 3]);

        let taken = mem::take(&mut vector);

        assert_eq!(taken.len(), 3);
        assert_eq!(vector.size(), 0);
        assert_eq!(vector.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn from_array_has_exact_size_and_capacity() {
        let vector = SparseVector::from([1, 2, 3]);

        assert_eq!(vector.size(), 3);
        assert_eq!(vector.capacity(), 3);
        assert_eq!(vector.len(), 3);
        assert!(vector.free_cells().is_empty());
    }

    #[test]
    fn empty_initializer_grows_from_zero() {
        let mut vector: SparseVector<u32> = std::iter::empty().collect();

        assert_eq!(vector.capacity(), 0);

        assert_eq!(vector.push_free(1), 0);
        assert_eq!(vector.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn extend_uses_free_cells() {
        let mut vector = SparseVector::from(vec![1, 2, 3]);
        vector.erase_at(1).unwrap();

        vector.extend([20, 40]);

        assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [1, 20, 3, 40]);
    }

    #[test]
    fn equality_compares_occupancy() {
        let mut a = SparseVector::from([1, 2]);
        let mut b = SparseVector::from([1, 2]);
        assert_eq!(a, b);

        a.erase_at(1).unwrap();
        assert_ne!(a, b);

        b.erase_at(1).unwrap();
        assert_eq!(a, b);

        b.pop_back().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_output_names_item_type() {
        let mut vector = SparseVector::new();
        vector.push_free(1_u16);

        let output = format!("{vector:?}");

        assert!(output.contains("u16"));
        assert!(output.contains("size: 1"));
    }

    #[test]
    fn smallvec_free_index_store() {
        let mut vector = SparseVector::<u32>::builder()
            .free_index_store(SmallVec::<[usize; 4]>::new())
            .build();

        for value in 0..8 {
            vector.push_free(value);
        }
        for index in [1, 3, 5, 7] {
            vector.erase_at(index).unwrap();
        }

        assert_eq!(vector.free_cells(), [1, 3, 5, 7]);
        assert_eq!(vector.push_free(70), 7);
    }

    #[test]
    fn zero_sized_values() {
        let mut vector = SparseVector::new();

        for _ in 0..10 {
            vector.push_free(());
        }
        vector.erase_at(4).unwrap();

        assert_eq!(vector.len(), 9);
        assert_eq!(vector.push_free(()), 4);
        assert_eq!(vector.iter().count(), 10);
    }

    #[test]
    #[should_panic]
    fn drop_item_with_forbidden_to_drop_policy_panics() {
        let mut vector = SparseVector::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        vector.push_free(123);
    }

    #[test]
    fn drop_itemless_with_forbidden_to_drop_policy_ok() {
        let mut vector = SparseVector::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        let index = vector.push_free(123);
        vector.erase_at(index).unwrap();
    }

    #[test]
    fn in_refcell_works_fine() {
        let vector = RefCell::new(SparseVector::new());

        {
            let mut vector = vector.borrow_mut();
            vector.push_free(1);
            vector.push_free(2);
        }

        assert_eq!(vector.borrow().len(), 2);
    }
}
