use std::iter::{Enumerate, FusedIterator};
use std::{fmt, slice};

use crate::{FreeIndexStore, SparseVector, StorageProvider};

/// Iterator over the values of a [`SparseVector`], in ascending index order.
///
/// Created by [`SparseVector::iter()`].
pub struct Iter<'a, T> {
    cells: slice::Iter<'a, Option<T>>,

    /// Number of values not yet yielded.
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(cells: &'a [Option<T>], remaining: usize) -> Self {
        Self {
            cells: cells.iter(),
            remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.cells.by_ref().find_map(Option::as_ref)?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let value = self.cells.by_ref().rev().find_map(Option::as_ref)?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Iterator over the values of a [`SparseVector`], in ascending index order, for modification.
///
/// Created by [`SparseVector::iter_mut()`].
pub struct IterMut<'a, T> {
    cells: slice::IterMut<'a, Option<T>>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(cells: &'a mut [Option<T>], remaining: usize) -> Self {
        Self {
            cells: cells.iter_mut(),
            remaining,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.cells.by_ref().find_map(Option::as_mut)?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let value = self.cells.by_ref().rev().find_map(Option::as_mut)?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(value)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(index, value)` pairs of a [`SparseVector`], in ascending index order.
///
/// Created by [`SparseVector::iter_indexed()`].
pub struct IterIndexed<'a, T> {
    cells: Enumerate<slice::Iter<'a, Option<T>>>,
    remaining: usize,
}

impl<'a, T> IterIndexed<'a, T> {
    pub(crate) fn new(cells: &'a [Option<T>], remaining: usize) -> Self {
        Self {
            cells: cells.iter().enumerate(),
            remaining,
        }
    }
}

impl<'a, T> Iterator for IterIndexed<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self
            .cells
            .by_ref()
            .find_map(|(index, cell)| cell.as_ref().map(|value| (index, value)))?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterIndexed<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self
            .cells
            .by_ref()
            .rev()
            .find_map(|(index, cell)| cell.as_ref().map(|value| (index, value)))?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(item)
    }
}

impl<T> ExactSizeIterator for IterIndexed<'_, T> {}
impl<T> FusedIterator for IterIndexed<'_, T> {}

impl<T> Clone for IterIndexed<'_, T> {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T> fmt::Debug for IterIndexed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterIndexed")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(index, value)` pairs of a [`SparseVector`], in ascending index order, for
/// modification.
///
/// Created by [`SparseVector::iter_indexed_mut()`].
pub struct IterIndexedMut<'a, T> {
    cells: Enumerate<slice::IterMut<'a, Option<T>>>,
    remaining: usize,
}

impl<'a, T> IterIndexedMut<'a, T> {
    pub(crate) fn new(cells: &'a mut [Option<T>], remaining: usize) -> Self {
        Self {
            cells: cells.iter_mut().enumerate(),
            remaining,
        }
    }
}

impl<'a, T> Iterator for IterIndexedMut<'a, T> {
    type Item = (usize, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self
            .cells
            .by_ref()
            .find_map(|(index, cell)| cell.as_mut().map(|value| (index, value)))?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterIndexedMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self
            .cells
            .by_ref()
            .rev()
            .find_map(|(index, cell)| cell.as_mut().map(|value| (index, value)))?;

        self.remaining = self
            .remaining
            .checked_sub(1)
            .expect("yielded more values than the vector holds");

        Some(item)
    }
}

impl<T> ExactSizeIterator for IterIndexedMut<'_, T> {}
impl<T> FusedIterator for IterIndexedMut<'_, T> {}

impl<T> fmt::Debug for IterIndexedMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterIndexedMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Owning iterator over the values of a [`SparseVector`], in ascending index order.
///
/// Created by the [`IntoIterator`] implementation of [`SparseVector`]. Values not yet yielded
/// when the iterator is dropped are dropped with it, subject to the vector's
/// [drop policy][crate::DropPolicy].
pub struct IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    vector: SparseVector<T, S, F>,

    /// Next index to look at from the front.
    front: usize,

    /// One past the next index to look at from the back.
    back: usize,
}

impl<T, S, F> IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    pub(crate) fn new(vector: SparseVector<T, S, F>) -> Self {
        let back = vector.size();

        Self {
            vector,
            front: 0,
            back,
        }
    }
}

impl<T, S, F> Iterator for IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            let index = self.front;

            self.front = index
                .checked_add(1)
                .expect("bounded by back, which fits in usize");

            if let Some(value) = self.vector.take_for_iteration(index) {
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.vector.len(), Some(self.vector.len()))
    }
}

impl<T, S, F> DoubleEndedIterator for IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            let index = self
                .back
                .checked_sub(1)
                .expect("bounded below by front, which is at least zero");

            self.back = index;

            if let Some(value) = self.vector.take_for_iteration(index) {
                return Some(value);
            }
        }

        None
    }
}

impl<T, S, F> ExactSizeIterator for IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
}

impl<T, S, F> FusedIterator for IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
}

impl<T, S, F> fmt::Debug for IntoIter<T, S, F>
where
    S: StorageProvider,
    F: FreeIndexStore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.vector.len())
            .field("front", &self.front)
            .field("back", &self.back)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::{DropPolicy, SparseVector};

    fn with_holes() -> SparseVector<u32> {
        let mut vector = SparseVector::new();

        for value in 0..8 {
            vector.push_free(value);
        }

        for index in [0, 3, 4, 7] {
            vector.erase_at(index).unwrap();
        }

        vector
    }

    #[test]
    fn iter_skips_vacant_cells() {
        let vector = with_holes();

        assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [1, 2, 5, 6]);
        assert_eq!(vector.iter().len(), 4);
    }

    #[test]
    fn iter_is_restartable() {
        let vector = with_holes();

        let first: Vec<_> = vector.iter().collect();
        let second: Vec<_> = (&vector).into_iter().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn iter_from_both_ends() {
        let vector = with_holes();
        let mut iter = vector.iter();

        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_over_only_vacant_cells_is_empty() {
        let mut vector = SparseVector::<u32>::new();
        vector.resize(4);

        assert_eq!(vector.iter().next(), None);
        assert_eq!(vector.iter().next_back(), None);
    }

    #[test]
    fn iter_mut_modifies_values() {
        let mut vector = with_holes();

        for value in &mut vector {
            *value *= 10;
        }

        assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [10, 20, 50, 60]);
    }

    #[test]
    fn iter_indexed_reports_indices() {
        let vector = with_holes();

        assert_eq!(
            vector.iter_indexed().collect::<Vec<_>>(),
            [(1, &1), (2, &2), (5, &5), (6, &6)]
        );
        assert_eq!(vector.iter_indexed().next_back(), Some((6, &6)));
    }

    #[test]
    fn iter_indexed_mut_modifies_values() {
        let mut vector = with_holes();

        for (index, value) in vector.iter_indexed_mut() {
            *value += u32::try_from(index).unwrap() * 100;
        }

        assert_eq!(vector[5], 505);
        assert_eq!(vector.iter_indexed_mut().rev().next().map(|(index, _)| index), Some(6));
    }

    #[test]
    fn into_iter_yields_owned_values() {
        let vector = with_holes();

        let mut iter = vector.into_iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next_back(), Some(6));
        assert_eq!(iter.collect::<Vec<_>>(), [1, 2, 5]);
    }

    #[test]
    fn into_iter_drops_unyielded_values() {
        struct Droppable(Rc<Cell<usize>>);

        impl Drop for Droppable {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));

        let mut vector = SparseVector::new();
        for _ in 0..4 {
            vector.push_free(Droppable(Rc::clone(&drops)));
        }

        let mut iter = vector.into_iter();
        drop(iter.next());
        assert_eq!(drops.get(), 1);

        drop(iter);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn fully_consumed_into_iter_satisfies_strict_drop_policy() {
        let mut vector = SparseVector::<String>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        vector.push_free("a".to_string());
        vector.push_free("b".to_string());

        assert_eq!(vector.into_iter().collect::<Vec<_>>(), ["a", "b"]);
    }
}
