use smallvec::{Array, SmallVec};

/// Stack of vacant cell indices that a [`SparseVector`][crate::SparseVector] hands out again
/// on insertion.
///
/// The vector pushes an index when it vacates a cell and pops the most recently pushed index
/// when it needs a cell to fill, so any stack-like collection of `usize` can serve as the store.
/// [`Vec<usize>`] is the default; [`SmallVec`] keeps a few indices inline.
pub trait FreeIndexStore {
    /// Appends an index to the end of the store.
    fn push(&mut self, index: usize);

    /// Removes and returns the index at the end of the store, if any.
    fn pop(&mut self) -> Option<usize>;

    /// Removes every index from the store.
    fn clear(&mut self);

    /// The indices currently in the store, oldest first.
    fn as_slice(&self) -> &[usize];

    /// Removes `index` from the store, wherever it is, preserving the order of the rest.
    ///
    /// Returns whether the index was present.
    fn remove_index(&mut self, index: usize) -> bool;

    /// Number of indices in the store.
    #[must_use]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the store holds no indices.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl FreeIndexStore for Vec<usize> {
    fn push(&mut self, index: usize) {
        Self::push(self, index);
    }

    fn pop(&mut self) -> Option<usize> {
        Self::pop(self)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn as_slice(&self) -> &[usize] {
        self
    }

    fn remove_index(&mut self, index: usize) -> bool {
        // Searching from the end: the index we look for is usually a recent one.
        match self.iter().rposition(|&candidate| candidate == index) {
            Some(position) => {
                self.remove(position);
                true
            }
            None => false,
        }
    }
}

impl<A> FreeIndexStore for SmallVec<A>
where
    A: Array<Item = usize>,
{
    fn push(&mut self, index: usize) {
        Self::push(self, index);
    }

    fn pop(&mut self) -> Option<usize> {
        Self::pop(self)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn as_slice(&self) -> &[usize] {
        self
    }

    fn remove_index(&mut self, index: usize) -> bool {
        match self.iter().rposition(|&candidate| candidate == index) {
            Some(position) => {
                self.remove(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_stack_discipline<F: FreeIndexStore + Default>() {
        let mut store = F::default();
        assert!(store.is_empty());

        store.push(3);
        store.push(1);
        store.push(4);

        assert_eq!(store.len(), 3);
        assert_eq!(store.as_slice(), &[3, 1, 4]);

        assert_eq!(store.pop(), Some(4));
        assert_eq!(store.pop(), Some(1));

        store.push(9);
        assert_eq!(store.pop(), Some(9));
        assert_eq!(store.pop(), Some(3));
        assert_eq!(store.pop(), None);
        assert!(store.is_empty());
    }

    fn exercise_remove_index<F: FreeIndexStore + Default>() {
        let mut store = F::default();
        store.push(5);
        store.push(6);
        store.push(7);

        assert!(store.remove_index(6));
        assert!(!store.remove_index(6));
        assert_eq!(store.as_slice(), &[5, 7]);

        store.clear();
        assert!(store.is_empty());
        assert!(!store.remove_index(5));
    }

    #[test]
    fn vec_is_a_stack() {
        exercise_stack_discipline::<Vec<usize>>();
    }

    #[test]
    fn vec_removes_arbitrary_index() {
        exercise_remove_index::<Vec<usize>>();
    }

    #[test]
    fn smallvec_is_a_stack() {
        exercise_stack_discipline::<SmallVec<[usize; 2]>>();
    }

    #[test]
    fn smallvec_removes_arbitrary_index() {
        exercise_remove_index::<SmallVec<[usize; 2]>>();
    }
}
