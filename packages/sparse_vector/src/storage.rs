use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::ptr::NonNull;

/// Provides the raw memory that a [`SparseVector`][crate::SparseVector] keeps its cells in.
///
/// The vector asks for one block per capacity level and returns the previous block once its
/// cells have been relocated into the new one. The vector never requests a zero-sized block.
///
/// Allocation failure is not reported to the vector: an implementation that cannot satisfy a
/// request must diverge (e.g. via [`handle_alloc_error`]), exactly as [`GlobalStorage`] does.
///
/// # Safety
///
/// Implementations must return a pointer that is valid for reads and writes of `layout.size()`
/// bytes, aligned to `layout.align()`, and not aliased by any other live allocation until it is
/// passed back to [`deallocate()`][Self::deallocate].
pub unsafe trait StorageProvider {
    /// Allocates a block of memory described by `layout`.
    ///
    /// `layout` is never zero-sized.
    #[must_use]
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// Releases a block previously returned by [`allocate()`][Self::allocate].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate()` on this provider (or a clone of it) with
    /// the same `layout`, and must not have been deallocated already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// A [`StorageProvider`] that forwards to the global allocator.
///
/// Allocation failure terminates the process via [`handle_alloc_error`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GlobalStorage;

// SAFETY: The global allocator upholds the contract for any non-zero-sized layout, and we
// diverge instead of returning a null pointer.
unsafe impl StorageProvider for GlobalStorage {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        debug_assert!(layout.size() > 0, "zero-sized storage was requested");

        // SAFETY: The layout is not zero-sized, as promised by the trait contract.
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr).unwrap_or_else(|| handle_alloc_error(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Forwarding the caller's guarantee that the pointer came from `alloc` with
        // this same layout.
        unsafe {
            dealloc(ptr.as_ptr(), layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(GlobalStorage: Send, Sync, Copy, std::fmt::Debug);

    #[test]
    fn allocate_and_deallocate_round_trip() {
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = GlobalStorage.allocate(layout);

        assert_eq!(ptr.as_ptr().align_offset(layout.align()), 0);

        // SAFETY: We just allocated it with this layout, so it is valid for writes.
        unsafe {
            ptr.cast::<u64>().write(1234);
            assert_eq!(ptr.cast::<u64>().read(), 1234);
        }

        // SAFETY: Allocated above with the same layout, deallocated exactly once.
        unsafe {
            GlobalStorage.deallocate(ptr, layout);
        }
    }
}
