/// Determines what happens to the values still held by a sparse vector when it is dropped.
///
/// By default, the vector drops its values when it is dropped.
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
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The vector drops its values when the vector is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The vector panics if it still holds values when it is dropped.
    ///
    /// Useful when the owner of the vector is expected to hand every value off (e.g. via
    /// [`remove()`][crate::SparseVector::remove]) before the vector goes away, and a leftover
    /// value indicates a bookkeeping bug.
    MustNotDropItems,
}
