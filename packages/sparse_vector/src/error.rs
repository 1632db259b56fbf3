use thiserror::Error;

/// Errors reported by fallible [`SparseVector`][crate::SparseVector] operations.
///
/// A failed operation never modifies the vector.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The index is not below the logical size of the vector.
    #[error("index {index} is out of range for a sparse vector of size {size}")]
    OutOfRange {
        /// The index the caller asked for.
        index: usize,

        /// The logical size of the vector at the time of the call.
        size: usize,
    },

    /// The operation needs a vacant cell but the cell at the index holds a value.
    #[error("cell {index} is already occupied")]
    Occupied {
        /// The index of the occupied cell.
        index: usize,
    },

    /// The operation needs an occupied cell but the cell at the index is vacant.
    #[error("cell {index} is vacant")]
    Vacant {
        /// The index of the vacant cell.
        index: usize,
    },

    /// The vector has a logical size of zero.
    #[error("sparse vector is empty")]
    Empty,
}

/// A specialized `Result` type for sparse vector operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, std::error::Error);

    #[test]
    fn messages_name_the_index() {
        let error = Error::OutOfRange { index: 7, size: 3 };
        assert_eq!(
            error.to_string(),
            "index 7 is out of range for a sparse vector of size 3"
        );

        assert_eq!(Error::Occupied { index: 2 }.to_string(), "cell 2 is already occupied");
        assert_eq!(Error::Vacant { index: 5 }.to_string(), "cell 5 is vacant");
        assert_eq!(Error::Empty.to_string(), "sparse vector is empty");
    }
}
