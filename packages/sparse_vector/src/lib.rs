//! A growable vector with stable indices that recycles the cells of removed values.
//!
//! This crate provides [`SparseVector`], an array-backed object pool: every inserted value is
//! assigned an index that stays valid until the value is removed, no matter what else is
//! inserted or removed in the meantime. Removing a value leaves a vacant cell behind instead of
//! shifting later values down, and the next insertion fills the most recently vacated cell.
//!
//! # Key Features
//!
//! - **Stable indices**: Values never change index while they are in the vector
//! - **Cell reuse**: Vacated cells are handed out again, most recently vacated first
//! - **Amortized growth**: The allocation doubles when every cell is assigned
//! - **Occupancy-aware iteration**: Iterators visit occupied cells only, in index order
//! - **Pluggable collaborators**: Bring your own [`StorageProvider`] or [`FreeIndexStore`]
//! - **Flexible drop policies**: Configure behavior when the vector is dropped with values left
//!
//! # Size versus length
//!
//! The [`size()`][SparseVector::size] of a vector counts every cell that has been assigned an
//! index, occupied or vacant. The [`len()`][SparseVector::len] counts values. Cells can be
//! assigned without values via [`resize()`][SparseVector::resize] and later filled via
//! [`emplace_at()`][SparseVector::emplace_at] or
//! [`fill_free_cells()`][SparseVector::fill_free_cells].
//!
//! # Examples
//!
//! ## Basic usage
//!
//! ```rust
//! use sparse_vector::SparseVector;
//!
//! let mut vector = SparseVector::new();
//!
//! let first = vector.push_free("first".to_string());
//! let second = vector.push_free("second".to_string());
//!
//! assert_eq!(vector.at(first).unwrap(), "first");
//!
//! // Removing a value does not disturb the others.
//! vector.erase_at(first).unwrap();
//! assert_eq!(vector.at(second).unwrap(), "second");
//!
//! // The vacated cell is reused.
//! assert_eq!(vector.push_free("third".to_string()), first);
//! ```
//!
//! ## Reserving cells and filling them later
//!
//! ```rust
//! use sparse_vector::{Error, SparseVector};
//!
//! let mut vector = SparseVector::new();
//! vector.resize(5);
//!
//! assert_eq!(vector.at(2), Err(Error::Vacant { index: 2 }));
//!
//! vector.emplace_at(2, 'c').unwrap();
//! vector.fill_free_cells(|| '-');
//!
//! assert_eq!(vector.iter().collect::<String>(), "--c--");
//! ```
//!
//! ## Trailing cells
//!
//! ```rust
//! use sparse_vector::SparseVector;
//!
//! let mut vector = SparseVector::from([1, 2, 3]);
//!
//! // Popping shrinks the size; the popped index is not offered for reuse...
//! assert_eq!(vector.pop_back(), Ok(Some(3)));
//! assert!(vector.free_cells().is_empty());
//!
//! // ...but is assigned again as a fresh cell by the next insertion.
//! assert_eq!(vector.push_free(4), 2);
//! ```

mod builder;
mod drop_policy;
mod error;
mod free_index_store;
mod iter;
mod sparse_vector;
mod storage;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use free_index_store::*;
pub use iter::*;
pub(crate) use sparse_vector::DEFAULT_CAPACITY;
pub use sparse_vector::SparseVector;
pub use storage::*;
