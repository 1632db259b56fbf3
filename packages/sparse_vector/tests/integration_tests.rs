//! Integration tests for the `sparse_vector` package.
//!
//! These exercise `SparseVector` through its public API only: index stability, reuse of
//! vacated cells, growth and occupancy-aware iteration under mixed workloads.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]

use std::collections::BTreeMap;

use sparse_vector::{Error, SparseVector};

/// Applies the same operations to a `SparseVector` and to a map of the expected contents.
struct Model {
    vector: SparseVector<u64>,
    expected: BTreeMap<usize, u64>,
}

impl Model {
    fn new() -> Self {
        Self {
            vector: SparseVector::new(),
            expected: BTreeMap::new(),
        }
    }

    fn insert(&mut self, value: u64) -> usize {
        let index = self.vector.push_free(value);
        assert!(
            self.expected.insert(index, value).is_none(),
            "index {index} was handed out while still occupied"
        );
        index
    }

    fn erase(&mut self, index: usize) {
        self.vector.erase_at(index).unwrap();
        self.expected.remove(&index).unwrap();
    }

    fn verify(&self) {
        for (&index, &value) in &self.expected {
            assert_eq!(self.vector.at(index), Ok(&value));
        }

        assert_eq!(
            self.vector.iter().copied().collect::<Vec<_>>(),
            self.expected.values().copied().collect::<Vec<_>>()
        );

        assert_eq!(
            self.vector
                .iter_indexed()
                .map(|(index, &value)| (index, value))
                .collect::<Vec<_>>(),
            self.expected
                .iter()
                .map(|(&index, &value)| (index, value))
                .collect::<Vec<_>>()
        );

        assert_eq!(self.vector.len(), self.expected.len());
    }
}

#[test]
fn scenario_reuse_after_erase() {
    let mut vector = SparseVector::new();

    assert_eq!(vector.push_free(10), 0);
    assert_eq!(vector.push_free(20), 1);

    vector.erase_at(0).unwrap();

    assert_eq!(vector.push_free(30), 0);
    assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [30, 20]);
}

#[test]
fn scenario_growth_from_default_capacity() {
    let mut vector = SparseVector::new();
    assert_eq!(vector.capacity(), 2);

    let indices: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|value| vector.push_free(value))
        .collect();

    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(vector.capacity(), 4);

    assert_eq!(vector.at(0), Ok(&"a"));
    assert_eq!(vector.at(1), Ok(&"b"));
    assert_eq!(vector.at(2), Ok(&"c"));
}

#[test]
fn scenario_resize_then_fill() {
    let mut vector = SparseVector::new();
    vector.resize(5);

    assert_eq!(vector.free_cells(), [0, 1, 2, 3, 4]);
    assert_eq!(vector.at(2), Err(Error::Vacant { index: 2 }));

    vector.fill_free_cells(|| 7);

    assert_eq!(vector.iter().copied().collect::<Vec<_>>(), [7, 7, 7, 7, 7]);
    assert!(vector.free_cells().is_empty());
}

#[test]
fn scenario_pop_back_then_push() {
    let mut vector = SparseVector::new();
    vector.push_free("x".to_string());

    assert_eq!(vector.pop_back(), Ok(Some("x".to_string())));
    assert_eq!(vector.size(), 0);
    assert!(vector.free_cells().is_empty());

    assert_eq!(vector.push_free("y".to_string()), 0);
    assert_eq!(vector.size(), 1);
}

#[test]
fn index_stability_under_churn() {
    let mut model = Model::new();

    let anchor = model.insert(u64::MAX);

    // A deterministic mix of insertions and erasures that crosses several growth events.
    let mut live = Vec::new();
    for round in 0_u64..300 {
        live.push(model.insert(round));

        if round % 3 == 2 {
            let victim = live.swap_remove(usize::try_from(round).unwrap() % live.len());
            model.erase(victim);
        }

        if round % 50 == 0 {
            model.verify();
        }
    }

    assert_eq!(model.vector.at(anchor), Ok(&u64::MAX));
    model.verify();
}

#[test]
fn growth_preserves_occupancy() {
    let mut vector = SparseVector::new();

    for value in 0..16 {
        vector.push_free(value);
    }
    for index in (0..16).step_by(3) {
        vector.erase_at(index).unwrap();
    }

    let before: Vec<_> = (0..16).map(|index| vector.get(index).copied()).collect();
    let free_before = vector.free_cells().to_vec();

    vector.reserve(1000);

    let after: Vec<_> = (0..16).map(|index| vector.get(index).copied()).collect();

    assert_eq!(before, after);
    assert_eq!(vector.free_cells(), free_before);
}

#[test]
fn erase_then_emplace_round_trip() {
    let mut vector = SparseVector::from(vec![1, 2, 3, 4]);

    for index in 0..4 {
        vector.erase_at(index).unwrap();
        vector.emplace_at(index, index * 100).unwrap();

        assert_eq!(vector.at(index), Ok(&(index * 100)));
    }

    assert!(vector.free_cells().is_empty());
    assert_eq!(vector.push_free(5), 4);
}

#[test]
fn out_of_range_is_consistent_across_operations() {
    let mut vector = SparseVector::from([1, 2]);

    let expected = Error::OutOfRange { index: 2, size: 2 };

    assert_eq!(vector.at(2), Err(expected));
    assert_eq!(vector.at_mut(2), Err(expected));
    assert_eq!(vector.erase_at(2), Err(expected));
    assert_eq!(vector.remove(2), Err(expected));
    assert_eq!(vector.emplace_at(2, 3), Err(expected));

    assert_eq!(vector.len(), 2);
    assert_eq!(vector.size(), 2);
}

#[test]
fn clear_then_reuse_from_zero() {
    let mut vector: SparseVector<_> = (0..10).collect();
    vector.erase_at(4).unwrap();

    vector.clear();

    assert_eq!(vector.size(), 0);
    assert_eq!(vector.capacity(), 10);

    for expected in 0..3 {
        assert_eq!(vector.push_free(expected), expected);
    }
}

#[test]
fn clone_is_independent() {
    let mut original = SparseVector::new();
    original.resize(3);
    original.emplace_at(1, vec![1_u8]).unwrap();

    let mut clone = original.clone();
    clone.at_mut(1).unwrap().push(2);
    clone.fill_free_cells(Vec::new);

    assert_eq!(original.at(1), Ok(&vec![1]));
    assert_eq!(original.free_cells(), [0, 2]);
    assert_eq!(clone.len(), 3);
    assert!(clone.free_cells().is_empty());
}

#[test]
fn owned_iteration_in_index_order() {
    let mut vector = SparseVector::new();
    for word in ["zero", "one", "two", "three"] {
        vector.push_free(word.to_string());
    }
    vector.erase_at(1).unwrap();

    let words: Vec<String> = vector.into_iter().collect();

    assert_eq!(words, ["zero", "two", "three"]);
}
