//! Basic usage example for `SparseVector`.
//!
//! This example shows how indices stay stable across removals, how vacated cells are reused
//! and how iteration skips the holes.

use sparse_vector::SparseVector;

fn main() {
    let mut vector = SparseVector::new();

    println!("Created SparseVector with capacity: {}", vector.capacity());

    let alice = vector.push_free("alice");
    let bob = vector.push_free("bob");
    let carol = vector.push_free("carol");

    println!("Inserted alice at {alice}, bob at {bob}, carol at {carol}");
    println!(
        "Size: {}, values: {}, capacity: {}",
        vector.size(),
        vector.len(),
        vector.capacity()
    );

    vector.erase_at(bob).expect("bob was just inserted");
    println!("Removed bob; free cells are now {:?}", vector.free_cells());

    // Carol keeps her index even though bob is gone.
    println!("Carol is still at {carol}: {:?}", vector.at(carol));

    let dave = vector.push_free("dave");
    println!("Dave reused index {dave}");

    for (index, name) in vector.iter_indexed() {
        println!("  [{index}] {name}");
    }

    match vector.at(10) {
        Ok(name) => println!("Unexpectedly found {name}"),
        Err(error) => println!("Looking up index 10 failed: {error}"),
    }
}
