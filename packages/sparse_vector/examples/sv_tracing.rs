//! Shows the diagnostic events that `SparseVector` emits through `tracing`.
//!
//! Run with `RUST_LOG=trace` to also see cell reuse and trailing pops.

use sparse_vector::SparseVector;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let mut vector = SparseVector::new();

    // Growth events are logged at debug level.
    for value in 0..10 {
        vector.push_free(value);
    }

    vector.erase_at(3).expect("index 3 was just inserted");
    vector.push_free(30);

    vector.resize(20);
    vector.fill_free_cells(|| -1);

    vector.pop_back().expect("vector is not empty");
    vector.clear();
}
