//! Random array generation and sortedness checks for drivers and tests.

use rand::distributions::{Distribution, Standard};
use rand::Rng;

/// A vector of `len` values drawn uniformly from the full domain of `T`.
pub fn generate_array<T>(len: usize) -> Vec<T>
where
    Standard: Distribution<T>,
{
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

/// Whether the slice is in ascending order.
pub fn is_sorted<T: Ord>(data: &[T]) -> bool {
    data.windows(2).all(|pair| pair[0] <= pair[1])
}
