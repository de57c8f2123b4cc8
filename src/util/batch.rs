// src/util/batch.rs

/// Split a slice into chunks of `batch_size`; the last chunk may be shorter.
///
/// A `batch_size` of zero is treated as one.
pub fn batch_array<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
