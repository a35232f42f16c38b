//! Stable partitioning of entity id lists into platform-sized batches.

/// Split `ids` into groups of at most `max_size`, preserving order.
///
/// The partition is stable: concatenating the groups reproduces the input
/// exactly, and only the last group may be shorter than `max_size`. Order
/// preservation matters for correlating batch logs with the request that
/// produced them. A `max_size` of 0 is clamped to 1.
pub fn chunk<T: Clone>(ids: &[T], max_size: usize) -> Vec<Vec<T>> {
    let max_size = max_size.max(1);
    ids.chunks(max_size).map(|group| group.to_vec()).collect()
}
