//! Round-robin rotation step
//!
//! Storage backends apply this step atomically with the index write so two
//! concurrent allocations against the same rule never read the same slot.

/// Pick the slot for `current` over `len` targets and return `(selected, next)`
///
/// An index left out of range by a shrinking target list resets to 0.
/// Returns `None` when there are no targets.
pub fn next_slot(current: usize, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let selected = if current >= len { 0 } else { current };
    Some((selected, (selected + 1) % len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_through_every_slot() {
        let mut index = 0;
        let mut seen = Vec::new();
        for _ in 0..3 {
            let (selected, next) = next_slot(index, 3).unwrap();
            seen.push(selected);
            index = next;
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_out_of_range_index_resets() {
        assert_eq!(next_slot(5, 2), Some((0, 1)));
    }

    #[test]
    fn test_empty_target_list() {
        assert_eq!(next_slot(0, 0), None);
    }
}
