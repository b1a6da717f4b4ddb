//! First-seen frequency counting shared by the catalog and scoring code.

/// Count occurrences, keeping entries in first-seen order.
pub(crate) fn tally<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

/// Most frequent item; ties go to the one seen first.
pub(crate) fn plurality<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (item, n) in tally(items) {
        if best.as_ref().is_none_or(|(_, best_n)| n > *best_n) {
            best = Some((item, n));
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_preserves_first_seen_order() {
        let counts = tally(vec!["b", "a", "b", "c", "a", "b"]);
        assert_eq!(counts, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_plurality_ties_go_to_first_seen() {
        assert_eq!(plurality(vec![320, 256, 256, 320]), Some(320));
        assert_eq!(plurality(vec![128, 320, 320]), Some(320));
        assert_eq!(plurality(Vec::<u32>::new()), None);
    }
}
