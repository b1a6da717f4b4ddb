//! Track count inference.

use crate::catalog::Release;

use crate::counting::{plurality, tally};

/// Minimum number of candidates that must share a file count before it is
/// trusted as the expected track count.
const MIN_CANDIDATE_AGREEMENT: usize = 3;

/// Track count implied by a release list, if it is unambiguous enough.
///
/// Resolves when all releases agree, when one count covers all but at most
/// two releases, or when one count covers at least 75% of them. A tie for
/// the most frequent count never resolves.
pub fn resolve_track_count(releases: &[Release]) -> Option<u32> {
    let total = releases.len();
    let counts = tally(releases.iter().map(|r| r.track_count));

    let max = counts.iter().map(|(_, n)| *n).max()?;
    let mut leaders = counts.iter().filter(|(_, n)| *n == max);
    let (count, frequency) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }

    let resolved = counts.len() == 1 || total - frequency <= 2 || frequency * 4 >= total * 3;
    resolved.then_some(*count)
}

/// Most frequent file count shared by at least three candidates.
pub fn expected_tracks_from_counts(counts: impl IntoIterator<Item = usize>) -> Option<usize> {
    let agreeing = tally(counts)
        .into_iter()
        .filter(|(_, n)| *n >= MIN_CANDIDATE_AGREEMENT)
        .flat_map(|(count, n)| std::iter::repeat_n(count, n));
    plurality(agreeing)
}
