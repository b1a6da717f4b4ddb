//! Deduplication of near-identical catalog releases.

use crate::catalog::Release;

/// Worldwide release country code.
const WORLDWIDE: &str = "XW";

/// Rank of a release country: worldwide first, then the preferred national
/// code, then everything else (lower is better).
pub fn country_rank(country: Option<&str>, preferred: &str) -> u8 {
    match country {
        Some(WORLDWIDE) => 0,
        Some(c) if c.eq_ignore_ascii_case(preferred) => 1,
        _ => 2,
    }
}

/// Collapse releases sharing (track count, year, format, release type).
///
/// Within a group the release with the best country rank replaces earlier
/// entries in place, so survivors keep first-seen order. Input is expected
/// sorted by date ascending. Never returns more releases than it was given.
pub fn dedup_releases(releases: &[Release], preferred_country: &str) -> Vec<Release> {
    type Key<'a> = (u32, Option<&'a str>, &'a str, Option<&'a str>);

    let mut keys: Vec<Key<'_>> = Vec::new();
    let mut survivors: Vec<&Release> = Vec::new();

    for release in releases {
        let key = (
            release.track_count,
            release.year(),
            release.format.as_str(),
            release.release_type.as_deref(),
        );

        match keys.iter().position(|k| *k == key) {
            Some(idx) => {
                let current = country_rank(survivors[idx].country.as_deref(), preferred_country);
                let candidate = country_rank(release.country.as_deref(), preferred_country);
                if candidate < current {
                    survivors[idx] = release;
                }
            }
            None => {
                keys.push(key);
                survivors.push(release);
            }
        }
    }

    survivors.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(id: &str, tracks: u32, date: &str, format: &str, country: Option<&str>) -> Release {
        Release {
            id: id.to_string(),
            title: "Abbey Road".to_string(),
            date: Some(date.to_string()),
            country: country.map(str::to_string),
            status: Some("Official".to_string()),
            track_count: tracks,
            format: format.to_string(),
            release_type: Some("Album".to_string()),
            disambiguation: None,
        }
    }

    fn ids(releases: &[Release]) -> Vec<&str> {
        releases.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_country_rank() {
        assert_eq!(country_rank(Some("XW"), "US"), 0);
        assert_eq!(country_rank(Some("US"), "US"), 1);
        assert_eq!(country_rank(Some("us"), "US"), 1);
        assert_eq!(country_rank(Some("GB"), "US"), 2);
        assert_eq!(country_rank(None, "US"), 2);
    }

    #[test]
    fn test_duplicates_collapse_to_best_country() {
        let releases = vec![
            release("gb", 17, "1969-09-26", "CD", Some("GB")),
            release("us", 17, "1969-10-01", "CD", Some("US")),
            release("xw", 17, "1969-12-01", "CD", Some("XW")),
        ];
        let deduped = dedup_releases(&releases, "US");
        assert_eq!(ids(&deduped), vec!["xw"]);
    }

    #[test]
    fn test_equal_rank_keeps_first_seen() {
        let releases = vec![
            release("gb", 17, "1969-09-26", "CD", Some("GB")),
            release("de", 17, "1969-10-01", "CD", Some("DE")),
        ];
        let deduped = dedup_releases(&releases, "US");
        assert_eq!(ids(&deduped), vec!["gb"]);
    }

    #[test]
    fn test_distinct_keys_survive_in_order() {
        let releases = vec![
            release("vinyl", 17, "1969-09-26", "12\" Vinyl", Some("GB")),
            release("cd87", 17, "1987-10-19", "CD", Some("GB")),
            release("cd87-us", 17, "1987-11-01", "CD", Some("US")),
            release("deluxe", 40, "2019-09-27", "3xCD", Some("XW")),
            release("cd19", 17, "2019-09-27", "CD", Some("XW")),
        ];
        let deduped = dedup_releases(&releases, "US");
        assert_eq!(ids(&deduped), vec!["vinyl", "cd87-us", "deluxe", "cd19"]);
    }

    #[test]
    fn test_dedup_never_grows_and_preserves_relative_order() {
        let releases = vec![
            release("a", 10, "2000", "CD", Some("FR")),
            release("b", 12, "2000", "CD", Some("FR")),
            release("c", 10, "2000", "CD", Some("FR")),
            release("d", 12, "2001", "CD", Some("FR")),
        ];
        let deduped = dedup_releases(&releases, "US");
        assert!(deduped.len() <= releases.len());
        assert_eq!(ids(&deduped), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_releases(&[], "US").is_empty());
    }
}
