//! Candidate source scoring.

use serde::{Deserialize, Serialize};

use crate::source::{PeerFile, PeerResponse};

use super::formats::{classify_extension, file_extension, split_path, AudioClass};
use super::track_count::expected_tracks_from_counts;
use super::types::{CandidateSource, FilterConfig, FilterStats, FormatPreference, SourceFile};
use crate::counting::plurality;

/// Bonus that places every year-matched directory above all others.
const YEAR_MATCH_BONUS: u64 = 1 << 40;

/// Output of one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredSources {
    /// Surviving candidates, best first.
    pub candidates: Vec<CandidateSource>,
    pub stats: FilterStats,
    /// Track count used for filtering, if one could be determined.
    pub expected_tracks: Option<usize>,
}

/// A directory of one peer, before filtering.
struct DirectoryGroup<'a> {
    response: &'a PeerResponse,
    directory: &'a str,
    files: Vec<&'a PeerFile>,
}

/// An audio file with its derived extension and display format.
struct AudioFile<'a> {
    file: &'a PeerFile,
    extension: String,
    class: AudioClass,
    label: &'static str,
}

/// Rank peer responses against the current filters.
///
/// `catalog_tracks` is the authoritative track count when known; otherwise a
/// count shared by at least three candidates is used. `year` tags directories
/// whose path contains it.
pub fn score_sources(
    responses: &[PeerResponse],
    filters: &FilterConfig,
    catalog_tracks: Option<usize>,
    year: Option<&str>,
) -> ScoredSources {
    let groups = flatten(responses);
    let mut stats = FilterStats {
        total_directories: groups.len(),
        ..Default::default()
    };

    let mut candidates = Vec::new();
    for group in groups {
        if filters.require_free_slot && !group.response.has_free_upload_slot {
            stats.no_free_slot += 1;
            continue;
        }

        let audio = audio_files(&group.files);
        if audio.is_empty() {
            stats.no_audio += 1;
            continue;
        }

        let selected = select_format(audio, filters.format);
        if selected.is_empty() {
            stats.wrong_format += 1;
            continue;
        }

        candidates.push(build_candidate(&group, selected));
    }

    let expected_tracks = catalog_tracks
        .or_else(|| expected_tracks_from_counts(candidates.iter().map(|c| c.file_count())));

    if filters.require_track_count {
        if let Some(expected) = expected_tracks {
            let before = candidates.len();
            candidates.retain(|c| c.file_count() == expected);
            stats.wrong_track_count += before - candidates.len();
        }
    }

    for candidate in &mut candidates {
        candidate.year_match = year.is_some_and(|y| candidate.directory.contains(y));
        candidate.rank_score = rank_score(candidate.year_match, candidate.upload_speed);
    }

    // Stable: flatten order is the only tie-break.
    candidates.sort_by(|a, b| b.rank_score.cmp(&a.rank_score));

    ScoredSources {
        candidates,
        stats,
        expected_tracks,
    }
}

fn rank_score(year_match: bool, upload_speed: u64) -> u64 {
    let bonus = if year_match { YEAR_MATCH_BONUS } else { 0 };
    bonus + upload_speed.min(YEAR_MATCH_BONUS - 1)
}

/// Split every response into one group per parent directory, in first-seen order.
fn flatten(responses: &[PeerResponse]) -> Vec<DirectoryGroup<'_>> {
    let mut groups = Vec::new();
    for response in responses {
        let mut per_peer: Vec<DirectoryGroup<'_>> = Vec::new();
        for file in &response.files {
            let (directory, _) = split_path(&file.filename);
            match per_peer.iter_mut().find(|g| g.directory == directory) {
                Some(group) => group.files.push(file),
                None => per_peer.push(DirectoryGroup {
                    response,
                    directory,
                    files: vec![file],
                }),
            }
        }
        groups.extend(per_peer);
    }
    groups
}

fn audio_files<'a>(files: &[&'a PeerFile]) -> Vec<AudioFile<'a>> {
    files
        .iter()
        .copied()
        .filter_map(|file| {
            let extension = file_extension(&file.extension, &file.filename);
            let (class, label) = classify_extension(&extension)?;
            Some(AudioFile {
                file,
                extension,
                class,
                label,
            })
        })
        .collect()
}

fn of_class(audio: Vec<AudioFile<'_>>, class: AudioClass) -> Vec<AudioFile<'_>> {
    audio.into_iter().filter(|a| a.class == class).collect()
}

fn select_format(audio: Vec<AudioFile<'_>>, preference: FormatPreference) -> Vec<AudioFile<'_>> {
    match preference {
        FormatPreference::Lossless => of_class(audio, AudioClass::Lossless),
        FormatPreference::Lossy => of_class(audio, AudioClass::Lossy),
        FormatPreference::Either => {
            if audio.iter().any(|a| a.class == AudioClass::Lossless) {
                of_class(audio, AudioClass::Lossless)
            } else {
                of_class(audio, AudioClass::Lossy)
            }
        }
    }
}

fn build_candidate(group: &DirectoryGroup<'_>, audio: Vec<AudioFile<'_>>) -> CandidateSource {
    let format = plurality(audio.iter().map(|a| a.label))
        .unwrap_or_default()
        .to_string();
    let bit_rate = plurality(audio.iter().filter_map(|a| a.file.bit_rate));
    let total_size = audio.iter().map(|a| a.file.size).sum();

    let files = audio
        .into_iter()
        .map(|a| SourceFile {
            filename: a.file.filename.clone(),
            name: split_path(&a.file.filename).1.to_string(),
            size: a.file.size,
            bit_rate: a.file.bit_rate,
            extension: a.extension,
        })
        .collect();

    CandidateSource {
        username: group.response.username.clone(),
        directory: group.directory.to_string(),
        files,
        upload_speed: group.response.upload_speed,
        has_free_upload_slot: group.response.has_free_upload_slot,
        queue_length: group.response.queue_length,
        format,
        total_size,
        bit_rate,
        year_match: false,
        rank_score: 0,
    }
}
