//! Audio extension tables.

/// Audio family of a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioClass {
    Lossless,
    Lossy,
}

const LOSSLESS: &[(&str, &str)] = &[
    ("flac", "FLAC"),
    ("ape", "APE"),
    ("wav", "WAV"),
    ("aiff", "AIFF"),
    ("aif", "AIFF"),
    ("wv", "WavPack"),
    ("alac", "ALAC"),
];

const LOSSY: &[(&str, &str)] = &[
    ("mp3", "MP3"),
    ("m4a", "AAC"),
    ("aac", "AAC"),
    ("ogg", "Ogg Vorbis"),
    ("opus", "Opus"),
    ("wma", "WMA"),
];

/// Classify a lowercased extension and return its display name.
pub fn classify_extension(extension: &str) -> Option<(AudioClass, &'static str)> {
    let lookup = |table: &[(&str, &'static str)]| {
        table
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, name)| *name)
    };

    lookup(LOSSLESS)
        .map(|name| (AudioClass::Lossless, name))
        .or_else(|| lookup(LOSSY).map(|name| (AudioClass::Lossy, name)))
}

/// Lowercased extension: the peer-reported one if present, else taken from
/// the file name.
pub fn file_extension(reported: &str, filename: &str) -> String {
    let reported = reported.trim().trim_start_matches('.');
    if !reported.is_empty() {
        return reported.to_ascii_lowercase();
    }

    let base = base_name(filename);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Split a peer path into (directory, base name), accepting `/` and `\`.
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind(['/', '\\']) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

pub(crate) fn base_name(path: &str) -> &str {
    split_path(path).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_extension() {
        assert_eq!(
            classify_extension("flac"),
            Some((AudioClass::Lossless, "FLAC"))
        );
        assert_eq!(classify_extension("aif"), Some((AudioClass::Lossless, "AIFF")));
        assert_eq!(classify_extension("mp3"), Some((AudioClass::Lossy, "MP3")));
        assert_eq!(classify_extension("m4a"), Some((AudioClass::Lossy, "AAC")));
        assert_eq!(classify_extension("jpg"), None);
        assert_eq!(classify_extension(""), None);
    }

    #[test]
    fn test_file_extension_prefers_reported() {
        assert_eq!(file_extension("FLAC", "track.mp3"), "flac");
        assert_eq!(file_extension(".mp3", "track"), "mp3");
    }

    #[test]
    fn test_file_extension_falls_back_to_name() {
        assert_eq!(file_extension("", "C:\\Music\\01 - Song.FLAC"), "flac");
        assert_eq!(file_extension("", "/music/01 - Song.mp3"), "mp3");
        assert_eq!(file_extension("", "/music/README"), "");
        assert_eq!(file_extension("", "/music/.hidden"), "");
    }

    #[test]
    fn test_split_path_handles_both_separators() {
        assert_eq!(
            split_path("Music\\Beatles/Abbey Road\\01.flac"),
            ("Music\\Beatles/Abbey Road", "01.flac")
        );
        assert_eq!(split_path("/srv/a/b.mp3"), ("/srv/a", "b.mp3"));
        assert_eq!(split_path("loose.mp3"), ("", "loose.mp3"));
    }
}
