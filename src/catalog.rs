use crate::model::{Game, Track};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

/// Build the track catalog from a bundled sounds directory. The order
/// is deterministic: a natural (numeric-aware) ascending sort over the
/// path string, and ids are assigned after sorting. A missing or
/// unreadable directory yields an empty catalog.
pub fn scan(root: &Path) -> Vec<Track> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if entry.file_type().is_file() && is_audio(path) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

    paths
        .into_iter()
        .enumerate()
        .map(|(id, path)| {
            let title = derive_title(&path);
            let game = classify_game(&path);
            Track::new(id, title, game, path)
        })
        .collect()
}

fn is_audio(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

/// File stem minus a leading track-number prefix (a run of digits plus
/// the whitespace after it). Stripping never leaves an empty title.
fn derive_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("unknown");

    let after_digits = stem.trim_start_matches(|ch: char| ch.is_ascii_digit());
    let stripped = after_digits.trim_start();
    let had_number_prefix = after_digits.len() < stem.len() && stripped.len() < after_digits.len();
    if had_number_prefix && !stripped.is_empty() {
        stripped.to_string()
    } else {
        stem.to_string()
    }
}

fn classify_game(path: &Path) -> Game {
    let lowered = path.to_string_lossy().to_ascii_lowercase();
    if lowered.contains("silksong") {
        Game::Silksong
    } else {
        Game::HollowKnight
    }
}

/// Natural string order: digit runs compare by numeric value (shorter
/// run first on ties), everything else case-insensitively.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(lc), Some(rc)) => {
                if lc.is_ascii_digit() && rc.is_ascii_digit() {
                    let lnum = take_digits(&mut left);
                    let rnum = take_digits(&mut right);
                    let ordering = compare_digit_runs(&lnum, &rnum);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                } else {
                    let ordering = lc
                        .to_ascii_lowercase()
                        .cmp(&rc.to_ascii_lowercase())
                        .then_with(|| lc.cmp(&rc));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                    left.next();
                    right.next();
                }
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        run.push(ch);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
