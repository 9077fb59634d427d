//! Local library layout: `<root>/<Letter>/<Artist>/[YYYY] Album Title`.
//!
//! Scanning, folder-name parsing and fuzzy artist lookup.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::{LibraryAlbum, LibraryArtist};
use crate::normalize::{fold_to_ascii, letter_for_artist, normalize_artist};

/// Minimum fuzzy score (0-100) for an artist lookup to count as a match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 85.0;

/// "[1997] OK Computer"
static ALBUM_FOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d{4})\]\s*(.+)").unwrap());

/// "Radiohead - [1997] OK Computer" (download/staging folders)
static NEW_FOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+-\s+\[(\d{4})\]\s*(.+)$").unwrap());

// ============================================================================
// Folder names
// ============================================================================

/// Parse "[YYYY] Title" into (year, title).
pub fn parse_album_folder(name: &str) -> Option<(i32, String)> {
    let caps = ALBUM_FOLDER.captures(name)?;
    let year = caps[1].parse().ok()?;
    Some((year, caps[2].to_string()))
}

/// Parse "Artist - [YYYY] Title" into (artist, year, title).
pub fn parse_new_folder(name: &str) -> Option<(String, i32, String)> {
    let caps = NEW_FOLDER.captures(name)?;
    let year = caps[2].parse().ok()?;
    Some((caps[1].trim().to_string(), year, caps[3].trim().to_string()))
}

/// `<root>/<letter>/<artist without "The ">`
pub fn artist_path(root: &Path, artist: &str) -> PathBuf {
    root.join(letter_for_artist(artist)).join(normalize_artist(artist))
}

// ============================================================================
// Scanning
// ============================================================================

/// Subdirectories of `path` with UTF-8 names, sorted by name.
fn sorted_subdirs(path: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))? {
        let entry = entry?;
        let entry_path = entry.path();
        if !entry_path.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            subdirs.push((name.to_string(), entry_path));
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

/// Scan the library into artists keyed by normalized name.
///
/// Only single-character letter folders are visited. Artists without a parseable album
/// folder are left out. A missing root yields an empty map.
pub fn scan_library(root: &Path) -> Result<BTreeMap<String, LibraryArtist>> {
    let mut artists = BTreeMap::new();

    if !root.exists() {
        debug!("Library root {} does not exist", root.display());
        return Ok(artists);
    }

    for (letter, letter_path) in sorted_subdirs(root)? {
        if letter.chars().count() != 1 {
            continue;
        }

        for (artist_name, artist_dir) in sorted_subdirs(&letter_path)? {
            let albums: Vec<LibraryAlbum> = sorted_subdirs(&artist_dir)?
                .into_iter()
                .filter_map(|(name, path)| {
                    parse_album_folder(&name).map(|(year, title)| LibraryAlbum { year, title, path })
                })
                .collect();

            if albums.is_empty() {
                continue;
            }

            let name = normalize_artist(&artist_name);
            artists.insert(
                name.clone(),
                LibraryArtist {
                    name,
                    canonical_name: artist_name,
                    albums,
                    path: artist_dir,
                },
            );
        }
    }

    debug!("Scanned {} artists under {}", artists.len(), root.display());
    Ok(artists)
}

/// A mounted volume exists and has at least one entry (an unmounted mount point is empty).
pub fn check_volume_mounted(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Album folders under `path`, or `path` itself when it is one. Sorted depth-first.
pub fn find_album_directories(path: &Path) -> Result<Vec<PathBuf>> {
    let is_album = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| parse_album_folder(n).is_some());
    if is_album {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut albums = Vec::new();
    for (name, sub) in sorted_subdirs(path)? {
        if parse_album_folder(&name).is_some() {
            albums.push(sub);
        } else {
            albums.extend(find_album_directories(&sub)?);
        }
    }
    Ok(albums)
}

// ============================================================================
// Fuzzy artist lookup
// ============================================================================

/// Comparison forms of a name: folded, folded without "the ", folded with words sorted.
fn match_forms(name: &str) -> [String; 3] {
    let folded = fold_to_ascii(name.trim());
    let stripped = normalize_artist(&folded);
    let mut words: Vec<&str> = folded.split_whitespace().collect();
    words.sort_unstable();
    let sorted = words.join(" ");
    [folded, stripped, sorted]
}

/// Similarity score 0-100, the best over the matching comparison forms.
pub fn artist_similarity(a: &str, b: &str) -> f64 {
    let fa = match_forms(a);
    let fb = match_forms(b);
    fa.iter()
        .zip(fb.iter())
        .map(|(x, y)| strsim::normalized_levenshtein(x, y) * 100.0)
        .fold(0.0, f64::max)
}

/// Find the library artist a query refers to.
///
/// An exact case-insensitive match wins. Otherwise the best-scoring candidate at or above
/// `threshold` (0-100), tolerating accents, typos, a missing "The" and word order.
pub fn find_matching_artist<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    threshold: f64,
) -> Option<String> {
    let query_lower = query.to_lowercase();
    if let Some(exact) = candidates
        .iter()
        .find(|c| c.as_ref().to_lowercase() == query_lower)
    {
        return Some(exact.as_ref().to_string());
    }

    let mut best: Option<(f64, &str)> = None;
    for candidate in candidates {
        let score = artist_similarity(query, candidate.as_ref());
        if score >= threshold && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate.as_ref()));
        }
    }

    if let Some((score, name)) = best {
        debug!("Fuzzy matched '{}' to '{}' ({:.1})", query, name, score);
    }
    best.map(|(_, name)| name.to_string())
}
