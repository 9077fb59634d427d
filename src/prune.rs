//! Bonus-track pruning for merged hi-fi albums.
//!
//! A merged album carrying a standard edition was downloaded from a release with extra
//! tracks. The standard edition's track listing is the whitelist: every local track whose
//! normalized title is not on it gets deleted. Anything short of a usable whitelist
//! deletes nothing.

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::parse_album_tracks;
use crate::normalize::{extract_track_title, normalize_track_title};
use crate::safety::{validate_album_dir, validate_removal_plan};

/// Source of authoritative track titles for a catalog release.
pub trait TrackListing {
    /// Raw track titles in album order.
    fn track_titles(&self, release_id: &str) -> Result<Vec<String>>;
}

/// Track listings from pre-fetched `album/get` payloads stored as `<dir>/<release_id>.json`.
#[derive(Clone, Debug)]
pub struct AlbumPayloadDir {
    dir: PathBuf,
}

impl AlbumPayloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TrackListing for AlbumPayloadDir {
    fn track_titles(&self, release_id: &str) -> Result<Vec<String>> {
        let path = self.dir.join(format!("{}.json", release_id));
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read album payload {}", path.display()))?;
        parse_album_tracks(&json)
            .with_context(|| format!("Invalid album payload {}", path.display()))
    }
}

/// FLAC files directly inside `album_dir`, sorted by name.
pub fn flac_tracks(album_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut tracks = Vec::new();
    for entry in fs::read_dir(album_dir)
        .with_context(|| format!("Failed to read {}", album_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("flac") {
            tracks.push(path);
        }
    }
    tracks.sort();
    Ok(tracks)
}

/// Tracks in `album_dir` whose titles are absent from the standard edition's listing.
///
/// "03 - Airbag (Remastered).flac" matches a listed "Airbag". An empty whitelist plans nothing.
pub fn plan_bonus_track_removal(album_dir: &Path, standard_titles: &[String]) -> Result<Vec<PathBuf>> {
    if standard_titles.is_empty() {
        return Ok(Vec::new());
    }

    let whitelist: FxHashSet<String> = standard_titles
        .iter()
        .map(|t| normalize_track_title(t))
        .collect();

    Ok(flac_tracks(album_dir)?
        .into_iter()
        .filter(|path| {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            !whitelist.contains(&normalize_track_title(&extract_track_title(stem)))
        })
        .collect())
}

/// Delete bonus tracks from a downloaded album, using `standard_id`'s listing as the whitelist.
///
/// Returns the removed paths (or the paths that would be removed when `dry_run`).
/// A listing that cannot be fetched or is empty removes nothing and is not an error.
pub fn remove_bonus_tracks(
    album_dir: &Path,
    standard_id: &str,
    listing: &dyn TrackListing,
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    validate_album_dir(album_dir)?;

    let standard_titles = match listing.track_titles(standard_id) {
        Ok(titles) => titles,
        Err(e) => {
            warn!(
                "Skipping prune of {}: no track listing for {} ({:#})",
                album_dir.display(),
                standard_id,
                e
            );
            return Ok(Vec::new());
        }
    };
    if standard_titles.is_empty() {
        warn!(
            "Skipping prune of {}: track listing for {} is empty",
            album_dir.display(),
            standard_id
        );
        return Ok(Vec::new());
    }

    let targets = plan_bonus_track_removal(album_dir, &standard_titles)?;
    let track_total = flac_tracks(album_dir)?.len();
    validate_removal_plan(album_dir, &targets, track_total)?;

    if dry_run {
        return Ok(targets);
    }

    let (removed, failure) = delete_tracks(&targets);
    if let Some(e) = failure {
        warn!(
            "Removed {} of {} bonus tracks from {} before failing",
            removed.len(),
            targets.len(),
            album_dir.display()
        );
        let done: Vec<String> = removed.iter().map(|p| p.display().to_string()).collect();
        return Err(e.context(format!(
            "Pruning {} stopped after removing {} track(s): [{}]",
            album_dir.display(),
            removed.len(),
            done.join(", ")
        )));
    }

    Ok(removed)
}

/// Delete tracks in order, stopping at the first failure.
/// Returns the paths actually removed and the failure, if any.
fn delete_tracks(targets: &[PathBuf]) -> (Vec<PathBuf>, Option<anyhow::Error>) {
    let mut removed = Vec::with_capacity(targets.len());
    for path in targets {
        if let Err(e) = fs::remove_file(path) {
            let err = anyhow::Error::new(e).context(format!("Failed to remove {}", path.display()));
            return (removed, Some(err));
        }
        info!("Removed bonus track {}", path.display());
        removed.push(path.clone());
    }
    (removed, None)
}
