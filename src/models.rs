//! Core data models for catalog reconciliation.
//!
//! This module contains the catalog release records, the reconciled canonical
//! album, local library records and reconciliation statistics.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults (applied when the catalog omits a field)
// ============================================================================

pub const DEFAULT_BIT_DEPTH: u32 = 16;
pub const DEFAULT_SAMPLE_RATE: f64 = 44.1;

fn default_bit_depth() -> u32 {
    DEFAULT_BIT_DEPTH
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}

// ============================================================================
// Catalog Models
// ============================================================================

/// One release of an album as listed by the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAlbum {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: i32, // 0 when unknown
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64, // kHz
}

/// The standard-edition release a merged album was reconciled against.
/// Carries what bonus-track pruning needs: the release to whitelist from and its track count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardEdition {
    #[serde(rename = "standardId")]
    pub id: String,
    #[serde(rename = "standardTrackCount")]
    pub track_count: u32,
}

/// One album after reconciliation.
///
/// ## Invariants
///
/// - `standard` is `Some` only when `album` was merged from a higher-fidelity release that has
///   more tracks than the standard edition. `standardId` and `standardTrackCount` therefore
///   always appear together.
/// - Built once by `passthrough` or `merged` and never edited afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAlbum {
    #[serde(flatten)]
    pub album: CatalogAlbum,
    #[serde(flatten)]
    pub standard: Option<StandardEdition>,
}

impl CanonicalAlbum {
    /// A release that needs no reconciliation (singletons, or the standard edition itself).
    pub fn passthrough(album: CatalogAlbum) -> Self {
        Self {
            album,
            standard: None,
        }
    }

    /// Merge a higher-fidelity release with the provenance of the standard edition.
    ///
    /// Fidelity, id, url, artist and track count come from `hifi`; the year comes from
    /// `standard`. `standard` is recorded for pruning only when `hifi` has extra tracks.
    pub fn merged(hifi: &CatalogAlbum, standard: &CatalogAlbum, title: String) -> Self {
        let standard_edition = (hifi.track_count > standard.track_count).then(|| StandardEdition {
            id: standard.id.clone(),
            track_count: standard.track_count,
        });

        Self {
            album: CatalogAlbum {
                id: hifi.id.clone(),
                title,
                year: standard.year,
                artist: hifi.artist.clone(),
                url: hifi.url.clone(),
                track_count: hifi.track_count,
                bit_depth: hifi.bit_depth,
                sample_rate: hifi.sample_rate,
            },
            standard: standard_edition,
        }
    }

    pub fn id(&self) -> &str {
        &self.album.id
    }

    pub fn title(&self) -> &str {
        &self.album.title
    }

    pub fn year(&self) -> i32 {
        self.album.year
    }

    pub fn standard_id(&self) -> Option<&str> {
        self.standard.as_ref().map(|s| s.id.as_str())
    }

    pub fn standard_track_count(&self) -> Option<u32> {
        self.standard.as_ref().map(|s| s.track_count)
    }

    /// Number of tracks pruning is expected to remove (0 when nothing is marked).
    pub fn bonus_track_count(&self) -> u32 {
        self.standard_track_count()
            .map(|n| self.album.track_count.saturating_sub(n))
            .unwrap_or(0)
    }

    /// "24bit/96kHz"
    pub fn fidelity_label(&self) -> String {
        format!("{}bit/{}kHz", self.album.bit_depth, self.album.sample_rate)
    }
}

/// Artist entry from a catalog artist search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Library Models
// ============================================================================

/// Album folder in the local library ("[YYYY] Title").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryAlbum {
    pub year: i32,
    pub title: String,
    pub path: PathBuf,
}

/// Artist folder in the local library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryArtist {
    pub name: String,           // "The " stripped
    pub canonical_name: String, // folder name as stored
    pub albums: Vec<LibraryAlbum>,
    pub path: PathBuf,
}

impl LibraryArtist {
    /// (year, title) pairs for missing-album discovery.
    pub fn existing_albums(&self) -> Vec<(i32, String)> {
        self.albums.iter().map(|a| (a.year, a.title.clone())).collect()
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run reconciliation statistics.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub releases_in: usize,
    pub groups: usize,
    pub singletons: usize,       // groups of one (before or after clean filtering)
    pub clean_dropped: usize,    // clean pressings dropped in favor of a regular one
    pub merged: usize,           // hi-fi release merged with standard year
    pub marked_for_pruning: usize, // merged albums carrying a standard edition
    pub standard_kept: usize,    // standard edition was already the best fidelity
    pub canonical_out: usize,
}

impl ReconcileStats {
    /// Fold another run's counts into this one (per-artist runs in batch mode).
    pub fn absorb(&mut self, other: &ReconcileStats) {
        self.releases_in += other.releases_in;
        self.groups += other.groups;
        self.singletons += other.singletons;
        self.clean_dropped += other.clean_dropped;
        self.merged += other.merged;
        self.marked_for_pruning += other.marked_for_pruning;
        self.standard_kept += other.standard_kept;
        self.canonical_out += other.canonical_out;
    }

    /// Releases collapsed away by reconciliation
    pub fn collapsed(&self) -> usize {
        self.releases_in.saturating_sub(self.canonical_out)
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
