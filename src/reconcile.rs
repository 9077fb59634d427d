//! Edition reconciliation: collapse the releases a catalog lists for one artist
//! (original, deluxe, remaster, hi-fi remaster, clean) into one canonical album each.
//!
//! Per group of releases sharing a normalized title:
//! 1. Groups of one pass through unchanged
//! 2. Clean pressings are dropped when a regular pressing exists
//! 3. The standard edition is the earliest year, then fewest tracks
//! 4. The best-fidelity edition is the highest bit depth, then sample rate
//! 5. A strictly better hi-fi release is merged with the standard edition's year,
//!    and marked for bonus-track pruning when it has more tracks
//!
//! Pure and deterministic: no I/O, output groups appear in order of first appearance.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::debug;

use crate::models::{CanonicalAlbum, CatalogAlbum, ReconcileStats};
use crate::normalize::{is_clean_version, normalize_album_title, title_case};

// ============================================================================
// Grouping
// ============================================================================

/// Index mapping a normalized title key to its position in `Vec<EditionGroup>`
pub type TitleIndex = FxHashMap<String, usize>;

/// Releases sharing one normalized title key.
#[derive(Clone, Debug, PartialEq)]
pub struct EditionGroup {
    pub key: String,
    pub releases: Vec<CatalogAlbum>,
}

/// Group releases by normalized album title, keeping first-seen order of keys
/// and input order of releases within a group.
pub fn group_by_title(albums: Vec<CatalogAlbum>) -> Vec<EditionGroup> {
    let mut index: TitleIndex = FxHashMap::default();
    let mut groups: Vec<EditionGroup> = Vec::new();

    for album in albums {
        let key = normalize_album_title(&album.title);
        match index.get(&key) {
            Some(&idx) => groups[idx].releases.push(album),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(EditionGroup {
                    key,
                    releases: vec![album],
                });
            }
        }
    }

    groups
}

// ============================================================================
// Selection
// ============================================================================

/// Standard edition: earliest year, then fewest tracks. Ties keep input order.
pub fn select_standard(releases: &[CatalogAlbum]) -> Option<&CatalogAlbum> {
    releases.iter().min_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| a.track_count.cmp(&b.track_count))
    })
}

/// Best-fidelity edition: highest bit depth, then highest sample rate. Ties keep input order.
pub fn select_best_fidelity(releases: &[CatalogAlbum]) -> Option<&CatalogAlbum> {
    releases.iter().min_by(|a, b| compare_fidelity(b, a))
}

/// Order by bit depth, then sample rate. Sample rate never overrides bit depth.
pub fn compare_fidelity(a: &CatalogAlbum, b: &CatalogAlbum) -> Ordering {
    a.bit_depth
        .cmp(&b.bit_depth)
        .then_with(|| a.sample_rate.total_cmp(&b.sample_rate))
}

/// True when `candidate` is strictly better than `baseline`.
pub fn is_higher_fidelity(candidate: &CatalogAlbum, baseline: &CatalogAlbum) -> bool {
    candidate.bit_depth > baseline.bit_depth
        || (candidate.bit_depth == baseline.bit_depth
            && candidate.sample_rate > baseline.sample_rate)
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Reconcile one group into its canonical album. `None` only for an empty group.
pub fn reconcile_group(group: EditionGroup, stats: &mut ReconcileStats) -> Option<CanonicalAlbum> {
    let EditionGroup { key, mut releases } = group;

    if releases.len() <= 1 {
        stats.singletons += releases.len();
        return releases.pop().map(CanonicalAlbum::passthrough);
    }

    // Clean pressings only survive when nothing else exists
    if releases.iter().any(|a| !is_clean_version(&a.title)) {
        let before = releases.len();
        releases.retain(|a| !is_clean_version(&a.title));
        let dropped = before - releases.len();
        if dropped > 0 {
            debug!("'{}': dropped {} clean pressing(s)", key, dropped);
            stats.clean_dropped += dropped;
        }
    }

    if releases.len() == 1 {
        stats.singletons += 1;
        return releases.pop().map(CanonicalAlbum::passthrough);
    }

    let standard = select_standard(&releases)?;
    let hifi = select_best_fidelity(&releases)?;

    if is_higher_fidelity(hifi, standard) && hifi.id != standard.id {
        let merged = CanonicalAlbum::merged(hifi, standard, title_case(&key));
        debug!(
            "'{}': merged hi-fi {} ({}) with standard {} year {}{}",
            key,
            hifi.id,
            merged.fidelity_label(),
            standard.id,
            standard.year,
            merged
                .standard_track_count()
                .map(|n| format!(", prune to {} tracks", n))
                .unwrap_or_default()
        );
        stats.merged += 1;
        if merged.standard.is_some() {
            stats.marked_for_pruning += 1;
        }
        Some(merged)
    } else {
        stats.standard_kept += 1;
        Some(CanonicalAlbum::passthrough(standard.clone()))
    }
}

/// Reconcile all releases for one artist, collecting statistics.
pub fn reconcile_with_stats(albums: Vec<CatalogAlbum>) -> (Vec<CanonicalAlbum>, ReconcileStats) {
    let mut stats = ReconcileStats {
        releases_in: albums.len(),
        ..Default::default()
    };

    let groups = group_by_title(albums);
    stats.groups = groups.len();

    let canonical: Vec<CanonicalAlbum> = groups
        .into_iter()
        .filter_map(|group| reconcile_group(group, &mut stats))
        .collect();

    stats.canonical_out = canonical.len();
    (canonical, stats)
}

/// Reconcile all releases for one artist into one canonical album per distinct title.
pub fn reconcile(albums: Vec<CatalogAlbum>) -> Vec<CanonicalAlbum> {
    reconcile_with_stats(albums).0
}

// ============================================================================
// TESTS
// ============================================================================
