//! Catalog payload ingestion.
//!
//! Parses pre-fetched Qobuz API responses (`artist/get?extra=albums`, `artist/search`,
//! `album/get`) into catalog records. Network access lives outside this crate.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{
    CanonicalAlbum, CatalogAlbum, CatalogArtist, ReconcileStats, DEFAULT_BIT_DEPTH,
    DEFAULT_SAMPLE_RATE,
};
use crate::normalize::{artist_search_variants, is_compilation_or_live};
use crate::reconcile::reconcile_with_stats;

/// Minimum track count for a full album (fewer = single/EP)
pub const MIN_ALBUM_TRACKS: u32 = 6;

// ============================================================================
// Payload shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ArtistPayload {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    albums: Option<ItemList<AlbumItem>>,
}

#[derive(Debug, Deserialize)]
struct AlbumItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<ArtistRef>,
    #[serde(default)]
    tracks_count: Option<u32>,
    #[serde(default)]
    release_date_original: Option<String>,
    #[serde(default)]
    maximum_bit_depth: Option<u32>,
    #[serde(default)]
    maximum_sampling_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    artists: Option<ItemList<SearchArtist>>,
}

#[derive(Debug, Deserialize)]
struct SearchArtist {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumPayload {
    #[serde(default)]
    tracks: Option<ItemList<TrackItem>>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    #[serde(default)]
    title: Option<String>,
}

/// Catalog ids arrive as either JSON strings or numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Leading four digits of "YYYY-MM-DD", 0 when absent or unparsable.
fn parse_year(release_date: Option<&str>) -> i32 {
    release_date
        .and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .and_then(|y| y.parse().ok())
        .unwrap_or(0)
}

// ============================================================================
// Artist albums
// ============================================================================

/// Parse an `artist/get?extra=albums` payload into catalog releases.
///
/// Skips appearances on other artists' releases, singles/EPs (when `albums_only`),
/// and compilation or live titles. `artist_id` defaults to the payload's own id.
pub fn parse_artist_albums(
    json: &str,
    artist_id: Option<&str>,
    albums_only: bool,
) -> Result<Vec<CatalogAlbum>> {
    let payload: ArtistPayload =
        serde_json::from_str(json).context("Failed to parse artist payload")?;

    let artist_id = match artist_id {
        Some(id) => id.to_string(),
        None => match payload.id.as_ref().and_then(id_string) {
            Some(id) => id,
            None => bail!("Artist payload has no id; an explicit artist id is required"),
        },
    };
    let artist_name = payload.name.unwrap_or_else(|| "Unknown".to_string());

    let items = payload.albums.map(|a| a.items).unwrap_or_default();
    let total = items.len();
    let mut albums = Vec::with_capacity(total);

    for item in items {
        let owner = item.artist.as_ref().and_then(|a| a.id.as_ref()).and_then(id_string);
        if owner.as_deref() != Some(artist_id.as_str()) {
            continue;
        }

        let track_count = item.tracks_count.unwrap_or(0);
        if albums_only && track_count < MIN_ALBUM_TRACKS {
            continue;
        }

        let title = item.title.unwrap_or_else(|| "Unknown".to_string());
        if is_compilation_or_live(&title) {
            continue;
        }

        let Some(id) = item.id.as_ref().and_then(id_string) else {
            debug!("Skipping '{}': release has no id", title);
            continue;
        };

        albums.push(CatalogAlbum {
            url: format!("https://www.qobuz.com/album/{}", id),
            id,
            title,
            year: parse_year(item.release_date_original.as_deref()),
            artist: artist_name.clone(),
            track_count,
            bit_depth: item
                .maximum_bit_depth
                .filter(|&b| b > 0)
                .unwrap_or(DEFAULT_BIT_DEPTH),
            sample_rate: item
                .maximum_sampling_rate
                .filter(|&r| r > 0.0)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
        });
    }

    debug!(
        "Artist {} ({}): kept {} of {} releases",
        artist_name,
        artist_id,
        albums.len(),
        total
    );

    Ok(albums)
}

/// Parse and reconcile an artist payload: one canonical album per distinct title.
pub fn artist_albums(
    json: &str,
    artist_id: Option<&str>,
    albums_only: bool,
) -> Result<(Vec<CanonicalAlbum>, ReconcileStats)> {
    let releases = parse_artist_albums(json, artist_id, albums_only)?;
    Ok(reconcile_with_stats(releases))
}

// ============================================================================
// Artist search
// ============================================================================

/// Pick the artist matching `name` from an `artist/search` payload.
///
/// First an exact case-insensitive match against the search variants (with and without
/// "The"), then a match after dropping a leading "the " from the catalog name.
pub fn select_artist(search_json: &str, name: &str) -> Result<Option<CatalogArtist>> {
    let payload: SearchPayload =
        serde_json::from_str(search_json).context("Failed to parse artist search payload")?;

    let candidates: Vec<CatalogArtist> = payload
        .artists
        .map(|a| a.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            Some(CatalogArtist {
                id: a.id.as_ref().and_then(id_string)?,
                name: a.name.unwrap_or_default(),
            })
        })
        .collect();

    let variants: Vec<String> = artist_search_variants(name)
        .iter()
        .map(|v| v.to_lowercase())
        .collect();

    if let Some(exact) = candidates
        .iter()
        .find(|a| variants.contains(&a.name.to_lowercase()))
    {
        return Ok(Some(exact.clone()));
    }

    let prefixed = candidates.iter().find(|a| {
        a.name
            .to_lowercase()
            .strip_prefix("the ")
            .is_some_and(|rest| variants.iter().any(|v| v == rest))
    });

    Ok(prefixed.cloned())
}

// ============================================================================
// Album tracks
// ============================================================================

/// Track titles from an `album/get` payload, in order, skipping empty titles.
pub fn parse_album_tracks(json: &str) -> Result<Vec<String>> {
    let payload: AlbumPayload =
        serde_json::from_str(json).context("Failed to parse album payload")?;

    Ok(payload
        .tracks
        .map(|t| t.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| t.title.filter(|title| !title.is_empty()))
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
