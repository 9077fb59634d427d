//! Missing-album discovery: canonical catalog albums absent from the local library.

use rustc_hash::FxHashSet;

use crate::ignore::IgnoreList;
use crate::models::CanonicalAlbum;
use crate::normalize::normalize_album_title;

/// Keep albums whose normalized title matches none of the existing library titles.
///
/// Years are ignored: a remaster filed under its original year still counts as owned.
pub fn missing_albums(
    canonical: Vec<CanonicalAlbum>,
    existing: &[(i32, String)],
) -> Vec<CanonicalAlbum> {
    let owned: FxHashSet<String> = existing
        .iter()
        .map(|(_, title)| normalize_album_title(title))
        .collect();

    canonical
        .into_iter()
        .filter(|album| !owned.contains(&normalize_album_title(album.title())))
        .collect()
}

/// Drop albums the ignore list excludes for this artist, under any name or title variant.
pub fn filter_ignored(
    albums: Vec<CanonicalAlbum>,
    artist_name: &str,
    canonical_name: &str,
    ignore: &IgnoreList,
) -> Vec<CanonicalAlbum> {
    albums
        .into_iter()
        .filter(|album| {
            !ignore.is_album_ignored_with_variants(
                artist_name,
                canonical_name,
                album.title(),
                &normalize_album_title(album.title()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogAlbum;

    fn canonical(id: &str, title: &str, year: i32) -> CanonicalAlbum {
        CanonicalAlbum::passthrough(CatalogAlbum {
            id: id.to_string(),
            title: title.to_string(),
            year,
            artist: "Beatles".to_string(),
            url: format!("https://www.qobuz.com/album/{}", id),
            track_count: 12,
            bit_depth: 24,
            sample_rate: 96.0,
        })
    }

    #[test]
    fn test_missing_albums_by_normalized_title() {
        let catalog = vec![
            canonical("1", "Revolver (Remastered 2009)", 1966),
            canonical("2", "Abbey Road", 1969),
            canonical("3", "Let It Be", 1970),
        ];
        let existing = vec![
            (1966, "Revolver".to_string()),
            (2019, "Abbey Road [Super Deluxe]".to_string()),
        ];
        let missing = missing_albums(catalog, &existing);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id(), "3");
    }

    #[test]
    fn test_missing_albums_empty_library() {
        let catalog = vec![canonical("1", "Help!", 1965)];
        assert_eq!(missing_albums(catalog.clone(), &[]), catalog);
    }

    #[test]
    fn test_missing_albums_punctuation_insensitive() {
        let catalog = vec![canonical("1", "Sgt. Pepper's Lonely Hearts Club Band", 1967)];
        let existing = vec![(1967, "Sgt Peppers Lonely Hearts Club Band".to_string())];
        // Apostrophe folds to a space, so "pepper s" != "peppers"
        assert_eq!(missing_albums(catalog.clone(), &existing).len(), 1);

        let existing = vec![(1967, "Sgt. Pepper's Lonely Hearts Club Band".to_string())];
        assert!(missing_albums(catalog, &existing).is_empty());
    }

    #[test]
    fn test_filter_ignored() {
        let mut ignore = IgnoreList::default();
        ignore.add_album("The Beatles", "Yellow Submarine");
        ignore.add_album("Beatles", "let it be");

        let albums = vec![
            canonical("1", "Yellow Submarine", 1969),
            canonical("2", "Let It Be (Remastered)", 1970),
            canonical("3", "Rubber Soul", 1965),
        ];
        let kept = filter_ignored(albums, "Beatles", "Beatles", &ignore);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), "3");
    }
}
