//! Ignore list: artists and albums excluded from missing-album discovery.
//!
//! Stored as pretty-printed JSON:
//! `{"artists": ["Name"], "albums": [{"artist": "Name", "album": "Title"}]}`.
//! All comparisons are case-insensitive.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredAlbum {
    pub artist: String,
    pub album: String,
}

impl IgnoredAlbum {
    fn matches(&self, artist: &str, album: &str) -> bool {
        self.artist.to_lowercase() == artist.to_lowercase()
            && self.album.to_lowercase() == album.to_lowercase()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreList {
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub albums: Vec<IgnoredAlbum>,
}

/// `<config dir>/music-librarian/ignore.json`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-librarian").join("ignore.json"))
}

impl IgnoreList {
    /// Load from disk. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ignore list {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse ignore list {}", path.display()))
    }

    /// Write to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write ignore list {}", path.display()))?;
        Ok(())
    }

    /// Returns false when already present.
    pub fn add_artist(&mut self, artist: &str) -> bool {
        if self.is_artist_ignored(artist) {
            return false;
        }
        self.artists.push(artist.to_string());
        true
    }

    /// Returns false when not found.
    pub fn remove_artist(&mut self, artist: &str) -> bool {
        let lower = artist.to_lowercase();
        match self.artists.iter().position(|a| a.to_lowercase() == lower) {
            Some(idx) => {
                self.artists.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn add_album(&mut self, artist: &str, album: &str) -> bool {
        if self.is_album_ignored(artist, album) {
            return false;
        }
        self.albums.push(IgnoredAlbum {
            artist: artist.to_string(),
            album: album.to_string(),
        });
        true
    }

    pub fn remove_album(&mut self, artist: &str, album: &str) -> bool {
        match self.albums.iter().position(|e| e.matches(artist, album)) {
            Some(idx) => {
                self.albums.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_artist_ignored(&self, artist: &str) -> bool {
        let lower = artist.to_lowercase();
        self.artists.iter().any(|a| a.to_lowercase() == lower)
    }

    pub fn is_album_ignored(&self, artist: &str, album: &str) -> bool {
        self.albums.iter().any(|e| e.matches(artist, album))
    }

    /// Match under any artist variant (`artist_name`, `canonical_name`, "The " + `canonical_name`)
    /// and any title variant (`title`, `normalized_title`).
    pub fn is_album_ignored_with_variants(
        &self,
        artist_name: &str,
        canonical_name: &str,
        title: &str,
        normalized_title: &str,
    ) -> bool {
        let artists = [
            artist_name.to_string(),
            canonical_name.to_string(),
            format!("The {}", canonical_name),
        ];
        let titles = [title, normalized_title];

        artists
            .iter()
            .any(|a| titles.iter().any(|t| self.is_album_ignored(a, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated() -> IgnoreList {
        IgnoreList {
            artists: vec!["Nickelback".to_string(), "Creed".to_string()],
            albums: vec![
                IgnoredAlbum {
                    artist: "The Beatles".to_string(),
                    album: "Yellow Submarine".to_string(),
                },
                IgnoredAlbum {
                    artist: "Radiohead".to_string(),
                    album: "kid a".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let dir = TempDir::new().unwrap();
        let list = IgnoreList::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(list, IgnoreList::default());
    }

    #[test]
    fn test_roundtrip_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("dir").join("ignore.json");
        let list = populated();
        list.save(&path).unwrap();
        assert!(path.exists());
        assert_eq!(IgnoreList::load(&path).unwrap(), list);
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ignore.json");
        populated().save(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["artists"][0], "Nickelback");
        assert_eq!(value["albums"][0]["artist"], "The Beatles");
        assert_eq!(value["albums"][0]["album"], "Yellow Submarine");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ignore.json");
        fs::write(&path, r#"{"artists": ["Foo"]}"#).unwrap();
        let list = IgnoreList::load(&path).unwrap();
        assert_eq!(list.artists, vec!["Foo".to_string()]);
        assert!(list.albums.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ignore.json");
        fs::write(&path, "{").unwrap();
        assert!(IgnoreList::load(&path).is_err());
    }

    #[test]
    fn test_artist_add_remove() {
        let mut list = populated();
        assert!(!list.add_artist("NICKELBACK"));
        assert!(list.add_artist("Staind"));
        assert!(list.is_artist_ignored("staind"));
        assert!(list.remove_artist("creed"));
        assert!(!list.remove_artist("creed"));
        assert_eq!(list.artists, vec!["Nickelback".to_string(), "Staind".to_string()]);
    }

    #[test]
    fn test_album_add_remove() {
        let mut list = populated();
        assert!(!list.add_album("the beatles", "YELLOW SUBMARINE"));
        assert!(list.add_album("Radiohead", "Amnesiac"));
        assert!(list.is_album_ignored("radiohead", "amnesiac"));
        assert!(!list.is_album_ignored("Portishead", "Amnesiac"));
        assert!(list.remove_album("RADIOHEAD", "Amnesiac"));
        assert!(!list.remove_album("Radiohead", "Amnesiac"));
    }

    #[test]
    fn test_ignored_with_variants() {
        let list = populated();
        // Library stores "Beatles"; ignore entry uses "The Beatles"
        assert!(list.is_album_ignored_with_variants(
            "Beatles",
            "Beatles",
            "Yellow Submarine",
            "yellow submarine"
        ));
        // Matched through the normalized title only
        assert!(list.is_album_ignored_with_variants(
            "Radiohead",
            "Radiohead",
            "Kid A (Remastered)",
            "kid a"
        ));
        assert!(!list.is_album_ignored_with_variants(
            "Radiohead",
            "Radiohead",
            "Amnesiac",
            "amnesiac"
        ));
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = default_path() {
            assert!(path.ends_with("music-librarian/ignore.json"));
        }
    }
}
