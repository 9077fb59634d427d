//! Safety utilities to prevent accidental file deletion.
//!
//! Bonus-track pruning deletes audio files. These checks make sure it only ever
//! touches tracks directly inside a single album folder.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::library::{parse_album_folder, parse_new_folder};

/// Validates that a directory is an album folder that may have tracks pruned.
///
/// Checks:
/// - Path exists and is a directory
/// - Folder name is an album folder ("[YYYY] Title" or "Artist - [YYYY] Title")
/// - Folder has no subdirectories (letter and artist folders always do)
pub fn validate_album_dir(album_dir: &Path) -> Result<()> {
    if !album_dir.is_dir() {
        bail!(
            "Safety check failed: '{}' is not a directory",
            album_dir.display()
        );
    }

    let name = album_dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if parse_album_folder(name).is_none() && parse_new_folder(name).is_none() {
        bail!(
            "Safety check failed: '{}' is not an album folder ('[YYYY] Title')",
            album_dir.display()
        );
    }

    for entry in std::fs::read_dir(album_dir)? {
        if entry?.path().is_dir() {
            bail!(
                "Safety check failed: album folder '{}' contains subdirectories",
                album_dir.display()
            );
        }
    }

    Ok(())
}

/// Validates a removal plan before any file is deleted.
///
/// Checks:
/// - Every target is a `.flac` file directly inside `album_dir`
/// - The plan leaves at least one track (a whitelist matching nothing points at the
///   wrong standard edition, not at an album made only of bonus tracks)
pub fn validate_removal_plan(album_dir: &Path, targets: &[PathBuf], track_total: usize) -> Result<()> {
    for target in targets {
        if target.parent() != Some(album_dir) {
            bail!(
                "Safety check failed: '{}' is outside album folder '{}'",
                target.display(),
                album_dir.display()
            );
        }
        if target.extension().and_then(|e| e.to_str()) != Some("flac") {
            bail!(
                "Safety check failed: '{}' is not a FLAC track",
                target.display()
            );
        }
    }

    if !targets.is_empty() && targets.len() >= track_total {
        bail!(
            "Safety check failed: refusing to remove all {} tracks from '{}'",
            track_total,
            album_dir.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_valid_album_dir() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("[1997] OK Computer");
        fs::create_dir(&album).unwrap();
        fs::write(album.join("01 - Airbag.flac"), "").unwrap();
        assert!(validate_album_dir(&album).is_ok());
    }

    #[test]
    fn test_valid_download_folder() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("Radiohead - [1997] OK Computer");
        fs::create_dir(&album).unwrap();
        assert!(validate_album_dir(&album).is_ok());
    }

    #[test]
    fn test_rejects_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(validate_album_dir(&dir.path().join("[1997] Gone")).is_err());
    }

    #[test]
    fn test_rejects_artist_folder() {
        let dir = TempDir::new().unwrap();
        let artist = dir.path().join("Radiohead");
        fs::create_dir_all(artist.join("[1997] OK Computer")).unwrap();
        let err = validate_album_dir(&artist).unwrap_err();
        assert!(err.to_string().contains("not an album folder"));
    }

    #[test]
    fn test_rejects_album_with_subdirectories() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("[1997] OK Computer");
        fs::create_dir_all(album.join("Disc 1")).unwrap();
        let err = validate_album_dir(&album).unwrap_err();
        assert!(err.to_string().contains("subdirectories"));
    }

    #[test]
    fn test_removal_plan_valid() {
        let album = PathBuf::from("/music/R/Radiohead/[1997] OK Computer");
        let targets = vec![album.join("13 - Bonus.flac")];
        assert!(validate_removal_plan(&album, &targets, 13).is_ok());
        assert!(validate_removal_plan(&album, &[], 0).is_ok());
    }

    #[test]
    fn test_removal_plan_rejects_outside_files() {
        let album = PathBuf::from("/music/R/Radiohead/[1997] OK Computer");
        let targets = vec![PathBuf::from("/music/R/Radiohead/cover.flac")];
        assert!(validate_removal_plan(&album, &targets, 10).is_err());
    }

    #[test]
    fn test_removal_plan_rejects_non_flac() {
        let album = PathBuf::from("/music/R/Radiohead/[1997] OK Computer");
        let targets = vec![album.join("cover.jpg")];
        assert!(validate_removal_plan(&album, &targets, 10).is_err());
    }

    #[test]
    fn test_removal_plan_rejects_removing_everything() {
        let album = PathBuf::from("/music/R/Radiohead/[1997] OK Computer");
        let targets = vec![album.join("01 - Airbag.flac"), album.join("02 - Paranoid Android.flac")];
        let err = validate_removal_plan(&album, &targets, 2).unwrap_err();
        assert!(err.to_string().contains("refusing to remove all"));
    }
}
