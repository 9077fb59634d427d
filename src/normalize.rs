//! Title and artist normalization for catalog reconciliation.
//! Used by the reconciler, missing-album discovery, the ignore list and bonus-track pruning.
//!
//! CRITICAL: discovery and reconciliation must derive album keys from the same
//! `normalize_album_title`. Any change here changes which albums are considered owned.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Album edition-marker patterns (applied in order, first match wins per position).
pub static ALBUM_EDITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Parenthetical markers matched by keyword: "(Deluxe Edition)", "(2023 Deluxe Remaster)"
        Regex::new(r"(?i)\s*\([^)]*deluxe[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*remaster[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*expanded[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*anniversary[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*special[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*edition[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*version[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\([^)]*bonus[^)]*\)").unwrap(),
        // "(US Release)", "(UK Release)"
        Regex::new(r"(?i)\s*\([^)]*release[^)]*\)").unwrap(),
        // Exact-phrase spans
        Regex::new(r"(?i)\s*\(explicit\)").unwrap(),
        Regex::new(r"(?i)\s*\(clean\)").unwrap(),
        Regex::new(r"(?i)\s*\(stereo\)").unwrap(),
        Regex::new(r"(?i)\s*\(mono\)").unwrap(),
        Regex::new(r"(?i)\s*\(and more\)").unwrap(),
        // Bracketed markers: "[Deluxe]", "[2020 Remaster]", "[Super Deluxe]"
        Regex::new(r"(?i)\s*\[[^\]]*deluxe[^\]]*\]").unwrap(),
        Regex::new(r"(?i)\s*\[[^\]]*remaster[^\]]*\]").unwrap(),
        Regex::new(r"(?i)\s*\[[^\]]*edition[^\]]*\]").unwrap(),
        Regex::new(r"(?i)\s*\[[^\]]*super\s+deluxe[^\]]*\]").unwrap(),
        // Trailing markers without delimiters: "Album Deluxe Edition", "Album - Remaster"
        Regex::new(r"(?i)\s*deluxe\s*edition\s*$").unwrap(),
        Regex::new(r"(?i)\s*remastered\s*$").unwrap(),
        Regex::new(r"(?i)\s*-\s*remaster\s*$").unwrap(),
        Regex::new(r"(?i)\s*\.\.\.and\s+more\s*$").unwrap(),
        // Beatles subtitle: "The Beatles (White Album)"
        Regex::new(r"(?i)\s*\(white\s+album\)").unwrap(),
    ]
});

/// Track title patterns. Narrower than the album list so "(Part 2)" survives.
pub static TRACK_EDITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s*\(remaster[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\(mono[^)]*\)").unwrap(),
        Regex::new(r"(?i)\s*\(stereo[^)]*\)").unwrap(),
        // Year annotations: "(2009 Mix)", "(1987)"
        Regex::new(r"(?i)\s*\(\d{4}[^)]*\)").unwrap(),
    ]
});

/// Punctuation that differs across catalog sources for the same album.
/// Colon, ASCII and curly apostrophes/quotes, backtick, period and comma.
pub static TITLE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:'`.,\x{2018}\x{2019}\x{201C}\x{201D}]").unwrap());

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Leading track number on a file stem: "01 - Song", "3. Song", "12-Song"
pub static TRACK_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[\s.\-]+(.+)").unwrap());

/// Compilation titles are not studio albums and are skipped during ingestion.
pub static COMPILATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bgreatest\s+hits\b").unwrap(),
        Regex::new(r"(?i)\bbest\s+of\b").unwrap(),
        Regex::new(r"(?i)\bessential\b").unwrap(),
        Regex::new(r"(?i)\bcollection\b").unwrap(),
        Regex::new(r"(?i)\banthology\b").unwrap(),
        Regex::new(r"(?i)\bretrospective\b").unwrap(),
        Regex::new(r"(?i)\bcompilation\b").unwrap(),
        Regex::new(r"(?i)\bcomplete\s+recordings\b").unwrap(),
        Regex::new(r"(?i)\bdefinitive\b").unwrap(),
        Regex::new(r"(?i)\bultimate\b").unwrap(),
        Regex::new(r"(?i)\bsingles\b").unwrap(),
        Regex::new(r"(?i)\bhits\b").unwrap(),
        Regex::new(r"(?i)\bfavorites\b").unwrap(),
        Regex::new(r"(?i)\brarities\b").unwrap(),
        Regex::new(r"(?i)\bouttakes\b").unwrap(),
        Regex::new(r"(?i)\bbox\s*set\b").unwrap(),
        Regex::new(r"(?i)\bbox\b.*\bset\b").unwrap(),
        // "The Abbey Road Box"
        Regex::new(r"(?i)\bthe\s+.+\s+box\s*$").unwrap(),
    ]
});

pub static LIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\blive\b").unwrap(),
        Regex::new(r"(?i)\bin\s+concert\b").unwrap(),
        Regex::new(r"(?i)\bunplugged\b").unwrap(),
        Regex::new(r"(?i)\bacoustic\s+live\b").unwrap(),
        Regex::new(r"(?i)\blive\s+at\b").unwrap(),
        Regex::new(r"(?i)\blive\s+from\b").unwrap(),
        Regex::new(r"(?i)\blive\s+in\b").unwrap(),
        // Concert films and live records without the word "live"
        Regex::new(r"(?i)\bstop\s+making\s+sense\b").unwrap(),
        Regex::new(r"(?i)\bname\s+of\s+this\s+band\b").unwrap(),
    ]
});

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII: NFKD, drop combining marks, transliterate the rest.
/// e.g., "Beyoncé" → "beyonce", "Motörhead" → "motorhead"
///
/// Only used for fuzzy artist lookup. Album keys never go through this.
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Apply a pattern list in order, each pattern replacing every match.
fn strip_patterns(s: &str, patterns: &[Regex]) -> String {
    let mut result = s.to_string();
    for pattern in patterns {
        result = pattern.replace_all(&result, "").to_string();
    }
    result
}

/// Fold "&" to "and", punctuation to spaces, then collapse whitespace.
/// e.g., "Sgt. Pepper's" → "sgt pepper s"
pub fn fold_punctuation(s: &str) -> String {
    let result = s.replace('&', "and");
    let result = TITLE_PUNCTUATION.replace_all(&result, " ");
    MULTI_SPACE.replace_all(&result, " ").trim().to_string()
}

// ============================================================================
// ALBUM TITLES
// ============================================================================

fn normalize_album_title_once(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = strip_patterns(lowered.trim(), &ALBUM_EDITION_PATTERNS);
    fold_punctuation(&stripped)
}

/// Normalize an album title into its grouping key.
/// "Abbey Road (2019 Remaster)" and "Abbey Road" both become "abbey road".
///
/// Punctuation folding can expose a trailing marker ("Album Remastered." → "album remastered"),
/// so the pass is repeated until the key is stable. Every pass after the first only removes text.
pub fn normalize_album_title(title: &str) -> String {
    let mut key = normalize_album_title_once(title);
    loop {
        let next = normalize_album_title_once(&key);
        if next == key {
            return key;
        }
        key = next;
    }
}

/// Remove edition markers but keep the original casing and punctuation.
/// e.g., "Abbey Road (Deluxe Edition)" → "Abbey Road"
pub fn strip_edition_markers(title: &str) -> String {
    strip_patterns(title, &ALBUM_EDITION_PATTERNS).trim().to_string()
}

/// Re-capitalize a normalized key for display.
/// A cased letter is uppercased when it starts the string or follows an uncased character
/// (digits, punctuation, CJK). e.g., "ok computer" → "Ok Computer", "東京story" → "東京Story"
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_is_cased = false;
    for c in key.chars() {
        if c.is_lowercase() || c.is_uppercase() {
            if prev_is_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_cased = true;
        } else {
            out.push(c);
            prev_is_cased = false;
        }
    }
    out
}

/// Clean/censored pressing, e.g. "Album (Clean)".
pub fn is_clean_version(title: &str) -> bool {
    title.to_lowercase().contains("(clean)")
}

/// Greatest hits, box sets, live records and the like.
pub fn is_compilation_or_live(title: &str) -> bool {
    COMPILATION_PATTERNS
        .iter()
        .chain(LIVE_PATTERNS.iter())
        .any(|p| p.is_match(title))
}

// ============================================================================
// TRACK TITLES
// ============================================================================

/// Normalize a track title for whitelist comparison during bonus-track pruning.
/// Strips remaster/mono/stereo and year annotations only: "Song (Part 2)" keeps its suffix.
pub fn normalize_track_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    strip_patterns(lowered.trim(), &TRACK_EDITION_PATTERNS)
        .trim()
        .to_string()
}

/// Extract the track title from a file stem by dropping a leading track number.
/// e.g., "01 - Come Together" → "Come Together"; "Intro" → "Intro"
pub fn extract_track_title(stem: &str) -> String {
    TRACK_NUMBER_PREFIX
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| stem.to_string())
}

// ============================================================================
// ARTISTS
// ============================================================================

/// Strip a single leading "The " (any case). "The The" → "The".
pub fn normalize_artist(name: &str) -> String {
    match name.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("the ") => name[4..].to_string(),
        _ => name.to_string(),
    }
}

/// Search variants for an artist: without and with the "The " prefix.
pub fn artist_search_variants(name: &str) -> [String; 2] {
    let normalized = normalize_artist(name);
    if normalized == name {
        [normalized, format!("The {}", name)]
    } else {
        [normalized, name.to_string()]
    }
}

/// Alphabetical folder for an artist, ignoring "The ". Falls back to "A".
pub fn letter_for_artist(name: &str) -> String {
    normalize_artist(name)
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "A".to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_album_title_markers() {
        assert_eq!(normalize_album_title("Album (Deluxe Edition)"), "album");
        assert_eq!(normalize_album_title("Album (Remastered 2023)"), "album");
        assert_eq!(normalize_album_title("Album (2020 Remaster)"), "album");
        assert_eq!(normalize_album_title("Album [Deluxe]"), "album");
        assert_eq!(normalize_album_title("Album [2020 Remaster]"), "album");
        assert_eq!(normalize_album_title("Album [Super Deluxe]"), "album");
        assert_eq!(normalize_album_title("Album (US Release)"), "album");
        assert_eq!(normalize_album_title("Album (Explicit)"), "album");
        assert_eq!(normalize_album_title("Album (Clean)"), "album");
        assert_eq!(normalize_album_title("Album (and more)"), "album");
        assert_eq!(normalize_album_title("Album (25th Anniversary Edition)"), "album");
        assert_eq!(normalize_album_title("Album (Bonus Track Version)"), "album");
    }

    #[test]
    fn test_normalize_album_title_novel_phrasing() {
        // Keyword inside delimiters, not whole-phrase match
        assert_eq!(normalize_album_title("Album (2023 Deluxe Remaster)"), "album");
        assert_eq!(normalize_album_title("Album (Japanese Special Pressing)"), "album");
    }

    #[test]
    fn test_normalize_album_title_trailing_markers() {
        assert_eq!(normalize_album_title("Album Remastered"), "album");
        assert_eq!(normalize_album_title("Album - Remaster"), "album");
        assert_eq!(normalize_album_title("Album Deluxe Edition"), "album");
        assert_eq!(normalize_album_title("Album ...and more"), "album");
        assert_eq!(normalize_album_title("The Beatles (White Album)"), "the beatles");
    }

    #[test]
    fn test_normalize_album_title_multiple_markers() {
        assert_eq!(
            normalize_album_title("Album (Deluxe Edition) (Remastered 2020)"),
            "album"
        );
    }

    #[test]
    fn test_normalize_album_title_case_and_whitespace() {
        assert_eq!(normalize_album_title("Album   (Deluxe Edition)"), "album");
        assert_eq!(normalize_album_title("album (deluxe edition)"), "album");
        assert_eq!(normalize_album_title("  OK   Computer  "), "ok computer");
    }

    #[test]
    fn test_normalize_album_title_ampersand() {
        assert_eq!(normalize_album_title("Love & Theft"), "love and theft");
        assert_eq!(normalize_album_title("Love and Theft"), "love and theft");
    }

    #[test]
    fn test_normalize_album_title_punctuation() {
        assert_eq!(normalize_album_title("What's Going On"), "what s going on");
        assert_eq!(normalize_album_title("What\u{2019}s Going On"), "what s going on");
        assert_eq!(
            normalize_album_title("Sgt. Pepper's Lonely Hearts Club Band"),
            "sgt pepper s lonely hearts club band"
        );
        assert_eq!(normalize_album_title("Hello, Goodbye: Live"), "hello goodbye live");
        assert_eq!(
            normalize_album_title("\u{201C}Heroes\u{201D}"),
            normalize_album_title("Heroes")
        );
    }

    #[test]
    fn test_normalize_album_title_edge_cases() {
        assert_eq!(normalize_album_title(""), "");
        assert_eq!(normalize_album_title("(Deluxe Edition)"), "");
        assert_eq!(normalize_album_title("Ænima ☃"), "ænima ☃");
    }

    #[test]
    fn test_normalize_album_title_idempotent() {
        let samples = [
            "Abbey Road (2019 Remaster)",
            "Album Remastered.",
            "Album Deluxe, Edition",
            "Love & Theft",
            "  Weird   Spacing , here  ",
            "(Clean)",
            "Sgt. Pepper's [Super Deluxe]",
            "",
        ];
        for s in samples {
            let once = normalize_album_title(s);
            assert_eq!(normalize_album_title(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_strip_edition_markers_preserves_case() {
        assert_eq!(strip_edition_markers("Abbey Road (Deluxe Edition)"), "Abbey Road");
        assert_eq!(strip_edition_markers("Rumours Remastered"), "Rumours");
        assert_eq!(strip_edition_markers("Album - Remaster"), "Album");
        assert_eq!(strip_edition_markers("Album [Super Deluxe]"), "Album");
        assert_eq!(strip_edition_markers("Album ...and more"), "Album");
        assert_eq!(strip_edition_markers("Album (Stereo)"), "Album");
        assert_eq!(strip_edition_markers("The Beatles (White Album)"), "The Beatles");
        assert_eq!(strip_edition_markers("Abbey Road"), "Abbey Road");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ok computer"), "Ok Computer");
        assert_eq!(title_case("love and theft"), "Love And Theft");
        assert_eq!(title_case("what s going on"), "What S Going On");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_title_case_uncased_scripts() {
        assert_eq!(title_case("東京story"), "東京Story");
        assert_eq!(title_case("日本abc the 1st"), "日本Abc The 1St");
    }

    #[test]
    fn test_is_clean_version() {
        assert!(is_clean_version("Album (Clean)"));
        assert!(is_clean_version("Album (CLEAN)"));
        assert!(!is_clean_version("Album (Explicit)"));
        assert!(!is_clean_version("Album"));
    }

    #[test]
    fn test_is_compilation_or_live() {
        for title in [
            "Greatest Hits",
            "The Best of Radiohead",
            "Anthology 1",
            "Rarities & B-Sides",
            "Box Set",
            "The Abbey Road Box",
            "Live at Budokan",
            "MTV Unplugged",
            "In Concert",
            "Stop Making Sense",
            "The Name of This Band Is Talking Heads",
            "GREATEST HITS",
        ] {
            assert!(is_compilation_or_live(title), "{} should be skipped", title);
        }
        for title in ["Abbey Road", "OK Computer", "Rumours", "Alive Honey", "Oliver's Army"] {
            assert!(!is_compilation_or_live(title), "{} should be kept", title);
        }
    }

    #[test]
    fn test_normalize_track_title() {
        assert_eq!(normalize_track_title("Song (Remastered 2023)"), "song");
        assert_eq!(normalize_track_title("Song (Mono)"), "song");
        assert_eq!(normalize_track_title("Song (Stereo Mix)"), "song");
        assert_eq!(normalize_track_title("Song (2020 Mix)"), "song");
        assert_eq!(normalize_track_title("SONG TITLE"), "song title");
        // Regular parentheticals are preserved
        assert_eq!(normalize_track_title("Song (Part 2)"), "song (part 2)");
    }

    #[test]
    fn test_extract_track_title() {
        assert_eq!(extract_track_title("01 - Come Together"), "Come Together");
        assert_eq!(extract_track_title("3. Something"), "Something");
        assert_eq!(extract_track_title("12-Octopus's Garden"), "Octopus's Garden");
        assert_eq!(extract_track_title("Because"), "Because");
    }

    #[test]
    fn test_normalize_artist() {
        assert_eq!(normalize_artist("The Beatles"), "Beatles");
        assert_eq!(normalize_artist("the rolling stones"), "rolling stones");
        assert_eq!(normalize_artist("Radiohead"), "Radiohead");
        assert_eq!(normalize_artist("The The"), "The");
        assert_eq!(normalize_artist("The "), "");
        assert_eq!(normalize_artist("Thee Oh Sees"), "Thee Oh Sees");
        assert_eq!(normalize_artist(""), "");
    }

    #[test]
    fn test_artist_search_variants() {
        assert_eq!(
            artist_search_variants("Radiohead"),
            ["Radiohead".to_string(), "The Radiohead".to_string()]
        );
        assert_eq!(
            artist_search_variants("The Beatles"),
            ["Beatles".to_string(), "The Beatles".to_string()]
        );
    }

    #[test]
    fn test_letter_for_artist() {
        assert_eq!(letter_for_artist("Radiohead"), "R");
        assert_eq!(letter_for_artist("The Beatles"), "B");
        assert_eq!(letter_for_artist("the beatles"), "B");
        assert_eq!(letter_for_artist(""), "A");
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Björk"), "bjork");
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
    }
}
