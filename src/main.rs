use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use music_librarian::catalog::{artist_albums, select_artist};
use music_librarian::discovery::{filter_ignored, missing_albums};
use music_librarian::ignore::{self, IgnoreList};
use music_librarian::library::{
    artist_path, artist_similarity, check_volume_mounted, find_album_directories,
    find_matching_artist, scan_library, DEFAULT_MATCH_THRESHOLD,
};
use music_librarian::models::{CanonicalAlbum, ReconcileStats};
use music_librarian::normalize::{
    is_clean_version, is_compilation_or_live, normalize_album_title, normalize_artist,
    normalize_track_title, strip_edition_markers,
};
use music_librarian::progress::{
    create_progress_bar, create_spinner, format_duration, log_progress, set_log_only,
};
use music_librarian::prune::{remove_bonus_tracks, AlbumPayloadDir};

const DEFAULT_LIBRARY: &str = "/Volumes/music/Alphabetical";

#[derive(Parser)]
#[command(name = "music-librarian")]
#[command(about = "Reconcile catalog album editions and find what the library is missing")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Library root (<root>/<Letter>/<Artist>/[YYYY] Album)
    #[arg(long, global = true, default_value = DEFAULT_LIBRARY)]
    library: PathBuf,

    /// Ignore list JSON (default: <config dir>/music-librarian/ignore.json)
    #[arg(long, global = true)]
    ignore_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide progress bars, print plain progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    /// Debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile artist payloads (artist/get?extra=albums JSON) into canonical albums
    Reconcile {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Artist id to keep releases for (default: each payload's own id)
        #[arg(long)]
        artist_id: Option<String>,

        /// Keep singles and EPs
        #[arg(long)]
        all_releases: bool,

        /// Print canonical albums as JSON
        #[arg(long)]
        json: bool,

        /// Write reconciliation stats JSON to this path
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Albums in an artist payload that the library does not have
    Missing {
        file: PathBuf,

        /// Library artist name (fuzzy matched)
        #[arg(long)]
        artist: String,

        #[arg(long, conflicts_with = "search")]
        artist_id: Option<String>,

        /// artist/search JSON used to resolve the catalog artist id
        #[arg(long)]
        search: Option<PathBuf>,
    },

    /// List artists and albums in the library
    Scan,

    /// List album folders under a path
    Albums { path: PathBuf },

    /// Remove bonus tracks not on the standard edition
    Prune {
        album_dir: PathBuf,

        #[arg(long)]
        standard_id: String,

        /// Directory of album/get payloads named <release id>.json
        #[arg(long)]
        tracks_dir: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Print normalized grouping keys
    Normalize {
        #[arg(required = true)]
        titles: Vec<String>,

        /// Use the track-title normalizer
        #[arg(long)]
        track: bool,
    },

    /// Manage ignored artists and albums
    Ignore {
        #[command(subcommand)]
        action: IgnoreAction,
    },
}

#[derive(Subcommand)]
enum IgnoreAction {
    /// Ignore an artist, or one album when a title is given
    Add { artist: String, album: Option<String> },
    /// Stop ignoring an artist, or one album when a title is given
    Remove { artist: String, album: Option<String> },
    List,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// "[1997] Ok Computer (24bit/96kHz, 12 tracks, 2 bonus) id:abc"
fn format_album(album: &CanonicalAlbum) -> String {
    let detail = match album.standard_track_count() {
        Some(n) => format!(
            "{}, {} tracks, {} bonus",
            album.fidelity_label(),
            n,
            album.bonus_track_count()
        ),
        None => album.fidelity_label(),
    };
    format!("[{}] {} ({}) id:{}", album.year(), album.title(), detail, album.id())
}

fn read_payload(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn ignore_path(args_path: Option<PathBuf>) -> Result<PathBuf> {
    args_path
        .or_else(ignore::default_path)
        .context("No config directory found; pass --ignore-file")
}

fn require_library(root: &Path) -> Result<()> {
    if !root.exists() {
        bail!("Library path does not exist: {}", root.display());
    }
    if !check_volume_mounted(root) {
        bail!("Library volume not mounted (empty): {}", root.display());
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn run_reconcile(
    files: &[PathBuf],
    artist_id: Option<&str>,
    albums_only: bool,
    json: bool,
    stats_path: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let total = files.len() as u64;
    let pb = create_progress_bar(total, "Reconciling");

    let results: Vec<(PathBuf, Result<(Vec<CanonicalAlbum>, ReconcileStats)>)> = files
        .par_iter()
        .map(|path| {
            let result = read_payload(path).and_then(|payload| artist_albums(&payload, artist_id, albums_only));
            pb.inc(1);
            log_progress("reconcile", pb.position(), total, 50);
            (path.clone(), result)
        })
        .collect();

    pb.finish_and_clear();

    let mut totals = ReconcileStats::default();
    let mut all_albums = Vec::new();
    let mut failures = 0usize;

    for (path, result) in results {
        match result {
            Ok((mut albums, stats)) => {
                totals.absorb(&stats);
                albums.sort_by_key(|a| a.year());
                if !json {
                    let artist = albums.first().map(|a| a.album.artist.as_str()).unwrap_or("(none)");
                    println!("\n{} ({} releases -> {} albums)", artist, stats.releases_in, albums.len());
                    for album in &albums {
                        println!("  {}", format_album(album));
                    }
                }
                all_albums.extend(albums);
            }
            Err(e) => {
                eprintln!("Error: {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&all_albums)?);
    } else {
        println!("\n{:=<60}", "");
        println!("Reconciliation complete!");
        println!("  Payloads: {}", files.len() - failures);
        println!("  Releases: {}", totals.releases_in);
        println!("  Canonical albums: {}", totals.canonical_out);
        println!("  Editions collapsed: {}", totals.collapsed());
        println!("  Marked for pruning: {}", totals.marked_for_pruning);
        println!("  Elapsed: {}", format_duration(start.elapsed()));
        println!("{:=<60}", "");
    }

    if let Some(path) = stats_path {
        totals.log_phase("reconcile");
        totals
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    if failures > 0 {
        bail!("{} of {} payloads failed", failures, files.len());
    }
    Ok(())
}

fn run_missing(
    library: &Path,
    ignore_list: &IgnoreList,
    file: &Path,
    artist: &str,
    artist_id: Option<&str>,
    search: Option<&Path>,
) -> Result<()> {
    require_library(library)?;

    let spinner = create_spinner("Scanning library");
    let artists = scan_library(library)?;
    spinner.finish_and_clear();

    let names: Vec<&str> = artists.keys().map(String::as_str).collect();
    let normalized = normalize_artist(artist);
    let key = if artists.contains_key(&normalized) {
        normalized
    } else if let Some(found) = find_matching_artist(artist, &names, DEFAULT_MATCH_THRESHOLD) {
        println!("Matched '{}' to '{}'", artist, found);
        found
    } else {
        println!("Artist '{}' not found in library.", artist);
        let mut scored: Vec<(f64, &str)> = names
            .iter()
            .map(|n| (artist_similarity(artist, n), *n))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        if !scored.is_empty() {
            println!("Did you mean:");
            for (_, name) in scored.iter().take(3) {
                println!("  - {}", name);
            }
        }
        println!("Expected folder: {}", artist_path(library, artist).display());
        return Ok(());
    };

    let Some(entry) = artists.get(&key) else {
        bail!("Artist '{}' disappeared from scan", key);
    };

    if ignore_list.is_artist_ignored(&entry.canonical_name) || ignore_list.is_artist_ignored(&entry.name) {
        println!("{} is ignored.", entry.canonical_name);
        return Ok(());
    }

    let searched_id = match search {
        Some(path) => match select_artist(&read_payload(path)?, &entry.canonical_name)? {
            Some(found) => {
                println!("Catalog artist: {} (id {})", found.name, found.id);
                Some(found.id)
            }
            None => {
                println!("Artist '{}' not found in catalog search.", entry.canonical_name);
                return Ok(());
            }
        },
        None => None,
    };
    let artist_id = searched_id.as_deref().or(artist_id);

    let payload = read_payload(file)?;
    let (canonical, _) = artist_albums(&payload, artist_id, true)?;
    let missing = missing_albums(canonical, &entry.existing_albums());
    let mut missing = filter_ignored(missing, &entry.name, &entry.canonical_name, ignore_list);
    missing.sort_by_key(|a| a.year());

    println!("Checking {}...", entry.canonical_name);
    if missing.is_empty() {
        println!("  No new albums found.");
    } else {
        println!("  Found {} new album(s):", missing.len());
        for album in &missing {
            println!("    {}", format_album(album));
        }
    }
    Ok(())
}

fn run_scan(library: &Path) -> Result<()> {
    require_library(library)?;

    let spinner = create_spinner("Scanning library");
    let artists = scan_library(library)?;
    spinner.finish_and_clear();

    if artists.is_empty() {
        println!("No artists found in library.");
        return Ok(());
    }

    let mut sorted: Vec<_> = artists.values().collect();
    sorted.sort_by_key(|a| a.name.to_lowercase());
    for artist in sorted {
        let mut albums: Vec<_> = artist.albums.iter().collect();
        albums.sort_by_key(|a| a.year);
        let list: Vec<String> = albums.iter().map(|a| format!("[{}] {}", a.year, a.title)).collect();
        println!("{}: {}", artist.canonical_name, list.join(", "));
    }
    println!("\nTotal: {} artists", artists.len());
    Ok(())
}

fn run_prune(album_dir: &Path, standard_id: &str, tracks_dir: &Path, dry_run: bool) -> Result<()> {
    let listing = AlbumPayloadDir::new(tracks_dir);
    let paths = remove_bonus_tracks(album_dir, standard_id, &listing, dry_run)?;

    let verb = if dry_run { "Would remove" } else { "Removed" };
    if paths.is_empty() {
        println!("No bonus tracks removed from {}", album_dir.display());
    }
    for path in &paths {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        println!("{}: {}", verb, name);
    }
    Ok(())
}

fn run_normalize(titles: &[String], track: bool) {
    for title in titles {
        if track {
            println!("{} -> {}", title, normalize_track_title(title));
            continue;
        }
        let mut flags = Vec::new();
        if is_clean_version(title) {
            flags.push("clean");
        }
        if is_compilation_or_live(title) {
            flags.push("compilation/live");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "{} -> {} (display: {}){}",
            title,
            normalize_album_title(title),
            strip_edition_markers(title),
            suffix
        );
    }
}

fn run_ignore(path: &Path, action: IgnoreAction) -> Result<()> {
    let mut list = IgnoreList::load(path)?;

    match action {
        IgnoreAction::Add { artist, album: Some(album) } => {
            if list.add_album(&artist, &album) {
                list.save(path)?;
                println!("Ignored album: {} - {}", artist, album);
            } else {
                println!("Already ignored: {} - {}", artist, album);
            }
        }
        IgnoreAction::Add { artist, album: None } => {
            if list.add_artist(&artist) {
                list.save(path)?;
                println!("Ignored artist: {}", artist);
            } else {
                println!("Already ignored: {}", artist);
            }
        }
        IgnoreAction::Remove { artist, album: Some(album) } => {
            if list.remove_album(&artist, &album) {
                list.save(path)?;
                println!("Removed from ignore list: {} - {}", artist, album);
            } else {
                println!("Not in ignore list: {} - {}", artist, album);
            }
        }
        IgnoreAction::Remove { artist, album: None } => {
            if list.remove_artist(&artist) {
                list.save(path)?;
                println!("Removed from ignore list: {}", artist);
            } else {
                println!("Not in ignore list: {}", artist);
            }
        }
        IgnoreAction::List => {
            if list.artists.is_empty() && list.albums.is_empty() {
                println!("No ignored artists or albums.");
                return Ok(());
            }
            if !list.artists.is_empty() {
                println!("Ignored Artists:");
                let mut artists = list.artists.clone();
                artists.sort_by_key(|a| a.to_lowercase());
                for artist in artists {
                    println!("  {}", artist);
                }
            }
            if !list.albums.is_empty() {
                println!("\nIgnored Albums:");
                let mut albums = list.albums.clone();
                albums.sort_by_key(|e| (e.artist.to_lowercase(), e.album.to_lowercase()));
                for entry in albums {
                    println!("  {} - {}", entry.artist, entry.album);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    match args.command {
        Command::Reconcile {
            files,
            artist_id,
            all_releases,
            json,
            stats,
        } => run_reconcile(&files, artist_id.as_deref(), !all_releases, json, stats.as_deref()),
        Command::Missing {
            file,
            artist,
            artist_id,
            search,
        } => {
            let ignore_list = IgnoreList::load(&ignore_path(args.ignore_file)?)?;
            run_missing(
                &args.library,
                &ignore_list,
                &file,
                &artist,
                artist_id.as_deref(),
                search.as_deref(),
            )
        }
        Command::Scan => run_scan(&args.library),
        Command::Albums { path } => {
            for album in find_album_directories(&path)? {
                println!("{}", album.display());
            }
            Ok(())
        }
        Command::Prune {
            album_dir,
            standard_id,
            tracks_dir,
            dry_run,
        } => run_prune(&album_dir, &standard_id, &tracks_dir, dry_run),
        Command::Normalize { titles, track } => {
            run_normalize(&titles, track);
            Ok(())
        }
        Command::Ignore { action } => run_ignore(&ignore_path(args.ignore_file)?, action),
    }
}
