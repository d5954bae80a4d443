//! Replay a parsed-page artifact against Spotify.
//!
//! Maps every track of a previously parsed page to the catalog, optionally
//! creates the playlists, and writes the import artifact — no fetching or
//! re-parsing involved.
//!
//! Usage:
//!   replay <PARSED_JSON> [--master-playlist] [--no-write] [--keep-unmatched] [--data-dir DIR]
//!
//!   --master-playlist   also create one playlist aggregating all blocks
//!   --no-write          map only, create no playlists
//!   --keep-unmatched    retain unmatched tracks (without URIs) in the blocks
//!   --data-dir DIR      artifact tree root (default: data, or $DATA_DIR)

use std::path::{Path, PathBuf};
use std::process::exit;

use playlist_import::models::CreationResult;
use playlist_import::{
    create_playlists, load_parsed_page, map_tracks, slugify_url, ArtifactStore, ImportArtifact,
    Settings, SpotifyClient,
};

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    const USAGE: &str = "Usage: replay <PARSED_JSON> [--master-playlist] [--no-write] [--keep-unmatched] [--data-dir DIR]";

    let args: Vec<String> = std::env::args().collect();
    let mut master_flag = false;
    let mut write_playlists = true;
    let mut keep_unmatched = false;
    let mut data_dir: Option<PathBuf> = None;
    let mut parsed_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--master-playlist" => master_flag = true,
            "--no-write" => write_playlists = false,
            "--keep-unmatched" => keep_unmatched = true,
            "--data-dir" => {
                i += 1;
                match args.get(i) {
                    Some(dir) => data_dir = Some(PathBuf::from(dir)),
                    None => {
                        eprintln!("--data-dir requires a value\n{}", USAGE);
                        exit(2);
                    }
                }
            }
            other if !other.starts_with("--") => parsed_path = Some(PathBuf::from(other)),
            other => {
                eprintln!("unknown option {}\n{}", other, USAGE);
                exit(2);
            }
        }
        i += 1;
    }

    let parsed_path = match parsed_path {
        Some(path) => path,
        None => {
            eprintln!("{}", USAGE);
            exit(2);
        }
    };

    if let Err(err) = run(&parsed_path, master_flag, write_playlists, keep_unmatched, data_dir) {
        log::error!("replay failed: {}", err);
        exit(1);
    }
}

fn run(
    parsed_path: &Path,
    master_flag: bool,
    write_playlists: bool,
    keep_unmatched: bool,
    data_dir: Option<PathBuf>,
) -> playlist_import::Result<()> {
    let settings = Settings::load()?;
    let store = ArtifactStore::new(data_dir.unwrap_or(settings.data_dir.clone()));
    let master_playlist = master_flag || settings.master_playlist_enabled;

    let page = load_parsed_page(parsed_path)?;
    log::info!(
        "replaying {} ({} blocks, {} tracks)",
        page.source_url,
        page.blocks.len(),
        page.track_count()
    );

    let client = SpotifyClient::new(settings.credentials);
    let (mapped_blocks, misses) = map_tracks(&client, &page, keep_unmatched)?;

    let creation = if write_playlists {
        create_playlists(&client, &page, &mapped_blocks, master_playlist)?
    } else {
        CreationResult::default()
    };

    let slug = parsed_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
        .unwrap_or_else(|| slugify_url(&page.source_url));
    let artifact = ImportArtifact {
        source_url: page.source_url.clone(),
        parsed_artifact: parsed_path.display().to_string(),
        blocks: mapped_blocks,
        playlists: creation.playlists,
        master_playlist: creation.master_playlist,
        misses,
        failed_tracks: creation.failed_tracks,
        generated_at: chrono::Utc::now().to_rfc3339(),
        write_playlists,
    };
    let artifact_path = store.write_import(&slug, &artifact)?;

    let action = if write_playlists { "Created" } else { "Mapped (no write)" };
    println!(
        "{} {} playlists. Misses: {}. Artifact: {}",
        action,
        artifact.playlists.len(),
        artifact.misses.len(),
        artifact_path.display()
    );
    if !artifact.failed_tracks.is_empty() {
        println!("Failed to add {} tracks.", artifact.failed_tracks.len());
    }
    Ok(())
}
