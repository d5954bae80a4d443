//! Domain records: parsed pages in, mapped blocks and import artifacts out.
//!
//! The JSON shapes here are fixed by the persisted artifacts
//! (`data/parsed/<slug>.json` and `data/spotify/<slug>.json`); Track fields
//! round-trip losslessly and the `spotify_uri`/`spotify_url` pair appears
//! only on tracks that actually matched.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single track as extracted from a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub source_line: Option<String>,
}

/// A coherent group of tracks from one page section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackBlock {
    pub title: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// A fully parsed source page, as persisted by the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPage {
    pub source_url: String,
    #[serde(default)]
    pub source_name: Option<String>,
    /// ISO-8601 timestamp string; only its date prefix is consumed here.
    pub fetched_at: String,
    #[serde(default)]
    pub blocks: Vec<TrackBlock>,
}

impl ParsedPage {
    /// The `YYYY-MM-DD` prefix of `fetched_at`, used in playlist names.
    pub fn fetched_date(&self) -> &str {
        let date = self.fetched_at.as_str();
        if date.len() >= 10 && date.is_char_boundary(10) {
            &date[..10]
        } else {
            date
        }
    }

    /// Boundary validation for pages read back from disk. The extraction
    /// stage is trusted to write these shapes, but hand-edited artifacts
    /// are a supported workflow.
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::Artifact("parsed page has empty source_url".into()));
        }
        for (bi, block) in self.blocks.iter().enumerate() {
            for (ti, track) in block.tracks.iter().enumerate() {
                if track.artist.trim().is_empty() && track.title.trim().is_empty() {
                    return Err(Error::Artifact(format!(
                        "block {} track {} has neither artist nor title",
                        bi, ti
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of tracks across all blocks.
    pub fn track_count(&self) -> usize {
        self.blocks.iter().map(|b| b.tracks.len()).sum()
    }
}

/// A candidate returned by the catalog's track search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrack {
    /// Catalog URI, e.g. `spotify:track:…` — the mutation input.
    pub uri: String,
    /// Display name of the track.
    pub name: String,
    /// Credited artist names, in catalog order.
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// Canonical web URL for the track.
    pub external_url: String,
}

/// A source track carried through mapping, with catalog fields when matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedTrack {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub source_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
}

impl MappedTrack {
    /// A track that matched `candidate`.
    pub fn from_match(track: &Track, candidate: &CandidateTrack) -> Self {
        MappedTrack {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            source_line: track.source_line.clone(),
            spotify_uri: Some(candidate.uri.clone()),
            spotify_url: Some(candidate.external_url.clone()),
        }
    }

    /// A track kept without catalog fields (keep-unmatched mode).
    pub fn unmatched(track: &Track) -> Self {
        MappedTrack {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            source_line: track.source_line.clone(),
            spotify_uri: None,
            spotify_url: None,
        }
    }
}

/// A block after mapping; order matches the parsed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedBlock {
    pub title: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub tracks: Vec<MappedTrack>,
}

impl MappedBlock {
    /// Catalog URIs of all matched tracks, in block order.
    pub fn uris(&self) -> Vec<String> {
        self.tracks
            .iter()
            .filter_map(|t| t.spotify_uri.clone())
            .collect()
    }
}

/// A track for which no acceptable catalog candidate was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Miss {
    pub block: String,
    pub artist: String,
    pub title: String,
}

/// Identifier and canonical URL of a freshly created playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistHandle {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Bookkeeping for one created playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub url: String,
    pub tracks: Vec<String>,
    pub tracks_added: usize,
}

/// Result of the playlist-creation stage over one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationResult {
    pub playlists: Vec<CreatedPlaylist>,
    pub master_playlist: Option<CreatedPlaylist>,
    pub failed_tracks: Vec<String>,
}

/// The persisted import-result artifact (`data/spotify/<slug>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportArtifact {
    pub source_url: String,
    pub parsed_artifact: String,
    pub blocks: Vec<MappedBlock>,
    pub playlists: Vec<CreatedPlaylist>,
    pub master_playlist: Option<CreatedPlaylist>,
    pub misses: Vec<Miss>,
    pub failed_tracks: Vec<String>,
    pub generated_at: String,
    pub write_playlists: bool,
}
