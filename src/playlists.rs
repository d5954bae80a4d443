//! Playlist creation over mapped blocks: naming, per-block playlists, the
//! optional master playlist, and failed-track accounting.

use log::warn;

use crate::error::Result;
use crate::models::{CreatedPlaylist, CreationResult, MappedBlock, ParsedPage, PlaylistHandle};
use crate::spotify::SpotifyClient;

/// The catalog mutations playlist creation needs. Implemented by
/// [`SpotifyClient`]; test doubles stand in for it.
pub trait PlaylistWriter {
    fn create_playlist(&self, name: &str, description: &str, public: bool)
        -> Result<PlaylistHandle>;
    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(usize, Vec<String>)>;
}

impl PlaylistWriter for SpotifyClient {
    fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle> {
        SpotifyClient::create_playlist(self, name, description, public)
    }

    fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(usize, Vec<String>)> {
        SpotifyClient::add_tracks(self, playlist_id, uris)
    }
}

/// Compose a playlist name: `"<prefix> – <label> – <date>"`. The label is
/// the block title unless that is empty or a generic "playlist"/"block",
/// in which case the block context (then "Playlist") stands in.
pub fn select_playlist_name(
    source_name: Option<&str>,
    block_title: &str,
    fetched_date: &str,
    context: Option<&str>,
) -> String {
    let prefix = source_name.unwrap_or("Imported");
    let mut label = block_title.trim();
    if label.is_empty() || label.eq_ignore_ascii_case("playlist") || label.eq_ignore_ascii_case("block")
    {
        label = context.unwrap_or("Playlist").trim();
    }
    format!("{} – {} – {}", prefix, label, fetched_date)
}

/// Compose a playlist description from the source URL and block context.
pub fn select_description(source_url: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("Imported from {} | {}", source_url, context),
        None => format!("Imported from {}", source_url),
    }
}

/// Create one private playlist per block that has any matched URIs, plus
/// an optional master playlist aggregating every block's tracks. URIs
/// whose chunk uploads fail accumulate in `failed_tracks`; blocks without
/// a single match are skipped entirely.
pub fn create_playlists(
    writer: &dyn PlaylistWriter,
    page: &ParsedPage,
    mapped_blocks: &[MappedBlock],
    master_playlist: bool,
) -> Result<CreationResult> {
    let mut result = CreationResult::default();
    let fetched_date = page.fetched_date();
    let mut master_tracks: Vec<String> = Vec::new();

    for block in mapped_blocks {
        let uris = block.uris();
        if uris.is_empty() {
            continue;
        }
        let name = select_playlist_name(
            page.source_name.as_deref(),
            &block.title,
            fetched_date,
            block.context.as_deref(),
        );
        let description = select_description(&page.source_url, block.context.as_deref());
        let playlist = writer.create_playlist(&name, &description, false)?;
        let (added, failed) = writer.add_tracks(&playlist.id, &uris)?;
        if !failed.is_empty() {
            warn!("failed to add {} tracks to playlist \"{}\"", failed.len(), name);
            result.failed_tracks.extend(failed);
        }
        result.playlists.push(CreatedPlaylist {
            id: playlist.id,
            name: playlist.name,
            url: playlist.url,
            tracks: uris.clone(),
            tracks_added: added,
        });
        master_tracks.extend(uris);
    }

    if master_playlist && !master_tracks.is_empty() {
        let name = format!(
            "{} – All – {}",
            page.source_name.as_deref().unwrap_or("Imported"),
            fetched_date
        );
        let description = select_description(&page.source_url, Some("All blocks combined"));
        let playlist = writer.create_playlist(&name, &description, false)?;
        let (added, failed) = writer.add_tracks(&playlist.id, &master_tracks)?;
        if !failed.is_empty() {
            result.failed_tracks.extend(failed);
        }
        result.master_playlist = Some(CreatedPlaylist {
            id: playlist.id,
            name: playlist.name,
            url: playlist.url,
            tracks: master_tracks,
            tracks_added: added,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::models::{MappedTrack, TrackBlock};

    struct FakeWriter {
        created: RefCell<Vec<String>>,
        /// URIs that fail to upload, per `add_tracks` call.
        poison: Vec<String>,
    }

    impl FakeWriter {
        fn new() -> Self {
            FakeWriter { created: RefCell::new(Vec::new()), poison: Vec::new() }
        }

        fn poisoning(uris: &[&str]) -> Self {
            FakeWriter {
                created: RefCell::new(Vec::new()),
                poison: uris.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl PlaylistWriter for FakeWriter {
        fn create_playlist(
            &self,
            name: &str,
            _description: &str,
            public: bool,
        ) -> Result<PlaylistHandle> {
            assert!(!public);
            let mut created = self.created.borrow_mut();
            created.push(name.to_string());
            let id = format!("pl{}", created.len());
            Ok(PlaylistHandle {
                id: id.clone(),
                name: name.to_string(),
                url: format!("https://open.spotify.com/playlist/{}", id),
            })
        }

        fn add_tracks(&self, _playlist_id: &str, uris: &[String]) -> Result<(usize, Vec<String>)> {
            let failed: Vec<String> =
                uris.iter().filter(|u| self.poison.contains(*u)).cloned().collect();
            Ok((uris.len() - failed.len(), failed))
        }
    }

    fn mapped(title: &str, uri: Option<&str>) -> MappedTrack {
        MappedTrack {
            artist: "A".into(),
            title: title.into(),
            album: None,
            source_line: None,
            spotify_uri: uri.map(|u| u.to_string()),
            spotify_url: uri.map(|u| format!("https://open.spotify.com/track/{}", u)),
        }
    }

    fn sample_page() -> ParsedPage {
        ParsedPage {
            source_url: "https://example.com/show".into(),
            source_name: Some("Example Radio".into()),
            fetched_at: "2025-11-03T18:22:05+00:00".into(),
            blocks: vec![TrackBlock { title: "Hour 1".into(), context: None, tracks: vec![] }],
        }
    }

    #[test]
    fn name_prefers_source_name_and_block_title() {
        assert_eq!(
            select_playlist_name(Some("Example Radio"), "Hour 1", "2025-11-03", None),
            "Example Radio – Hour 1 – 2025-11-03"
        );
        assert_eq!(
            select_playlist_name(None, "Hour 1", "2025-11-03", None),
            "Imported – Hour 1 – 2025-11-03"
        );
    }

    #[test]
    fn generic_block_titles_fall_back_to_context() {
        assert_eq!(
            select_playlist_name(Some("R"), "Playlist", "2025-11-03", Some("Jazz special")),
            "R – Jazz special – 2025-11-03"
        );
        assert_eq!(
            select_playlist_name(Some("R"), "  ", "2025-11-03", None),
            "R – Playlist – 2025-11-03"
        );
    }

    #[test]
    fn description_appends_context() {
        assert_eq!(
            select_description("https://example.com/x", None),
            "Imported from https://example.com/x"
        );
        assert_eq!(
            select_description("https://example.com/x", Some("Jazz special")),
            "Imported from https://example.com/x | Jazz special"
        );
    }

    #[test]
    fn blocks_without_matches_create_no_playlist() {
        let writer = FakeWriter::new();
        let blocks = vec![
            MappedBlock {
                title: "Hour 1".into(),
                context: None,
                tracks: vec![mapped("T1", Some("u1")), mapped("T2", None)],
            },
            MappedBlock { title: "Hour 2".into(), context: None, tracks: vec![mapped("T3", None)] },
        ];
        let result = create_playlists(&writer, &sample_page(), &blocks, false).unwrap();
        assert_eq!(result.playlists.len(), 1);
        assert_eq!(result.playlists[0].tracks, vec!["u1"]);
        assert_eq!(result.playlists[0].tracks_added, 1);
        assert!(result.master_playlist.is_none());
        assert_eq!(writer.created.borrow().len(), 1);
    }

    #[test]
    fn master_playlist_aggregates_all_blocks_in_order() {
        let writer = FakeWriter::new();
        let blocks = vec![
            MappedBlock {
                title: "Hour 1".into(),
                context: None,
                tracks: vec![mapped("T1", Some("u1")), mapped("T2", Some("u2"))],
            },
            MappedBlock {
                title: "Hour 2".into(),
                context: None,
                tracks: vec![mapped("T3", Some("u3"))],
            },
        ];
        let result = create_playlists(&writer, &sample_page(), &blocks, true).unwrap();
        assert_eq!(result.playlists.len(), 2);
        let master = result.master_playlist.unwrap();
        assert_eq!(master.tracks, vec!["u1", "u2", "u3"]);
        assert_eq!(master.name, "Example Radio – All – 2025-11-03");
    }

    #[test]
    fn no_master_playlist_when_nothing_matched() {
        let writer = FakeWriter::new();
        let blocks =
            vec![MappedBlock { title: "Hour 1".into(), context: None, tracks: vec![mapped("T", None)] }];
        let result = create_playlists(&writer, &sample_page(), &blocks, true).unwrap();
        assert!(result.playlists.is_empty());
        assert!(result.master_playlist.is_none());
    }

    #[test]
    fn failed_uploads_accumulate_across_playlists() {
        let writer = FakeWriter::poisoning(&["u2"]);
        let blocks = vec![MappedBlock {
            title: "Hour 1".into(),
            context: None,
            tracks: vec![mapped("T1", Some("u1")), mapped("T2", Some("u2"))],
        }];
        let result = create_playlists(&writer, &sample_page(), &blocks, true).unwrap();
        // the block playlist and the master each fail on u2
        assert_eq!(result.failed_tracks, vec!["u2", "u2"]);
        assert_eq!(result.playlists[0].tracks_added, 1);
    }
}
