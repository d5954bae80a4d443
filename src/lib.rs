pub mod artifacts;
pub mod config;
pub mod error;
pub mod mapper;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod playlists;
pub mod retry;
pub mod search_cache;
pub mod spotify;

pub use artifacts::{load_parsed_page, slugify_url, ArtifactStore};
pub use config::Settings;
pub use error::{Error, Result};
pub use mapper::{map_tracks, TrackSearcher};
pub use models::{
    CandidateTrack, CreationResult, ImportArtifact, MappedBlock, MappedTrack, Miss, ParsedPage,
    Track, TrackBlock,
};
pub use playlists::{create_playlists, select_description, select_playlist_name, PlaylistWriter};
pub use spotify::{SpotifyClient, SpotifyCredentials};
