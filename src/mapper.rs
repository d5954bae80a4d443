//! The per-track mapping loop: parsed blocks in, mapped blocks and misses out.
//!
//! Strictly sequential — catalog search is rate limited and the miss order
//! must match input order for deterministic artifacts. Search errors
//! propagate and abort the page (an exhausted retry budget means a systemic
//! outage, not one bad track); only a genuine no-match becomes a Miss.

use log::info;

use crate::error::Result;
use crate::models::{CandidateTrack, MappedBlock, MappedTrack, Miss, ParsedPage};
use crate::spotify::SpotifyClient;

/// Anything that can resolve an (artist, title) pair to a catalog
/// candidate. Implemented by [`SpotifyClient`]; test doubles stand in for
/// it the same way.
pub trait TrackSearcher {
    fn search_track(&self, artist: &str, title: &str) -> Result<Option<CandidateTrack>>;
}

impl TrackSearcher for SpotifyClient {
    fn search_track(&self, artist: &str, title: &str) -> Result<Option<CandidateTrack>> {
        SpotifyClient::search_track(self, artist, title)
    }
}

/// Map every track of `page` against the catalog.
///
/// Block order and track order within each block are preserved; misses
/// accumulate block-major, track-minor. With `keep_unmatched` set,
/// unmatched tracks stay in the block without URI fields (used when
/// re-mapping an edited playlist so they remain visible for manual
/// resolution) — they are still recorded as misses.
pub fn map_tracks(
    searcher: &dyn TrackSearcher,
    page: &ParsedPage,
    keep_unmatched: bool,
) -> Result<(Vec<MappedBlock>, Vec<Miss>)> {
    let mut blocks = Vec::with_capacity(page.blocks.len());
    let mut misses: Vec<Miss> = Vec::new();

    for block in &page.blocks {
        let mut mapped: Vec<MappedTrack> = Vec::new();
        for track in &block.tracks {
            match searcher.search_track(&track.artist, &track.title)? {
                Some(candidate) => mapped.push(MappedTrack::from_match(track, &candidate)),
                None => {
                    misses.push(Miss {
                        block: block.title.clone(),
                        artist: track.artist.clone(),
                        title: track.title.clone(),
                    });
                    if keep_unmatched {
                        mapped.push(MappedTrack::unmatched(track));
                    }
                }
            }
        }
        blocks.push(MappedBlock {
            title: block.title.clone(),
            context: block.context.clone(),
            tracks: mapped,
        });
    }

    info!(
        "mapped {} tracks across {} blocks, {} misses",
        page.track_count(),
        blocks.len(),
        misses.len()
    );
    Ok((blocks, misses))
}
