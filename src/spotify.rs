//! Spotify Web API client — token lifecycle, track search, playlist mutation.
//!
//! Holds a long-lived refresh credential and exchanges it lazily for a
//! short-lived access token; every operation runs under the retry policy,
//! and track searches go through the per-run search cache so repeated
//! (artist, title) pairs are free.
//!
//! Token state and cache are Mutex-guarded: the usual pattern is one client
//! per pipeline invocation, but a shared instance is safe.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::matching;
use crate::models::{CandidateTrack, PlaylistHandle};
use crate::retry::RetryPolicy;
use crate::search_cache::SearchCache;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const SEARCH_LIMIT: &str = "20";
/// Per-request item cap of the playlist-track endpoints.
const TRACKS_PER_REQUEST: usize = 100;
/// Refresh the token when it is within this margin of expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

// ── Credentials ──────────────────────────────────────────────────────────────

/// App credentials plus the user-scoped refresh token and user id.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub user_id: String,
}

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiToken {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    tracks: ApiTrackPage,
}

#[derive(Debug, Default, Deserialize)]
struct ApiTrackPage {
    #[serde(default)]
    items: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    album: Option<ApiAlbum>,
    #[serde(default)]
    external_urls: ApiExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    external_urls: ApiExternalUrls,
}

impl From<ApiTrack> for CandidateTrack {
    fn from(track: ApiTrack) -> Self {
        CandidateTrack {
            uri: track.uri,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.map(|a| a.name),
            external_url: track.external_urls.spotify.unwrap_or_default(),
        }
    }
}

// ── Token state ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn usable(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct SpotifyClient {
    credentials: SpotifyCredentials,
    agent: ureq::Agent,
    retry: RetryPolicy,
    token: Mutex<Option<AccessToken>>,
    cache: Mutex<SearchCache>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials) -> Self {
        Self::with_retry(credentials, RetryPolicy::api_default("spotify"))
    }

    pub fn with_retry(credentials: SpotifyCredentials, retry: RetryPolicy) -> Self {
        SpotifyClient {
            credentials,
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(20))
                .build(),
            retry,
            token: Mutex::new(None),
            cache: Mutex::new(SearchCache::new()),
        }
    }

    // ── Token lifecycle ──────────────────────────────────────────────────

    /// Current access token, refreshing when absent or within 30 s of
    /// expiry. The whole check-and-refresh holds the token lock, so
    /// concurrent callers wait on a refresh in flight instead of
    /// duplicating it.
    fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().expect("token lock poisoned");
        if let Some(token) = guard.as_ref() {
            if token.usable(Instant::now()) {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.retry.run(|| self.request_token())?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    fn request_token(&self) -> Result<AccessToken> {
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let response = self
            .agent
            .post(TOKEN_URL)
            .set("Authorization", &format!("Basic {}", basic))
            .send_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .map_err(|err| match Error::from(err) {
                // The token endpoint answers bad credentials with a 4xx;
                // that is an authentication failure, fatal to the run.
                Error::Status { status, body } if status != 429 && status < 500 => Error::Auth(
                    format!("token refresh rejected with HTTP {}: {}", status, body),
                ),
                other => other,
            })?;
        let api: ApiToken = serde_json::from_reader(response.into_reader())
            .map_err(|e| Error::Payload(format!("token response: {}", e)))?;
        debug!("refreshed access token, valid for {}s", api.expires_in);
        Ok(AccessToken {
            value: api.access_token,
            expires_at: Instant::now() + Duration::from_secs(api.expires_in),
        })
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.access_token()?))
    }

    // ── Search ───────────────────────────────────────────────────────────

    /// Find the best catalog candidate for `(artist, title)`, or `None`
    /// when no fallback query yields an acceptable match. Outcomes are
    /// cached per client, including misses.
    pub fn search_track(&self, artist: &str, title: &str) -> Result<Option<CandidateTrack>> {
        let mut cache = self.cache.lock().expect("search cache lock poisoned");
        cache.get_or_resolve(artist, title, || {
            resolve_with_fallback(artist, title, |query| self.run_search(query))
        })
    }

    fn run_search(&self, query: &str) -> Result<Vec<CandidateTrack>> {
        self.retry.run(|| {
            let bearer = self.bearer()?;
            let response = self
                .agent
                .get(&format!("{}/search", API_BASE))
                .set("Authorization", &bearer)
                .query("q", query)
                .query("type", "track")
                .query("limit", SEARCH_LIMIT)
                .call()?;
            let api: ApiSearchResponse = serde_json::from_reader(response.into_reader())
                .map_err(|e| Error::Payload(format!("search response: {}", e)))?;
            Ok(api.tracks.items.into_iter().map(CandidateTrack::from).collect())
        })
    }

    // ── Playlist mutation ────────────────────────────────────────────────

    /// Create an empty playlist for the configured user.
    pub fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistHandle> {
        let url = format!("{}/users/{}/playlists", API_BASE, self.credentials.user_id);
        let api: ApiPlaylist = self.retry.run(|| {
            let bearer = self.bearer()?;
            let response = self
                .agent
                .post(&url)
                .set("Authorization", &bearer)
                .send_json(serde_json::json!({
                    "name": name,
                    "description": description,
                    "public": public,
                }))?;
            serde_json::from_reader(response.into_reader())
                .map_err(|e| Error::Payload(format!("playlist response: {}", e)))
        })?;
        info!("created playlist \"{}\" ({})", api.name, api.id);
        Ok(PlaylistHandle {
            id: api.id,
            name: api.name,
            url: api.external_urls.spotify.unwrap_or_default(),
        })
    }

    /// Append `uris` in chunks of 100, each chunk with its own retry
    /// budget. Returns `(added_count, failed_uris)`: a chunk that exhausts
    /// its retries is recorded and the remaining chunks still go out.
    pub fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(usize, Vec<String>)> {
        submit_in_chunks(uris, |chunk| {
            self.retry.run(|| self.send_tracks(playlist_id, chunk, false))
        })
    }

    /// Replace the playlist contents with `uris` (clearing it when empty).
    /// The first 100 URIs go out as the replacing request; any remainder
    /// is appended best-effort like [`SpotifyClient::add_tracks`].
    pub fn replace_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(usize, Vec<String>)> {
        let head = &uris[..uris.len().min(TRACKS_PER_REQUEST)];
        self.retry
            .run(|| self.send_tracks(playlist_id, head, true))?;
        let (appended, failed) = submit_in_chunks(&uris[head.len()..], |chunk| {
            self.retry.run(|| self.send_tracks(playlist_id, chunk, false))
        })?;
        Ok((head.len() + appended, failed))
    }

    fn send_tracks(&self, playlist_id: &str, uris: &[String], replace: bool) -> Result<()> {
        let url = format!("{}/playlists/{}/tracks", API_BASE, playlist_id);
        let bearer = self.bearer()?;
        let request = if replace {
            self.agent.put(&url)
        } else {
            self.agent.post(&url)
        };
        request
            .set("Authorization", &bearer)
            .send_json(serde_json::json!({ "uris": uris }))?;
        Ok(())
    }

    /// Update a playlist's name and/or description. A call with neither
    /// is a no-op.
    pub fn update_playlist_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let mut payload = serde_json::Map::new();
        if let Some(name) = name {
            payload.insert("name".into(), name.into());
        }
        if let Some(description) = description {
            payload.insert("description".into(), description.into());
        }
        if payload.is_empty() {
            return Ok(());
        }
        let url = format!("{}/playlists/{}", API_BASE, playlist_id);
        self.retry.run(|| {
            let bearer = self.bearer()?;
            self.agent
                .put(&url)
                .set("Authorization", &bearer)
                .send_json(serde_json::Value::Object(payload.clone()))?;
            Ok(())
        })
    }

    /// Unfollow (effectively delete) a playlist.
    pub fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        let url = format!("{}/playlists/{}/followers", API_BASE, playlist_id);
        self.retry.run(|| {
            let bearer = self.bearer()?;
            self.agent
                .delete(&url)
                .set("Authorization", &bearer)
                .call()?;
            Ok(())
        })
    }
}

// ── Query fallback chain ─────────────────────────────────────────────────────

/// The three queries tried in order for a track: structured, plain
/// concatenation, title-only.
fn fallback_queries(artist: &str, title: &str) -> [String; 3] {
    [
        format!("artist:{} track:{}", artist, title),
        format!("{} {}", artist, title),
        title.to_string(),
    ]
}

/// Run the fallback chain through `search`, stopping at the first query
/// whose result set yields an accepted match.
fn resolve_with_fallback<F>(
    artist: &str,
    title: &str,
    mut search: F,
) -> Result<Option<CandidateTrack>>
where
    F: FnMut(&str) -> Result<Vec<CandidateTrack>>,
{
    for query in fallback_queries(artist, title) {
        let items = search(&query)?;
        if let Some(hit) = matching::best_match(&items, artist, title) {
            debug!("query {:?} matched \"{}\" ({})", query, hit.name, hit.uri);
            return Ok(Some(hit.clone()));
        }
    }
    debug!("no acceptable candidate for {} - {}", artist, title);
    Ok(None)
}

/// Submit `uris` in 100-item chunks, collecting failed chunks instead of
/// aborting. Authentication failures are the exception: nothing after
/// them can succeed, so they propagate.
fn submit_in_chunks<F>(uris: &[String], mut submit: F) -> Result<(usize, Vec<String>)>
where
    F: FnMut(&[String]) -> Result<()>,
{
    let mut added = 0;
    let mut failed: Vec<String> = Vec::new();
    for (i, chunk) in uris.chunks(TRACKS_PER_REQUEST).enumerate() {
        match submit(chunk) {
            Ok(()) => added += chunk.len(),
            Err(err @ Error::Auth(_)) => return Err(err),
            Err(err) => {
                warn!("failed to add chunk {} ({} tracks): {}", i, chunk.len(), err);
                failed.extend_from_slice(chunk);
            }
        }
    }
    Ok((added, failed))
}
