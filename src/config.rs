//! Settings: Spotify credentials and runtime options.
//!
//! Environment variables win; anything missing falls back to a
//! `spotify_credentials.toml` looked up next to the binary, system-wide,
//! or under `~/.config/playlist-import/`.

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::spotify::SpotifyCredentials;

const CREDENTIALS_FILE: &str = "spotify_credentials.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: SpotifyCredentials,
    pub master_playlist_enabled: bool,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Load settings from the environment and the credentials file.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok(), load_credentials_file())
    }

    fn from_lookup<F>(env: F, file: Option<toml::Table>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |env_name: &str, file_key: &str| -> Result<String> {
            env(env_name)
                .filter(|v| !v.is_empty())
                .or_else(|| {
                    file.as_ref()
                        .and_then(|t| t.get(file_key))
                        .and_then(|v| v.as_str())
                        .map(String::from)
                })
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{} not set and no \"{}\" entry in {}",
                        env_name, file_key, CREDENTIALS_FILE
                    ))
                })
        };

        let credentials = SpotifyCredentials {
            client_id: get("SPOTIFY_CLIENT_ID", "client_id")?,
            client_secret: get("SPOTIFY_CLIENT_SECRET", "client_secret")?,
            refresh_token: get("SPOTIFY_REFRESH_TOKEN", "refresh_token")?,
            user_id: get("SPOTIFY_USER_ID", "user_id")?,
        };

        let master_playlist_enabled = env("MASTER_PLAYLIST_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let data_dir = env("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));

        Ok(Settings { credentials, master_playlist_enabled, data_dir })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Try to load the credentials file from known paths, `None` if absent.
fn load_credentials_file() -> Option<toml::Table> {
    let mut paths = vec![
        PathBuf::from(CREDENTIALS_FILE),
        PathBuf::from("/etc/playlist-import").join(CREDENTIALS_FILE),
    ];
    if let Some(home) = env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config/playlist-import").join(CREDENTIALS_FILE));
    }

    for path in paths {
        if let Ok(content) = std::fs::read_to_string(&path) {
            if let Ok(table) = content.parse::<toml::Table>() {
                return Some(table);
            }
        }
    }
    None
}
