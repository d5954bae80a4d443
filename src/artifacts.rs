//! JSON artifact persistence: parsed pages in `data/parsed/`, import
//! results in `data/spotify/`, both named by a URL-derived slug.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{ImportArtifact, ParsedPage};

/// Produce a filesystem-friendly slug from a URL: authority + path with
/// every non-alphanumeric run folded to `-`, lower-cased. A non-empty
/// query string is hashed into a `-q<hash>` suffix so distinct queries
/// get distinct artifacts.
pub fn slugify_url(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let rest = rest.split_once('#').map(|(r, _)| r).unwrap_or(rest);
    let (base, query) = match rest.split_once('?') {
        Some((base, query)) => (base, query),
        None => (rest, ""),
    };

    let mut slug = String::with_capacity(base.len());
    let mut pending = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !slug.is_empty() {
                slug.push('-');
            }
            pending = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("page");
    }
    if !query.is_empty() {
        slug.push_str("-q");
        slug.push_str(&hash_bytes(query.as_bytes())[..8]);
    }
    slug
}

/// 64-bit FNV-1a hash, hex encoded.
fn hash_bytes(data: &[u8]) -> String {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in data {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", h)
}

/// Write a value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Load and validate a parsed-page artifact.
pub fn load_parsed_page(path: &Path) -> Result<ParsedPage> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Artifact(format!("cannot read {}: {}", path.display(), e)))?;
    let page: ParsedPage = serde_json::from_str(&content)
        .map_err(|e| Error::Artifact(format!("malformed parsed page {}: {}", path.display(), e)))?;
    page.validate()?;
    Ok(page)
}

/// The on-disk artifact tree rooted at a data directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    pub fn parsed_path(&self, slug: &str) -> PathBuf {
        self.root.join("parsed").join(format!("{}.json", slug))
    }

    pub fn import_path(&self, slug: &str) -> PathBuf {
        self.root.join("spotify").join(format!("{}.json", slug))
    }

    /// Whether a URL already has an import artifact.
    pub fn is_imported(&self, url: &str) -> bool {
        self.import_path(&slugify_url(url)).exists()
    }

    pub fn load_parsed(&self, slug: &str) -> Result<ParsedPage> {
        load_parsed_page(&self.parsed_path(slug))
    }

    /// Persist an import artifact, returning the written path.
    pub fn write_import(&self, slug: &str, artifact: &ImportArtifact) -> Result<PathBuf> {
        let path = self.import_path(slug);
        write_json(&path, artifact)?;
        Ok(path)
    }
}
