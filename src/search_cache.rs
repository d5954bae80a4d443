//! Per-run memo of track-search outcomes.
//!
//! One external search sequence per distinct (artist, title) pair per
//! client lifetime — including negative outcomes, so a page that lists the
//! same unmatched track twice only queries the catalog once. Entries are
//! write-once; the cache is never evicted (a run maps a bounded batch).

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::CandidateTrack;

#[derive(Debug, Default)]
pub struct SearchCache {
    entries: FxHashMap<String, Option<CandidateTrack>>,
}

impl SearchCache {
    pub fn new() -> Self {
        SearchCache::default()
    }

    /// Cache key: artist and title lower-cased and trimmed independently,
    /// joined with `|` (which survives no normalization and never occurs
    /// in natural catalog queries).
    fn key(artist: &str, title: &str) -> String {
        format!(
            "{}|{}",
            artist.to_lowercase().trim(),
            title.to_lowercase().trim()
        )
    }

    /// Return the cached outcome for `(artist, title)`, or run `resolver`
    /// and store its result. Resolver errors propagate without being
    /// cached, so a later call may try again.
    pub fn get_or_resolve<F>(
        &mut self,
        artist: &str,
        title: &str,
        resolver: F,
    ) -> Result<Option<CandidateTrack>>
    where
        F: FnOnce() -> Result<Option<CandidateTrack>>,
    {
        let key = Self::key(artist, title);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.clone());
        }
        let resolved = resolver()?;
        // First resolution wins; a concurrent writer beaten to the slot
        // does not overwrite it.
        let entry = self.entries.entry(key).or_insert(resolved);
        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn candidate(uri: &str) -> CandidateTrack {
        CandidateTrack {
            uri: uri.into(),
            name: "Song".into(),
            artists: vec!["Artist".into()],
            album: None,
            external_url: String::new(),
        }
    }

    #[test]
    fn resolver_runs_at_most_once_per_pair() {
        let mut cache = SearchCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let hit = cache
                .get_or_resolve("Artist", "Song", || {
                    calls += 1;
                    Ok(Some(candidate("spotify:track:x")))
                })
                .unwrap();
            assert_eq!(hit.unwrap().uri, "spotify:track:x");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn negative_outcomes_are_cached_too() {
        let mut cache = SearchCache::new();
        let mut calls = 0;
        let first = cache
            .get_or_resolve("Artist", "Song", || {
                calls += 1;
                Ok(None)
            })
            .unwrap();
        let second = cache
            .get_or_resolve("Artist", "Song", || {
                calls += 1;
                Ok(Some(candidate("never")))
            })
            .unwrap();
        assert!(first.is_none());
        assert!(second.is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn key_folds_case_and_outer_whitespace() {
        let mut cache = SearchCache::new();
        let mut calls = 0;
        let mut resolve = |cache: &mut SearchCache, artist: &str, title: &str| {
            cache
                .get_or_resolve(artist, title, || {
                    calls += 1;
                    Ok(Some(candidate("x")))
                })
                .unwrap();
        };
        resolve(&mut cache, "Hugh Masekela", "Skokiaan");
        resolve(&mut cache, "  hugh masekela ", "SKOKIAAN");
        assert_eq!(calls, 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = SearchCache::new();
        let failed: Result<_> = cache.get_or_resolve("A", "T", || {
            Err(Error::Transport("connection reset".into()))
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let ok = cache
            .get_or_resolve("A", "T", || Ok(Some(candidate("retry"))))
            .unwrap();
        assert_eq!(ok.unwrap().uri, "retry");
    }
}
