//! Text normalization for fuzzy track matching.
//!
//! Canonicalizes free-text artist/title strings so that "Rivière Noire",
//! "riviere  noire" and "Riviere-Noire" all compare equal. The same strings
//! recur across the fallback queries of a run, so results are memoized in a
//! process-local bounded map.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Memo cap. When reached the map is cleared wholesale; entries are cheap
/// to recompute and a run rarely sees this many distinct strings.
const CACHE_CAP: usize = 1024;

static CACHE: Lazy<Mutex<FxHashMap<String, String>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Normalize a string for comparison: NFKD-decompose, drop combining
/// (diacritical) marks, lowercase, collapse every run of non-alphanumeric
/// characters to a single space, trim.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    {
        let cache = CACHE.lock().expect("normalize cache lock poisoned");
        if let Some(hit) = cache.get(text) {
            return hit.clone();
        }
    }

    let result = fold(text);

    let mut cache = CACHE.lock().expect("normalize cache lock poisoned");
    if cache.len() >= CACHE_CAP {
        cache.clear();
    }
    cache.insert(text.to_string(), result.clone());
    result
}

fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        for lower in c.to_lowercase() {
            if lower.is_ascii_alphanumeric() {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(lower);
            } else {
                pending_space = true;
            }
        }
    }
    out
}
