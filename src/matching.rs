//! Candidate scoring and selection for track search results.
//!
//! A candidate whose normalized title equals the target title and whose
//! credited artists contain the target artist wins outright. Everything
//! else is scored as a weighted similarity — titles are typed more
//! consistently than artist credits, so the title ratio dominates.

use strsim::normalized_levenshtein;

use crate::models::CandidateTrack;
use crate::normalize::normalize;

/// Best scores strictly below this are rejected as no-match.
pub const ACCEPT_THRESHOLD: f64 = 0.5;

const TITLE_WEIGHT: f64 = 0.6;
const ARTIST_WEIGHT: f64 = 0.4;

/// True when `candidate` matches the (already normalized) targets exactly.
pub fn is_exact_match(
    target_artist_norm: &str,
    target_title_norm: &str,
    candidate: &CandidateTrack,
) -> bool {
    normalize(&candidate.name) == target_title_norm
        && candidate
            .artists
            .iter()
            .any(|a| normalize(a) == target_artist_norm)
}

/// Weighted similarity of `candidate` against the (already normalized)
/// targets, in [0, 1]. An exact match scores a flat 1.0. With multiple
/// credited artists the artist ratio is the best across all of them.
pub fn score_candidate(
    target_artist_norm: &str,
    target_title_norm: &str,
    candidate: &CandidateTrack,
) -> f64 {
    if is_exact_match(target_artist_norm, target_title_norm, candidate) {
        return 1.0;
    }
    let title_ratio = normalized_levenshtein(target_title_norm, &normalize(&candidate.name));
    let artist_ratio = candidate
        .artists
        .iter()
        .map(|a| normalized_levenshtein(target_artist_norm, &normalize(a)))
        .fold(0.0_f64, f64::max);
    TITLE_WEIGHT * title_ratio + ARTIST_WEIGHT * artist_ratio
}

/// Pick the best candidate for `(target_artist, target_title)`, or `None`
/// when nothing clears [`ACCEPT_THRESHOLD`].
///
/// Candidates are evaluated in input order: the first exact match returns
/// immediately, and score ties keep the first-seen candidate.
pub fn best_match<'a>(
    candidates: &'a [CandidateTrack],
    target_artist: &str,
    target_title: &str,
) -> Option<&'a CandidateTrack> {
    if candidates.is_empty() {
        return None;
    }
    let artist_norm = normalize(target_artist);
    let title_norm = normalize(target_title);

    let mut best: Option<&CandidateTrack> = None;
    let mut best_score = 0.0;
    for candidate in candidates {
        if is_exact_match(&artist_norm, &title_norm, candidate) {
            return Some(candidate);
        }
        let score = score_candidate(&artist_norm, &title_norm, candidate);
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }
    if best_score < ACCEPT_THRESHOLD {
        None
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, artists: &[&str], uri: &str) -> CandidateTrack {
        CandidateTrack {
            uri: uri.into(),
            name: name.into(),
            artists: artists.iter().map(|s| s.to_string()).collect(),
            album: None,
            external_url: format!("https://open.spotify.com/track/{}", uri),
        }
    }

    #[test]
    fn empty_result_set_is_no_match() {
        assert!(best_match(&[], "Hugh Masekela", "Skokiaan").is_none());
    }

    #[test]
    fn exact_match_ignores_case_accents_and_spacing() {
        let candidates = vec![candidate("Velho vagabundo", &["Rivière Noire"], "exact")];
        let hit = best_match(&candidates, "Riviere Noire", "Velho   vagabundo").unwrap();
        assert_eq!(hit.uri, "exact");
    }

    #[test]
    fn exact_match_wins_over_earlier_fuzzy_candidates() {
        let candidates = vec![
            candidate("Skokiaan (Remastered)", &["Hugh Masekela"], "fuzzy"),
            candidate("Skokiaan", &["Hugh Masekela"], "exact"),
        ];
        let hit = best_match(&candidates, "Hugh Masekela", "Skokiaan").unwrap();
        assert_eq!(hit.uri, "exact");
    }

    #[test]
    fn exact_match_checks_all_credited_artists() {
        let candidates = vec![candidate(
            "Skokiaan",
            &["Herb Alpert", "Hugh Masekela"],
            "joint",
        )];
        let hit = best_match(&candidates, "Hugh Masekela", "Skokiaan").unwrap();
        assert_eq!(hit.uri, "joint");
    }

    #[test]
    fn all_low_scores_are_rejected() {
        let candidates = vec![candidate("Unrelated Song", &["Random Artist"], "bad")];
        assert!(best_match(&candidates, "Totally Different", "Nothing Alike").is_none());
    }

    #[test]
    fn near_match_clears_the_threshold() {
        let candidates = vec![candidate("Skokiaan - Single Version", &["Hugh Masekela"], "near")];
        let hit = best_match(&candidates, "Hugh Masekela", "Skokiaan").unwrap();
        assert_eq!(hit.uri, "near");
    }

    #[test]
    fn ties_keep_the_first_seen_candidate() {
        let candidates = vec![
            candidate("Same Song", &["Same Artist"], "first"),
            candidate("Same Song", &["Same Artist"], "second"),
        ];
        // Both are exact; the in-order scan must return the first.
        let hit = best_match(&candidates, "Same Artist", "Same Song").unwrap();
        assert_eq!(hit.uri, "first");
    }

    #[test]
    fn title_similarity_outweighs_artist_similarity() {
        let artist_norm = normalize("Hugh Masekela");
        let title_norm = normalize("Skokiaan");
        // Right title, wrong artist beats wrong title, right artist.
        let right_title = candidate("Skokiaan", &["Somebody Else"], "t");
        let right_artist = candidate("Different Tune", &["Hugh Masekela"], "a");
        let title_score = score_candidate(&artist_norm, &title_norm, &right_title);
        let artist_score = score_candidate(&artist_norm, &title_norm, &right_artist);
        assert!(title_score > artist_score);
    }

    #[test]
    fn multi_artist_ratio_takes_the_maximum() {
        let artist_norm = normalize("Hugh Masekela");
        let title_norm = normalize("Grazing in the Grass");
        // Title differs slightly so neither candidate takes the exact path.
        let solo = candidate("Grazing in the Grass - Single", &["Hugh Masekela"], "solo");
        let billed = candidate(
            "Grazing in the Grass - Single",
            &["Friends of Distinction", "Hugh Masekela"],
            "billed",
        );
        let solo_score = score_candidate(&artist_norm, &title_norm, &solo);
        let billed_score = score_candidate(&artist_norm, &title_norm, &billed);
        assert!((solo_score - billed_score).abs() < 1e-9);
    }
}
