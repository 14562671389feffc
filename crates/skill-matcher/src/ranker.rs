//! Top-K ranking of scored candidates.

use std::cmp::Ordering;

use crate::error::MatchError;

/// Maximum number of candidates kept in a suggestion
pub const DEFAULT_TOP_K: usize = 20;

/// A candidate and its similarity to the requester's wanted skills.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub user_id: String,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(user_id: impl Into<String>, score: f32) -> Self {
        Self {
            user_id: user_id.into(),
            score,
        }
    }
}

/// Descending by score; NaN sorts after every number and `-0.0 == 0.0`.
fn by_score_desc(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Order candidates best-first and keep the first `top_k` ids.
///
/// The sort is stable: equal scores keep their input order. Candidates must
/// already exclude the requester; finding it is reported as
/// [`MatchError::SelfCandidate`]. An empty input is a valid, empty result.
pub fn rank(
    requester_id: &str,
    mut candidates: Vec<ScoredCandidate>,
    top_k: usize,
) -> Result<Vec<String>, MatchError> {
    if candidates.iter().any(|c| c.user_id == requester_id) {
        return Err(MatchError::SelfCandidate(requester_id.to_string()));
    }

    candidates.sort_by(by_score_desc);
    candidates.truncate(top_k);
    Ok(candidates.into_iter().map(|c| c.user_id).collect())
}
