use std::{
  cmp::Ordering,
  collections::BTreeMap
};

use serde::Serialize;
use tracing::{debug, trace};

use super::{
  config::RecommenderConfig,
  profile::{RatingProfile, RatingProfiles},
  similarity::PairwiseStat,
  types::UserId
};

/// The candidate chosen as most similar to the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeighborMatch {
  pub user_id: UserId,
  pub stat: PairwiseStat,
  pub score: f64
}

/// True when `candidate` marked at least one film above `threshold` that the
/// target has not rated at all.
pub fn has_qualifying_films(target: &RatingProfile, candidate: &RatingProfile, threshold: u8) -> bool {
  candidate.positive_films(threshold)
    .any(|film| !target.has_rated(&film))
}

/// Orders candidates best first: lower score, then more matches, then lower id.
///
/// Scores are compared by cross-multiplying so that candidates with equal
/// smoothed means tie exactly.
fn rank(
  correction: f64,
  (this_id, this): (&UserId, &PairwiseStat),
  (other_id, other): (&UserId, &PairwiseStat)
) -> Ordering {
  let lhs = (f64::from(this.diff_sum) + correction) * f64::from(other.match_count);
  let rhs = (f64::from(other.diff_sum) + correction) * f64::from(this.match_count);
  lhs.total_cmp(&rhs)
    .then_with(|| other.match_count.cmp(&this.match_count))
    .then_with(|| this_id.cmp(other_id))
}

/// Picks the single best neighbor among eligible candidates, if any.
pub fn select_neighbor(
  stats: &BTreeMap<UserId, PairwiseStat>,
  target: &RatingProfile,
  universe: &RatingProfiles,
  config: &RecommenderConfig
) -> Option<NeighborMatch> {
  let threshold = config.positive_threshold;
  let correction = config.correction_constant;
  stats.iter()
    .filter(|(_, stat)| stat.match_count > 0)
    .filter(|(user_id, _)| {
      let usable = universe.get(user_id)
        .is_some_and(|candidate| has_qualifying_films(target, candidate, threshold));
      if !usable {
        trace!("{} has nothing new to offer, skipping", user_id);
      }
      usable
    })
    .min_by(|this, other| rank(correction, *this, *other))
    .and_then(|(user_id, stat)| {
      stat.score(correction)
        .map(|score| NeighborMatch { user_id: *user_id, stat: *stat, score })
    })
    .inspect(|neighbor| {
      debug!("selected {} with score {:.3} over {} matches",
        neighbor.user_id, neighbor.score, neighbor.stat.match_count);
    })
}
