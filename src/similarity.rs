use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use super::{
  profile::{RatingProfile, RatingProfiles},
  types::UserId
};

/// Agreement between the target and one candidate over the films both rated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairwiseStat {
  pub match_count: u32,
  pub diff_sum: u32
}

impl PairwiseStat {
  pub fn new(match_count: u32, diff_sum: u32) -> Self {
    Self { match_count, diff_sum }
  }

  fn record(&mut self, target_mark: u8, candidate_mark: u8) {
    self.match_count += 1;
    self.diff_sum += u32::from(target_mark.abs_diff(candidate_mark));
  }

  /// Smoothed mean absolute difference, lower is more similar. `None` when
  /// nothing matched.
  pub fn score(&self, correction: f64) -> Option<f64> {
    (self.match_count > 0)
      .then(|| (f64::from(self.diff_sum) + correction) / f64::from(self.match_count))
  }
}

/// Compares one candidate profile against the target.
pub fn pairwise_stat(target: &RatingProfile, candidate: &RatingProfile) -> PairwiseStat {
  candidate.iter()
    .filter_map(|(film, candidate_mark)| {
      target.mark(&film).map(|target_mark| (target_mark, candidate_mark))
    })
    .fold(PairwiseStat::default(), |mut stat, (target_mark, candidate_mark)| {
      stat.record(target_mark, candidate_mark);
      stat
    })
}

/// Builds a stat for every candidate in `universe` sharing at least one film
/// with the target. The target itself is skipped if present.
pub fn compute_pairwise_stats(
  target_id: &UserId,
  target: &RatingProfile,
  universe: &RatingProfiles
) -> BTreeMap<UserId, PairwiseStat> {
  if target.is_empty() {
    return BTreeMap::new()
  }
  universe.iter()
    .filter(|(user_id, _)| *user_id != target_id)
    .map(|(user_id, profile)| (*user_id, pairwise_stat(target, profile)))
    .filter(|(user_id, stat)| {
      trace!("{} matched {} films, diff sum {}", user_id, stat.match_count, stat.diff_sum);
      stat.match_count > 0
    })
    .collect()
}
