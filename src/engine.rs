use serde::Serialize;
use tap::Tap;
use tracing::{Level, span, debug, trace, warn};

use super::{
  Recommender,
  RecommendError,
  RecommendationList,
  assembler,
  config::RecommenderConfig,
  neighbor::{NeighborMatch, select_neighbor},
  profile::RatingProfiles,
  similarity::compute_pairwise_stats,
  store::RatingStore,
  types::{FilmId, UserId}
};

/// Why the popular list was served instead of a personalized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FallbackReason {
  /// The target rated nothing, or nobody shares a rated film with them.
  EmptyUniverse,
  /// Overlapping users exist but none has anything new to offer.
  NoEligibleNeighbor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecommendationOutcome {
  Personalized {
    neighbor: NeighborMatch,
    films: RecommendationList<FilmId>
  },
  Fallback {
    reason: FallbackReason,
    films: RecommendationList<FilmId>
  }
}

impl RecommendationOutcome {
  pub fn films(&self) -> &RecommendationList<FilmId> {
    match self {
      RecommendationOutcome::Personalized { films, .. } => films,
      RecommendationOutcome::Fallback { films, .. } => films
    }
  }

  pub fn into_films(self) -> RecommendationList<FilmId> {
    match self {
      RecommendationOutcome::Personalized { films, .. } => films,
      RecommendationOutcome::Fallback { films, .. } => films
    }
  }

  pub fn neighbor(&self) -> Option<&NeighborMatch> {
    match self {
      RecommendationOutcome::Personalized { neighbor, .. } => Some(neighbor),
      RecommendationOutcome::Fallback { .. } => None
    }
  }
}

/// Recommends the films liked by the single most similar other user.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct NeighborRecommender<S>
  where S: RatingStore {
  store: S,
  #[builder(default)]
  config: RecommenderConfig
}

impl<S> NeighborRecommender<S>
  where S: RatingStore {
  pub fn new(store: S, config: RecommenderConfig) -> Self {
    Self { store, config }
  }

  pub fn builder() -> NeighborRecommenderBuilder<S> {
    NeighborRecommenderBuilder::default()
  }

  pub fn config(&self) -> &RecommenderConfig {
    &self.config
  }

  /// Runs the full pipeline and reports which path produced the films.
  pub fn recommend_detailed(&self, target_id: &UserId)
    -> Result<RecommendationOutcome, RecommendError> {
    let span = span!(Level::DEBUG, "neighbor-recommend", user = %target_id);
    let _guard = span.enter();
    if !self.store.user_exists(target_id)? {
      return Err(RecommendError::UnknownUser(*target_id))
    }

    trace!("Loading target marks");
    let target = RatingProfiles::fold(self.store.user_marks(&[*target_id])?)
      .profile_of(target_id);
    if target.is_empty() {
      debug!("Target has no marks");
      return self.fallback(FallbackReason::EmptyUniverse)
    }

    let users = self.universe_members(target_id)?;
    if users.is_empty() {
      debug!("No user shares a film with the target");
      return self.fallback(FallbackReason::EmptyUniverse)
    }

    trace!("Loading marks of {} overlapping users", users.len());
    let universe = RatingProfiles::fold(self.store.user_marks(&users)?);
    let stats = compute_pairwise_stats(target_id, &target, &universe);
    if stats.is_empty() {
      return self.fallback(FallbackReason::EmptyUniverse)
    }

    let Some(neighbor) = select_neighbor(&stats, &target, &universe, &self.config) else {
      debug!("None of {} candidates is eligible", stats.len());
      return self.fallback(FallbackReason::NoEligibleNeighbor)
    };
    let neighbor_profile = universe.profile_of(&neighbor.user_id);
    let films = assembler::assemble(&self.store, &target, &neighbor_profile, &self.config)?;
    trace!("Returning {} recommendations", films.len());
    Ok(RecommendationOutcome::Personalized { neighbor, films })
  }

  /// Overlapping users, capped at the configured universe size.
  fn universe_members(&self, target_id: &UserId) -> Result<Vec<UserId>, RecommendError> {
    let mut users = self.store.overlapping_users(target_id)?
      .tap_mut(|users| {
        users.retain(|user| user != target_id);
        users.sort_unstable();
        users.dedup();
      });
    if let Some(limit) = self.config.max_universe_size {
      if users.len() > limit {
        warn!("Universe of {} users exceeds limit of {}, truncating", users.len(), limit);
        users.truncate(limit);
      }
    }
    Ok(users)
  }

  fn fallback(&self, reason: FallbackReason) -> Result<RecommendationOutcome, RecommendError> {
    let films = assembler::fallback(&self.store, &self.config)?;
    Ok(RecommendationOutcome::Fallback { reason, films })
  }
}

impl<S> Recommender<UserId, FilmId> for NeighborRecommender<S>
  where S: RatingStore {
  fn recommend(&self, subject_id: &UserId)
    -> Result<RecommendationList<FilmId>, RecommendError> {
    self.recommend_detailed(subject_id)
      .map(RecommendationOutcome::into_films)
  }
}

#[cfg(test)]
mod tests {
  use anyhow::anyhow;

  use super::*;
  use crate::types::Mark;

  struct FailingStore;

  impl RatingStore for FailingStore {
    fn user_exists(&self, _user_id: &UserId) -> anyhow::Result<bool> {
      Ok(true)
    }

    fn overlapping_users(&self, _user_id: &UserId) -> anyhow::Result<Vec<UserId>> {
      Ok(Vec::new())
    }

    fn user_marks(&self, _users: &[UserId]) -> anyhow::Result<Vec<Mark>> {
      Err(anyhow!("connection reset"))
    }

    fn aggregate_film_score(&self, _film_id: &FilmId) -> anyhow::Result<Option<f32>> {
      Ok(None)
    }

    fn popular_films(&self, _limit: usize) -> anyhow::Result<Vec<FilmId>> {
      Ok(Vec::new())
    }
  }

  #[test]
  fn store_failures_propagate_unchanged() {
    let recommender = NeighborRecommender::builder()
      .store(FailingStore)
      .build()
      .unwrap();
    let err = recommender.recommend(&UserId(1)).unwrap_err();
    assert!(matches!(err, RecommendError::Store(_)));
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "connection reset");
  }

  #[cfg(feature = "in_memory")]
  mod in_memory {
    use std::collections::BTreeMap;

    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::super::*;
    use crate::{
      memory_store::InMemoryRatingStore,
      neighbor::has_qualifying_films,
      similarity::pairwise_stat,
      types::Mark
    };

    fn store(rows: &[(u64, u64, u8)]) -> InMemoryRatingStore {
      rows.iter().copied().map(Mark::from).collect()
    }

    fn recommender(store: &InMemoryRatingStore) -> NeighborRecommender<&InMemoryRatingStore> {
      NeighborRecommender::builder()
        .store(store)
        .build()
        .unwrap()
    }

    /// Target 1 rates ten films. User 2 matches nine of them off by one and
    /// adds films 11 and 12. User 3 matches seven off by one and adds only a
    /// low mark. User 4 never overlaps but drags film 11's average down.
    fn scenario_store() -> InMemoryRatingStore {
      let target_marks = [1u8, 1, 3, 3, 5, 5, 7, 7, 9, 9];
      let mut rows = Vec::new();
      for (film, mark) in (1u64..).zip(target_marks) {
        rows.push((1, film, mark));
        if film <= 9 {
          rows.push((2, film, mark + 1));
        }
        if film <= 7 {
          rows.push((3, film, mark + 1));
        }
      }
      rows.extend([(2, 11, 10), (2, 12, 8), (3, 13, 3), (4, 11, 2)]);
      store(&rows)
    }

    #[test]
    fn selects_closest_neighbor_and_orders_by_aggregate() {
      let store = scenario_store();
      let outcome = recommender(&store).recommend_detailed(&UserId(1)).unwrap();
      let neighbor = outcome.neighbor().unwrap();
      assert_eq!(neighbor.user_id, UserId(2));
      assert_eq!(neighbor.stat.match_count, 9);
      assert_eq!(neighbor.stat.diff_sum, 9);
      assert!((neighbor.score - 19.0 / 9.0).abs() < 1e-9);
      assert_eq!(outcome.films().item_ids(), vec![FilmId(12), FilmId(11)]);
      assert_eq!(outcome.films().0[0].score, Some(8.0));
      assert_eq!(outcome.films().0[1].score, Some(6.0));
    }

    #[test]
    fn single_film_without_overlap_falls_back_to_popular() {
      let mut rows = vec![(1, 100, 8)];
      for film in 1..=7u64 {
        rows.push((2, film, 6));
      }
      let store = store(&rows);
      let outcome = recommender(&store).recommend_detailed(&UserId(1)).unwrap();
      assert!(matches!(outcome, RecommendationOutcome::Fallback {
        reason: FallbackReason::EmptyUniverse, ..
      }));
      assert_eq!(outcome.films().len(), 5);
    }

    #[test]
    fn user_without_marks_gets_popular_list() {
      let store = store(&[(2, 1, 9), (2, 2, 8), (3, 1, 7), (2, 3, 6), (2, 4, 6), (3, 5, 9)]);
      store.register_user(UserId(1));
      let films = recommender(&store).recommend(&UserId(1)).unwrap();
      assert_eq!(films.item_ids(), store.popular_films(5).unwrap());
      assert_eq!(films.len(), 5);
    }

    #[test]
    fn ineligible_candidates_lead_to_fallback() {
      let store = store(&[(1, 1, 8), (2, 1, 8), (2, 2, 3), (3, 3, 9)]);
      let outcome = recommender(&store).recommend_detailed(&UserId(1)).unwrap();
      assert!(matches!(outcome, RecommendationOutcome::Fallback {
        reason: FallbackReason::NoEligibleNeighbor, ..
      }));
      assert_eq!(outcome.films().item_ids(), vec![FilmId(1), FilmId(3), FilmId(2)]);
    }

    #[test]
    fn unknown_user_is_not_found() {
      let store = store(&[(2, 1, 9)]);
      let err = recommender(&store).recommend(&UserId(1)).unwrap_err();
      assert!(matches!(err, RecommendError::UnknownUser(UserId(1))));
      assert!(err.is_not_found());
    }

    #[test]
    fn universe_bound_keeps_lowest_user_ids() {
      let store = store(&[(1, 1, 5), (2, 1, 10), (2, 50, 9), (3, 1, 5), (3, 51, 9)]);
      let unbounded = recommender(&store).recommend_detailed(&UserId(1)).unwrap();
      assert_eq!(unbounded.neighbor().unwrap().user_id, UserId(3));

      let bounded = NeighborRecommender::builder()
        .store(&store)
        .config(RecommenderConfig::builder().max_universe_size(Some(1)).build().unwrap())
        .build()
        .unwrap();
      let outcome = bounded.recommend_detailed(&UserId(1)).unwrap();
      assert_eq!(outcome.neighbor().unwrap().user_id, UserId(2));
      assert_eq!(outcome.films().item_ids(), vec![FilmId(50)]);
    }

    fn random_store(seed: u64) -> InMemoryRatingStore {
      let mut rng = StdRng::seed_from_u64(seed);
      let store = InMemoryRatingStore::new();
      for user in 1..=30u64 {
        store.register_user(UserId(user));
        // every fifth user stays without marks
        if user % 5 == 0 {
          continue
        }
        for film in 1..=40u64 {
          if rng.gen_bool(0.25) {
            store.put_mark(Mark::new(UserId(user), FilmId(film), rng.gen_range(1..=10))).unwrap();
          }
        }
      }
      store
    }

    #[test]
    fn random_universes_hold_selection_properties() {
      let config = RecommenderConfig::default();
      for seed in 0..10 {
        let store = random_store(seed);
        let recommender = recommender(&store);
        let users: Vec<UserId> = (1..=30).map(UserId).collect();
        let everyone = RatingProfiles::fold(store.user_marks(&users).unwrap());

        for target_id in &users {
          let outcome = recommender.recommend_detailed(target_id).unwrap();
          assert_eq!(outcome, recommender.recommend_detailed(target_id).unwrap());

          let target = everyone.profile_of(target_id);
          if target.is_empty() {
            assert!(matches!(outcome, RecommendationOutcome::Fallback { .. }));
            assert_eq!(outcome.films().len(), config.fallback_size);
            continue
          }

          let eligible: BTreeMap<UserId, f64> = everyone.iter()
            .filter(|(user_id, _)| *user_id != target_id)
            .filter(|(_, profile)| has_qualifying_films(&target, profile, config.positive_threshold))
            .filter_map(|(user_id, profile)| {
              pairwise_stat(&target, profile)
                .score(config.correction_constant)
                .map(|score| (*user_id, score))
            })
            .collect();

          let Some(neighbor) = outcome.neighbor() else {
            assert!(eligible.is_empty());
            continue
          };
          assert!(neighbor.stat.match_count > 0);
          for (user_id, score) in &eligible {
            assert!(*score >= neighbor.score - 1e-9, "{} beats the chosen neighbor", user_id);
            if (*score - neighbor.score).abs() < 1e-9 {
              let stat = pairwise_stat(&target, &everyone.profile_of(user_id));
              assert!(stat.match_count <= neighbor.stat.match_count);
            }
          }

          let neighbor_profile = everyone.profile_of(&neighbor.user_id);
          for film in outcome.films().item_ids() {
            assert!(neighbor_profile.mark(&film).is_some_and(|mark| mark > config.positive_threshold));
            assert!(!target.has_rated(&film));
          }
        }
      }
    }
  }
}
