use anyhow::Result;
use tracing::{debug, trace};

use super::{
  Recommendation,
  RecommendationList,
  config::RecommenderConfig,
  profile::RatingProfile,
  store::RatingStore,
  types::FilmId
};

/// Films the neighbor marked above `threshold` that the target never rated,
/// in ascending film order.
pub fn qualifying_films(target: &RatingProfile, neighbor: &RatingProfile, threshold: u8) -> Vec<FilmId> {
  neighbor.positive_films(threshold)
    .filter(|film| !target.has_rated(film))
    .collect()
}

/// Orders the neighbor's qualifying films by their aggregate score. An empty
/// candidate set stays empty.
pub fn assemble<S>(
  store: &S,
  target: &RatingProfile,
  neighbor: &RatingProfile,
  config: &RecommenderConfig
) -> Result<RecommendationList<FilmId>>
  where S: RatingStore + ?Sized {
  let films = qualifying_films(target, neighbor, config.positive_threshold);
  debug!("Scoring {} candidate films", films.len());
  let recs = films.into_iter()
    .map(|film| -> Result<Recommendation<FilmId>> {
      let score = store.aggregate_film_score(&film)?;
      trace!("{} aggregate score {:?}", film, score);
      Ok(Recommendation::new(film, score))
    })
    .collect::<Result<Vec<Recommendation<FilmId>>>>()?;
  Ok(RecommendationList::new_with_sort(recs))
}

/// Popular films, independent of the target's marks.
pub fn fallback<S>(store: &S, config: &RecommenderConfig) -> Result<RecommendationList<FilmId>>
  where S: RatingStore + ?Sized {
  let films = store.popular_films(config.fallback_size)?;
  debug!("Falling back to {} popular films", films.len());
  Ok(RecommendationList::from_ordered(
    films.into_iter()
      .take(config.fallback_size)
      .map(Recommendation::unscored)
  ))
}
