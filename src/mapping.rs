use super::{
  Recommender,
  RecommendError,
  RecommendationList
};

/// Lets callers ask for recommendations by an external key, such as a login,
/// while the wrapped recommender works on internal ids.
pub struct IdMappingRecommender<M, R> {
  mapper: M,
  recommender: R,
}

impl<M, R> IdMappingRecommender<M, R> {
  pub fn new(mapper: M, recommender: R) -> Self {
    IdMappingRecommender { mapper, recommender }
  }

  pub fn inner(&self) -> &R {
    &self.recommender
  }
}

impl<M, R, InputKey, MappedKey, Rec> Recommender<InputKey, Rec> for IdMappingRecommender<M, R>
  where InputKey: ?Sized,
        R: Recommender<MappedKey, Rec>,
        M: Fn(&InputKey) -> Option<MappedKey> {
  fn recommend(&self, subject_id: &InputKey)
        -> Result<RecommendationList<Rec>, RecommendError> {
    (self.mapper)(subject_id)
      .ok_or(RecommendError::UnmappedKey)
      .and_then(|key| self.recommender.recommend(&key))
  }
}
