use anyhow::Result;

use super::types::{FilmId, Mark, UserId};

/// Read access to persisted marks. Implementations compute the overlapping
/// universe and aggregate scores themselves, typically with a join in the
/// backing database.
pub trait RatingStore {
  fn user_exists(&self, user_id: &UserId) -> Result<bool>;

  /// Users other than `user_id` who rated at least one film `user_id` rated.
  fn overlapping_users(&self, user_id: &UserId) -> Result<Vec<UserId>>;

  /// Every mark produced by the given users.
  fn user_marks(&self, users: &[UserId]) -> Result<Vec<Mark>>;

  /// Mean mark across all users who rated the film.
  fn aggregate_film_score(&self, film_id: &FilmId) -> Result<Option<f32>>;

  /// Most popular films, best first, at most `limit` of them.
  fn popular_films(&self, limit: usize) -> Result<Vec<FilmId>>;
}

impl<S> RatingStore for &S
  where S: RatingStore + ?Sized {
  fn user_exists(&self, user_id: &UserId) -> Result<bool> {
    (**self).user_exists(user_id)
  }

  fn overlapping_users(&self, user_id: &UserId) -> Result<Vec<UserId>> {
    (**self).overlapping_users(user_id)
  }

  fn user_marks(&self, users: &[UserId]) -> Result<Vec<Mark>> {
    (**self).user_marks(users)
  }

  fn aggregate_film_score(&self, film_id: &FilmId) -> Result<Option<f32>> {
    (**self).aggregate_film_score(film_id)
  }

  fn popular_films(&self, limit: usize) -> Result<Vec<FilmId>> {
    (**self).popular_films(limit)
  }
}
