use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest mark a user can give a film.
pub const MIN_MARK: u8 = 1;
/// Highest mark a user can give a film.
pub const MAX_MARK: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilmId(pub u64);

impl From<u64> for UserId {
  fn from(value: u64) -> Self {
    UserId(value)
  }
}

impl From<u64> for FilmId {
  fn from(value: u64) -> Self {
    FilmId(value)
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "user:{}", self.0)
  }
}

impl fmt::Display for FilmId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "film:{}", self.0)
  }
}

/// A user's mark for a single film, as stored by the rating store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
  pub user_id: UserId,
  pub film_id: FilmId,
  pub value: u8
}

impl Mark {
  pub fn new(user_id: UserId, film_id: FilmId, value: u8) -> Self {
    Mark { user_id, film_id, value }
  }

  /// Positive marks are strictly above the threshold.
  pub fn is_positive(&self, threshold: u8) -> bool {
    self.value > threshold
  }

  pub fn in_range(value: u8) -> bool {
    (MIN_MARK..=MAX_MARK).contains(&value)
  }
}

impl From<(u64, u64, u8)> for Mark {
  fn from(value: (u64, u64, u8)) -> Self {
    Mark::new(UserId(value.0), FilmId(value.1), value.2)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<T> {
  pub item_id: T,
  pub score: Option<f32>
}

impl<T> Recommendation<T> {
  pub fn new(item_id: T, score: Option<f32>) -> Self {
    Self { item_id, score }
  }

  pub fn unscored(item_id: T) -> Self {
    Self { item_id, score: None }
  }
}

impl<IntoId, Id> From<(IntoId, Option<f32>)> for Recommendation<Id>
  where IntoId: Into<Id> {
  fn from(value: (IntoId, Option<f32>)) -> Self {
    Recommendation::new(value.0.into(), value.1)
  }
}

impl<IntoId, Id> From<(IntoId, f32)> for Recommendation<Id>
  where IntoId: Into<Id> {
  fn from(value: (IntoId, f32)) -> Self {
    Recommendation::new(value.0.into(), Some(value.1))
  }
}
