use std::collections::{
  BTreeMap,
  btree_map
};

use super::types::{FilmId, Mark, UserId};

/// One user's marks, keyed by film. Lives for a single recommendation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingProfile {
  marks: BTreeMap<FilmId, u8>
}

impl RatingProfile {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records a mark, replacing any earlier mark for the same film.
  fn insert(&mut self, film_id: FilmId, value: u8) {
    self.marks.insert(film_id, value);
  }

  pub fn mark(&self, film_id: &FilmId) -> Option<u8> {
    self.marks.get(film_id).copied()
  }

  pub fn has_rated(&self, film_id: &FilmId) -> bool {
    self.marks.contains_key(film_id)
  }

  pub fn is_empty(&self) -> bool {
    self.marks.is_empty()
  }

  pub fn len(&self) -> usize {
    self.marks.len()
  }

  /// Iterates over (film, mark) pairs in ascending film order.
  pub fn iter(&self) -> impl Iterator<Item = (FilmId, u8)> + '_ {
    self.marks.iter().map(|(film, mark)| (*film, *mark))
  }

  /// Films marked strictly above `threshold`.
  pub fn positive_films(&self, threshold: u8) -> impl Iterator<Item = FilmId> + '_ {
    self.iter()
      .filter(move |(_, mark)| *mark > threshold)
      .map(|(film, _)| film)
  }
}

impl FromIterator<(FilmId, u8)> for RatingProfile {
  fn from_iter<I: IntoIterator<Item = (FilmId, u8)>>(iter: I) -> Self {
    iter.into_iter().fold(RatingProfile::new(), |mut profile, (film, mark)| {
      profile.insert(film, mark);
      profile
    })
  }
}

/// Profiles for every user appearing in a batch of mark rows.
#[derive(Debug, Clone, Default)]
pub struct RatingProfiles(BTreeMap<UserId, RatingProfile>);

impl RatingProfiles {
  /// Folds a stream of rows into per-user profiles. Later rows for the same
  /// (user, film) pair overwrite earlier ones.
  pub fn fold<I>(rows: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Mark> {
    let profiles = rows.into_iter()
      .map(Into::into)
      .fold(BTreeMap::<UserId, RatingProfile>::new(), |mut acc, mark: Mark| {
        acc.entry(mark.user_id)
          .or_default()
          .insert(mark.film_id, mark.value);
        acc
      });
    Self(profiles)
  }

  pub fn get(&self, user_id: &UserId) -> Option<&RatingProfile> {
    self.0.get(user_id)
  }

  /// The user's profile, or an empty one when the user has no rows.
  pub fn profile_of(&self, user_id: &UserId) -> RatingProfile {
    self.0.get(user_id).cloned().unwrap_or_default()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Iterates over users in ascending id order.
  pub fn iter(&self) -> btree_map::Iter<'_, UserId, RatingProfile> {
    self.0.iter()
  }
}

impl<'a> IntoIterator for &'a RatingProfiles {
  type Item = (&'a UserId, &'a RatingProfile);
  type IntoIter = btree_map::Iter<'a, UserId, RatingProfile>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
