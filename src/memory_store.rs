use std::{
  cmp::Reverse,
  collections::{BTreeMap, BTreeSet}
};

use anyhow::Result;
use dashmap::{DashMap, DashSet};
use tap::Tap;
use tracing::{trace, warn};

use super::{
  RecommendError,
  store::RatingStore,
  types::{FilmId, Mark, UserId}
};

/// Concurrent in-process rating store. Writers and the engine may run at the
/// same time; reads are not isolated from concurrent writes.
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
  users: DashSet<UserId>,
  marks: DashMap<UserId, BTreeMap<FilmId, u8>>
}

impl InMemoryRatingStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_user(&self, user_id: UserId) {
    self.users.insert(user_id);
  }

  /// Stores a mark, replacing any previous mark of the same user for the same
  /// film. Registers the user if needed.
  pub fn put_mark(&self, mark: Mark) -> Result<(), RecommendError> {
    if !Mark::in_range(mark.value) {
      return Err(RecommendError::InvalidMark(mark.value))
    }
    trace!("{} marks {} with {}", mark.user_id, mark.film_id, mark.value);
    self.users.insert(mark.user_id);
    self.marks.entry(mark.user_id)
      .or_default()
      .insert(mark.film_id, mark.value);
    Ok(())
  }

  pub fn remove_mark(&self, user_id: &UserId, film_id: &FilmId) -> Option<u8> {
    self.marks.get_mut(user_id)
      .and_then(|mut films| films.remove(film_id))
  }

  /// (number of marks, sum of marks) per film.
  fn film_totals(&self) -> BTreeMap<FilmId, (u32, u32)> {
    let mut totals = BTreeMap::<FilmId, (u32, u32)>::new();
    for entry in self.marks.iter() {
      for (film_id, value) in entry.value() {
        let total = totals.entry(*film_id).or_default();
        total.0 += 1;
        total.1 += u32::from(*value);
      }
    }
    totals
  }
}

impl FromIterator<Mark> for InMemoryRatingStore {
  /// Builds a store from rows, skipping out-of-range marks.
  fn from_iter<I: IntoIterator<Item = Mark>>(rows: I) -> Self {
    let store = InMemoryRatingStore::new();
    for mark in rows {
      if let Err(e) = store.put_mark(mark) {
        warn!("skipping row for {}: {}", mark.user_id, e);
      }
    }
    store
  }
}

impl RatingStore for InMemoryRatingStore {
  fn user_exists(&self, user_id: &UserId) -> Result<bool> {
    Ok(self.users.contains(user_id))
  }

  fn overlapping_users(&self, user_id: &UserId) -> Result<Vec<UserId>> {
    let rated: BTreeSet<FilmId> = match self.marks.get(user_id) {
      Some(films) => films.keys().copied().collect(),
      None => return Ok(Vec::new())
    };
    Ok(self.marks.iter()
      .filter(|entry| entry.key() != user_id)
      .filter(|entry| entry.value().keys().any(|film| rated.contains(film)))
      .map(|entry| *entry.key())
      .collect::<Vec<UserId>>()
      .tap_mut(|users| users.sort_unstable()))
  }

  fn user_marks(&self, users: &[UserId]) -> Result<Vec<Mark>> {
    Ok(users.iter()
      .filter_map(|user_id| self.marks.get(user_id).map(|films| {
        films.iter()
          .map(|(film_id, value)| Mark::new(*user_id, *film_id, *value))
          .collect::<Vec<Mark>>()
      }))
      .flatten()
      .collect())
  }

  fn aggregate_film_score(&self, film_id: &FilmId) -> Result<Option<f32>> {
    let (count, sum) = self.marks.iter()
      .filter_map(|entry| entry.value().get(film_id).copied())
      .fold((0u32, 0u32), |(count, sum), value| (count + 1, sum + u32::from(value)));
    Ok((count > 0).then(|| sum as f32 / count as f32))
  }

  fn popular_films(&self, limit: usize) -> Result<Vec<FilmId>> {
    Ok(self.film_totals()
      .into_iter()
      .collect::<Vec<(FilmId, (u32, u32))>>()
      .tap_mut(|films| films.sort_by(|(this_id, this), (other_id, other)| {
        let mean = |(count, sum): &(u32, u32)| f64::from(*sum) / f64::from(*count);
        Reverse(this.0).cmp(&Reverse(other.0))
          .then_with(|| mean(other).total_cmp(&mean(this)))
          .then_with(|| this_id.cmp(other_id))
      }))
      .into_iter()
      .take(limit)
      .map(|(film_id, _)| film_id)
      .collect())
  }
}
