use std::cmp::Ordering;

use serde::Serialize;

use super::Recommendation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationList<K>(pub Vec<Recommendation<K>>);

/// Higher scores first, unscored items after every scored one.
fn by_score_desc<K>(this: &Recommendation<K>, other: &Recommendation<K>) -> Ordering {
  match (this.score, other.score) {
    (Some(this), Some(other)) => other.total_cmp(&this),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal
  }
}

impl<K> RecommendationList<K> {

  /// Stable sort, so equally scored and unscored items keep their input order.
  pub fn new_with_sort(mut recs: Vec<Recommendation<K>>) -> Self {
    recs.sort_by(by_score_desc);
    Self(recs)
  }

  /// Keeps the order the items arrive in.
  pub fn from_ordered<I>(value: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Recommendation<K>> {
    Self(value.into_iter()
      .map(|item| item.into())
      .collect::<Vec<Recommendation<K>>>())
  }

  pub fn from_iter_with_sort<I>(value: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Recommendation<K>> {
    let recs = value.into_iter()
      .map(|item| item.into())
      .collect::<Vec<Recommendation<K>>>();
    Self::new_with_sort(recs)
  }

  pub fn item_ids(&self) -> Vec<K>
    where K: Clone {
    self.0.iter()
      .map(|rec| rec.item_id.clone())
      .collect()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K> From<RecommendationList<K>> for Vec<Recommendation<K>> {
  fn from(value: RecommendationList<K>) -> Self {
    value.0
  }
}

impl<K> IntoIterator for RecommendationList<K> {
  type Item = Recommendation<K>;
  type IntoIter = std::vec::IntoIter<Recommendation<K>>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}
