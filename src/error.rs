use thiserror::Error;

use super::types::UserId;

#[derive(Debug, Error)]
pub enum RecommendError {
  #[error("user {0} not found")]
  UnknownUser(UserId),
  #[error("no user mapped to the requested key")]
  UnmappedKey,
  #[error("mark {0} outside of the accepted range")]
  InvalidMark(u8),
  #[error(transparent)]
  Store(#[from] anyhow::Error)
}

impl RecommendError {
  /// Whether the caller should surface this as a not-found condition.
  pub fn is_not_found(&self) -> bool {
    matches!(self, RecommendError::UnknownUser(_) | RecommendError::UnmappedKey)
  }
}
