pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod list;
pub mod mapping;
#[cfg(feature = "in_memory")]
pub mod memory_store;
pub mod neighbor;
pub mod profile;
pub mod similarity;
pub mod store;
pub mod types;

#[macro_use]
extern crate derive_builder;

pub use config::RecommenderConfig;
pub use engine::{FallbackReason, NeighborRecommender, RecommendationOutcome};
pub use error::RecommendError;
pub use list::RecommendationList;
pub use mapping::IdMappingRecommender;
#[cfg(feature = "in_memory")]
pub use memory_store::InMemoryRatingStore;
pub use neighbor::NeighborMatch;
pub use profile::{RatingProfile, RatingProfiles};
pub use similarity::PairwiseStat;
pub use store::RatingStore;
pub use types::{FilmId, Mark, Recommendation, UserId};

pub trait Recommender<K, R>
  where K: ?Sized {
  fn recommend(&self, subject_id: &K)
      -> Result<RecommendationList<R>, RecommendError>;
}
