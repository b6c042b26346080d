use serde::Deserialize;

/// Tuning knobs for neighbor selection and the fallback path.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
  /// Added to the difference sum before averaging so that candidates with a
  /// handful of identical marks do not win on luck.
  #[builder(default = "10.0")]
  pub correction_constant: f64,
  /// Marks strictly above this value count as positive.
  #[builder(default = "5")]
  pub positive_threshold: u8,
  /// Length of the popular-films list returned when nobody qualifies.
  #[builder(default = "5")]
  pub fallback_size: usize,
  /// Upper bound on the number of overlapping users read from the store.
  #[builder(default)]
  pub max_universe_size: Option<usize>
}

impl RecommenderConfig {
  pub fn builder() -> RecommenderConfigBuilder {
    RecommenderConfigBuilder::default()
  }
}

impl Default for RecommenderConfig {
  fn default() -> Self {
    Self {
      correction_constant: 10.0,
      positive_threshold: 5,
      fallback_size: 5,
      max_universe_size: None
    }
  }
}
