//! Tunable engine parameters.
//!
//! Every threshold here was inferred from observed behaviour and has not been
//! confirmed against real acceptance data, so none of them is hard-coded.

use std::time::Duration;

use sambahayan_core::rank::RankingConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub ranking:          RankingConfig,
  /// Learned confidence an unevaluated candidate needs to survive the
  /// semantic filter (STRONG candidates always survive).
  pub inclusion_floor:  u8,
  /// Drop candidates who already belong to another active household.
  pub exclude_assigned: bool,
  pub filter:           FilterConfig,
  pub feedback:         FeedbackConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      ranking:          RankingConfig::default(),
      inclusion_floor:  80,
      exclude_assigned: true,
      filter:           FilterConfig::default(),
      feedback:         FeedbackConfig::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
  pub timeout_ms:     u64,
  /// How many top-ranked candidates are sent to the filter.
  pub max_candidates: usize,
}

impl Default for FilterConfig {
  fn default() -> Self {
    Self {
      timeout_ms:     8_000,
      max_candidates: 40,
    }
  }
}

impl FilterConfig {
  pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
  /// Attempts per counter write, including the first.
  pub max_attempts:     u32,
  /// Linear backoff step between attempts.
  pub retry_backoff_ms: u64,
}

impl Default for FeedbackConfig {
  fn default() -> Self {
    Self {
      max_attempts:     3,
      retry_backoff_ms: 200,
    }
  }
}
