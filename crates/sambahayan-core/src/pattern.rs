//! Learned acceptance statistics per match type.
//!
//! Counters only ever grow. A confidence is reported only once an entry has
//! been shown at least `min_samples` times; below that it is insufficient
//! data and callers fall back to the rule tier.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::match_type::MatchType;

/// Aggregate counters for one match type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStats {
  pub match_type:     MatchType,
  pub total_shown:    u64,
  pub total_accepted: u64,
  pub total_modified: u64,
  pub updated_at:     Option<DateTime<Utc>>,
}

/// A trusted learned confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedConfidence {
  /// Acceptance rate, rounded, 0..=100.
  pub percent:     u8,
  pub sample_size: u64,
}

impl PatternStats {
  pub fn empty(match_type: MatchType) -> Self {
    Self {
      match_type,
      total_shown: 0,
      total_accepted: 0,
      total_modified: 0,
      updated_at: None,
    }
  }

  /// `total_accepted / total_shown` as a percentage, or `None` below the
  /// sample threshold.
  ///
  /// The two counters are incremented independently, so accepted may briefly
  /// run ahead of shown; the result is clamped to 100.
  pub fn confidence(&self, min_samples: u64) -> Option<LearnedConfidence> {
    if self.total_shown == 0 || self.total_shown < min_samples {
      return None;
    }
    let shown = u128::from(self.total_shown);
    let rounded = (u128::from(self.total_accepted) * 100 + shown / 2) / shown;
    Some(LearnedConfidence {
      percent:     rounded.min(100) as u8,
      sample_size: self.total_shown,
    })
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A read-only snapshot of the pattern store, loaded once per request and
/// handed to the ranker.
#[derive(Debug, Clone, Default)]
pub struct LearnedTable {
  entries: HashMap<MatchType, PatternStats>,
}

impl LearnedTable {
  pub fn new(stats: impl IntoIterator<Item = PatternStats>) -> Self {
    Self {
      entries: stats.into_iter().map(|s| (s.match_type, s)).collect(),
    }
  }

  pub fn get(&self, match_type: MatchType) -> Option<&PatternStats> {
    self.entries.get(&match_type)
  }

  /// Number of times `match_type` has been shown (zero when unknown).
  pub fn sample_size(&self, match_type: MatchType) -> u64 {
    self.get(match_type).map_or(0, |s| s.total_shown)
  }

  pub fn confidence(
    &self,
    match_type: MatchType,
    min_samples: u64,
  ) -> Option<LearnedConfidence> {
    self.get(match_type)?.confidence(min_samples)
  }

  /// Summary rows sorted by match type, for display alongside suggestions.
  pub fn summary(&self, min_samples: u64) -> Vec<PatternSummary> {
    let mut rows: Vec<PatternSummary> = self
      .entries
      .values()
      .map(|stats| PatternSummary {
        confidence: stats.confidence(min_samples).map(|c| c.percent),
        stats:      stats.clone(),
      })
      .collect();
    rows.sort_by_key(|row| row.stats.match_type);
    rows
  }
}

/// One learned-pattern row as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
  #[serde(flatten)]
  pub stats:      PatternStats,
  /// `None` means insufficient data.
  pub confidence: Option<u8>,
}
