//! Applies user feedback to the learned-pattern store after a household save.
//!
//! The recorder runs after the household transaction has committed, so
//! nothing here can fail the save. Each counter write is retried a bounded
//! number of times; what still fails is logged and counted in the report.

use std::{sync::Arc, time::Duration};

use sambahayan_core::{
  feedback::{FeedbackEvent, PatternUpdate},
  store::PatternStore,
};

use crate::config::FeedbackConfig;

/// What happened to one feedback event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackReport {
  pub event_logged: bool,
  /// Counter updates that were applied.
  pub applied:      usize,
  /// Counter updates abandoned after exhausting retries.
  pub failed:       usize,
}

pub struct FeedbackRecorder<P> {
  patterns: Arc<P>,
  config:   FeedbackConfig,
}

impl<P: PatternStore> FeedbackRecorder<P> {
  pub fn new(patterns: Arc<P>, config: FeedbackConfig) -> Self { Self { patterns, config } }

  /// Log `event` and apply its counter updates. An empty event is a no-op.
  pub async fn record(&self, event: FeedbackEvent) -> FeedbackReport {
    let mut report = FeedbackReport::default();
    if event.input.is_empty() {
      return report;
    }

    let household_id = event.household_id;
    let updates = event.pattern_updates();

    match self.patterns.append_feedback(event).await {
      Ok(()) => report.event_logged = true,
      Err(e) => {
        tracing::error!(%household_id, error = %e, "failed to log feedback event");
      }
    }

    for update in updates {
      if self.apply(update).await {
        report.applied += 1;
      } else {
        report.failed += 1;
      }
    }

    if report.failed > 0 {
      tracing::error!(
        %household_id,
        applied = report.applied,
        failed = report.failed,
        "learned patterns partially updated"
      );
    } else {
      tracing::debug!(%household_id, applied = report.applied, "learned patterns updated");
    }
    report
  }

  /// Apply one update with linear backoff. Returns whether it stuck.
  async fn apply(&self, update: PatternUpdate) -> bool {
    let attempts = self.config.max_attempts.max(1);
    for attempt in 1..=attempts {
      let result = match update {
        PatternUpdate::Shown(match_type) => self.patterns.record_shown(match_type).await,
        PatternUpdate::Outcome {
          match_type,
          accepted,
          modified,
        } => {
          self
            .patterns
            .record_outcome(match_type, accepted, modified)
            .await
        }
      };
      match result {
        Ok(()) => return true,
        Err(e) if attempt < attempts => {
          tracing::warn!(?update, attempt, error = %e, "pattern update failed; retrying");
          let backoff = self.config.retry_backoff_ms.saturating_mul(u64::from(attempt));
          tokio::time::sleep(Duration::from_millis(backoff)).await;
        }
        Err(e) => {
          tracing::error!(?update, attempts, error = %e, "pattern update abandoned");
        }
      }
    }
    false
  }
}
