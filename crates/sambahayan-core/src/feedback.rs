//! Feedback events recorded when a household is saved.
//!
//! Events are append-only and write-once. The learned-pattern counters are
//! derived from them through [`FeedbackEvent::pattern_updates`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  match_type::{MatchType, Relation},
  person::PersonRef,
};

/// A suggestion that was displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShownSuggestion {
  pub person:             PersonRef,
  pub match_type:         MatchType,
  #[serde(default)]
  pub suggested_relation: Option<Relation>,
}

/// A suggestion the user added to the household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedSuggestion {
  pub person:             PersonRef,
  pub match_type:         MatchType,
  #[serde(default)]
  pub suggested_relation: Option<Relation>,
  pub final_relation:     Relation,
}

/// A suggestion whose relation the user changed before saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedSuggestion {
  pub person:            PersonRef,
  pub match_type:        MatchType,
  #[serde(default)]
  pub original_relation: Option<Relation>,
  pub final_relation:    Relation,
}

/// The three feedback lists supplied with a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
  #[serde(default)]
  pub shown:    Vec<ShownSuggestion>,
  #[serde(default)]
  pub accepted: Vec<AcceptedSuggestion>,
  #[serde(default)]
  pub modified: Vec<ModifiedSuggestion>,
}

impl FeedbackInput {
  pub fn is_empty(&self) -> bool {
    self.shown.is_empty() && self.accepted.is_empty() && self.modified.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
  pub event_id:     Uuid,
  pub household_id: Uuid,
  pub recorded_at:  DateTime<Utc>,
  #[serde(flatten)]
  pub input:        FeedbackInput,
}

/// One counter update against the pattern store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternUpdate {
  Shown(MatchType),
  Outcome {
    match_type: MatchType,
    accepted:   bool,
    modified:   bool,
  },
}

impl FeedbackEvent {
  pub fn new(household_id: Uuid, input: FeedbackInput) -> Self {
    Self {
      event_id: Uuid::new_v4(),
      household_id,
      recorded_at: Utc::now(),
      input,
    }
  }

  /// Counter updates implied by this event:
  ///
  /// - every shown suggestion counts once as shown;
  /// - every accepted suggestion is an accepted outcome, modified when its
  ///   final relation differs from the suggestion or it appears in the
  ///   modified list;
  /// - every shown suggestion that was not accepted is a rejected outcome.
  pub fn pattern_updates(&self) -> Vec<PatternUpdate> {
    let input = &self.input;
    let accepted_people: HashSet<PersonRef> =
      input.accepted.iter().map(|a| a.person).collect();
    let modified_people: HashSet<PersonRef> = input
      .modified
      .iter()
      .filter(|m| m.original_relation != Some(m.final_relation))
      .map(|m| m.person)
      .collect();

    let shown = input.shown.iter().map(|s| PatternUpdate::Shown(s.match_type));

    let accepted = input.accepted.iter().map(|a| PatternUpdate::Outcome {
      match_type: a.match_type,
      accepted:   true,
      modified:   a.suggested_relation != Some(a.final_relation)
        || modified_people.contains(&a.person),
    });

    let rejected = input
      .shown
      .iter()
      .filter(|s| !accepted_people.contains(&s.person))
      .map(|s| PatternUpdate::Outcome {
        match_type: s.match_type,
        accepted:   false,
        modified:   false,
      });

    shown.chain(accepted).chain(rejected).collect()
  }
}
