//! Contract for the optional external semantic filter, and the rules for
//! merging its verdicts into a ranked list.
//!
//! The filter is an enhancement only. The ranked list it refines is already
//! complete; callers drop to that list whenever the filter is slow or fails.

use std::{collections::HashMap, future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::{
  match_type::{MatchType, Relation, Tier},
  person::PersonRef,
  rank::CandidateSuggestion,
};

// ─── Wire types ──────────────────────────────────────────────────────────────

/// One candidate as presented to the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCandidate {
  pub person:             PersonRef,
  pub name:               String,
  pub match_type:         MatchType,
  pub suggested_relation: Option<Relation>,
  pub confidence:         u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
  pub head_name:   String,
  pub spouse_name: Option<String>,
  pub candidates:  Vec<FilterCandidate>,
}

/// The filter's decision about one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVerdict {
  pub person:             PersonRef,
  pub include:            bool,
  #[serde(default)]
  pub suggested_relation: Option<Relation>,
  #[serde(default)]
  pub reason:             Option<String>,
  #[serde(default)]
  pub confidence:         Option<u8>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

pub type FilterError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed so that implementations can be stored as `Arc<dyn SemanticFilter>`.
pub type FilterFuture<'a> =
  Pin<Box<dyn Future<Output = Result<Vec<FilterVerdict>, FilterError>> + Send + 'a>>;

/// An out-of-process classifier that narrows a ranked suggestion list.
pub trait SemanticFilter: Send + Sync {
  fn evaluate(&self, request: FilterRequest) -> FilterFuture<'_>;
}

// ─── Request building ────────────────────────────────────────────────────────

/// Build the request from the top `max_candidates` ranked suggestions.
pub fn build_request(
  head_name: &str,
  spouse_name: Option<&str>,
  ranked: &[CandidateSuggestion],
  max_candidates: usize,
) -> FilterRequest {
  FilterRequest {
    head_name:   head_name.to_owned(),
    spouse_name: spouse_name.map(str::to_owned),
    candidates:  ranked
      .iter()
      .take(max_candidates)
      .map(|s| FilterCandidate {
        person:             s.person,
        name:               s.display_name.clone(),
        match_type:         s.match_type,
        suggested_relation: s.suggested_relation,
        confidence:         s.confidence,
      })
      .collect(),
  }
}

// ─── Merging ─────────────────────────────────────────────────────────────────

/// Whether a candidate the filter did not evaluate is strong enough to keep.
pub fn meets_inclusion_floor(suggestion: &CandidateSuggestion, floor: u8) -> bool {
  let strong_enough = suggestion.tier == Tier::Strong
    || suggestion.learned_confidence.is_some_and(|c| c >= floor);
  match suggestion.match_type {
    MatchType::Spouse => true,
    MatchType::FatherMatch
    | MatchType::MotherMatch
    | MatchType::FatherAsawaInput
    | MatchType::MotherAsawaInput
    | MatchType::MiddleNameMotherMatch
    | MatchType::LastnameOnly => strong_enough,
  }
}

/// Apply filter verdicts to a ranked list, preserving its order.
///
/// - A candidate whose match type bypasses exclusion is always kept.
/// - An evaluated candidate is kept iff the verdict includes it; the verdict's
///   relation and reason are adopted when present.
/// - An unevaluated candidate is kept only if it meets the inclusion floor.
pub fn apply_verdicts(
  ranked: Vec<CandidateSuggestion>,
  verdicts: Vec<FilterVerdict>,
  inclusion_floor: u8,
) -> Vec<CandidateSuggestion> {
  let mut by_person: HashMap<PersonRef, FilterVerdict> =
    verdicts.into_iter().map(|v| (v.person, v)).collect();

  ranked
    .into_iter()
    .filter_map(|mut suggestion| {
      let verdict = by_person.remove(&suggestion.person);
      if suggestion.match_type.bypasses_exclusion() {
        return Some(suggestion);
      }
      match verdict {
        Some(v) if v.include => {
          if v.suggested_relation.is_some() {
            suggestion.suggested_relation = v.suggested_relation;
          }
          if let Some(reason) = v.reason.filter(|r| !r.trim().is_empty()) {
            suggestion.reason = format!("{}; {reason}", suggestion.reason);
          }
          suggestion.filter_confidence = v.confidence.map(|c| c.min(100));
          Some(suggestion)
        }
        Some(_) => None,
        None => meets_inclusion_floor(&suggestion, inclusion_floor).then_some(suggestion),
      }
    })
    .collect()
}
