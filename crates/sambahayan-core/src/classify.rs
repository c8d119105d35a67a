//! Rule-based relationship classification.
//!
//! The tier is a pure function of the match type and location equality with
//! the head. Learned statistics are blended in later by [`crate::rank`].

use serde::Serialize;

use crate::{
  match_type::{MatchType, Tier},
  person::Person,
};

/// A raw hit produced by candidate generation, before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
  pub person:     Person,
  pub match_type: MatchType,
  /// Short human-readable explanation of the match path.
  pub reason:     String,
}

/// Assign the rule tier for `match_type` given whether the candidate shares
/// both purok and grupo with the head.
pub fn tier_for(match_type: MatchType, location_match: bool) -> Tier {
  match match_type {
    MatchType::Spouse | MatchType::FatherMatch | MatchType::MotherMatch => {
      Tier::Strong
    }
    MatchType::MiddleNameMotherMatch
    | MatchType::FatherAsawaInput
    | MatchType::MotherAsawaInput => Tier::Moderate,
    MatchType::LastnameOnly if location_match => Tier::Moderate,
    MatchType::LastnameOnly => Tier::Weak,
  }
}

/// Classify a candidate against the household head.
pub fn classify(candidate: &Candidate, head: &Person) -> Tier {
  tier_for(candidate.match_type, candidate.person.shares_location(head))
}
