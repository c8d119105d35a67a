//! The confidence ranker: blends rule tiers with learned confidence and
//! produces the deterministic, deduplicated suggestion list.

use std::collections::{HashMap, hash_map::Entry};

use serde::{Deserialize, Serialize};

use crate::{
  classify::{Candidate, classify},
  match_type::{MatchType, Relation, Tier},
  name,
  pattern::LearnedTable,
  person::{Person, PersonRef},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Fixed score per rule tier, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierScores {
  pub strong:   u8,
  pub moderate: u8,
  pub weak:     u8,
}

impl Default for TierScores {
  fn default() -> Self {
    Self {
      strong:   90,
      moderate: 65,
      weak:     30,
    }
  }
}

impl TierScores {
  pub fn score(&self, tier: Tier) -> u8 {
    let raw = match tier {
      Tier::Strong => self.strong,
      Tier::Moderate => self.moderate,
      Tier::Weak => self.weak,
    };
    raw.min(100)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
  pub tier_scores: TierScores,
  /// Minimum `total_shown` before a learned confidence is trusted.
  pub min_samples: u64,
}

impl Default for RankingConfig {
  fn default() -> Self {
    Self {
      tier_scores: TierScores::default(),
      min_samples: 5,
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One ranked suggestion returned to the caller. Generated per request and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSuggestion {
  pub person:             PersonRef,
  pub display_name:       String,
  pub match_type:         MatchType,
  pub suggested_relation: Option<Relation>,
  pub tier:               Tier,
  pub rule_confidence:    u8,
  pub learned_confidence: Option<u8>,
  pub sample_size:        u64,
  /// `max(rule, learned)` when learned data is trusted, else the rule score.
  pub confidence:         u8,
  pub reason:             String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter_confidence:  Option<u8>,
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// Score, deduplicate and order `candidates`.
///
/// A person hit by several rules keeps the highest-priority match type; equal
/// priorities keep the earliest hit.
///
/// Ties on confidence fall back to registry priority, then the normalized
/// name, then the id, so identical inputs always produce identical output.
pub fn rank(
  candidates: Vec<Candidate>,
  head: &Person,
  learned: &LearnedTable,
  config: &RankingConfig,
) -> Vec<CandidateSuggestion> {
  let mut best: HashMap<PersonRef, Candidate> = HashMap::new();
  for c in candidates {
    match best.entry(c.person.person_ref()) {
      Entry::Vacant(slot) => {
        slot.insert(c);
      }
      Entry::Occupied(mut slot) => {
        if c.match_type.priority() > slot.get().match_type.priority() {
          slot.insert(c);
        }
      }
    }
  }

  let mut scored: Vec<(String, CandidateSuggestion)> = best
    .into_values()
    .map(|c| {
      let tier = classify(&c, head);
      let rule_confidence = config.tier_scores.score(tier);
      let learned_confidence = learned
        .confidence(c.match_type, config.min_samples)
        .map(|l| l.percent);
      let confidence = learned_confidence
        .map_or(rule_confidence, |l| l.max(rule_confidence))
        .min(100);

      let suggestion = CandidateSuggestion {
        person: c.person.person_ref(),
        display_name: c.person.display_name(),
        match_type: c.match_type,
        suggested_relation: c.match_type.default_relation(),
        tier,
        rule_confidence,
        learned_confidence,
        sample_size: learned.sample_size(c.match_type),
        confidence,
        reason: c.reason,
        filter_confidence: None,
      };
      (name::normalize(&suggestion.display_name), suggestion)
    })
    .collect();

  scored.sort_by(|(a_name, a), (b_name, b)| {
    b.confidence
      .cmp(&a.confidence)
      .then_with(|| a.person.registry.priority().cmp(&b.person.registry.priority()))
      .then_with(|| a_name.cmp(b_name))
      .then_with(|| a.person.id.cmp(&b.person.id))
  });

  scored.into_iter().map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    pattern::PatternStats,
    person::{PersonName, Registry},
  };

  fn person(registry: Registry, first: &str, last: &str, purok: Option<&str>) -> Person {
    Person {
      id: Uuid::new_v4(),
      registry,
      name: PersonName {
        first:  first.into(),
        middle: None,
        last:   last.into(),
      },
      classification: None,
      purok: purok.map(Into::into),
      grupo: purok.map(|_| "G1".to_string()),
      father_name: None,
      mother_name: None,
    }
  }

  fn candidate(person: Person, match_type: MatchType) -> Candidate {
    Candidate {
      person,
      match_type,
      reason: String::new(),
    }
  }

  #[test]
  fn rule_scores_without_learned_data() {
    let head = person(Registry::Tarheta, "Juan", "Reyes", Some("P1"));
    let ranked = rank(
      vec![
        candidate(person(Registry::Tarheta, "Ben", "Reyes", None), MatchType::LastnameOnly),
        candidate(person(Registry::Hdb, "Ana", "Reyes", None), MatchType::FatherMatch),
        candidate(person(Registry::Pnk, "Lia", "Reyes", Some("P1")), MatchType::LastnameOnly),
      ],
      &head,
      &LearnedTable::default(),
      &RankingConfig::default(),
    );

    let confidences: Vec<u8> = ranked.iter().map(|s| s.confidence).collect();
    assert_eq!(confidences, vec![90, 65, 30]);
    assert_eq!(ranked[0].suggested_relation, Some(Relation::Anak));
    assert_eq!(ranked[1].tier, Tier::Moderate);
    assert!(ranked.iter().all(|s| s.learned_confidence.is_none()));
  }

  #[test]
  fn learned_confidence_only_raises() {
    let head = person(Registry::Tarheta, "Juan", "Reyes", None);
    let learned = LearnedTable::new([
      PatternStats {
        total_shown: 20,
        total_accepted: 2,
        ..PatternStats::empty(MatchType::FatherMatch)
      },
      PatternStats {
        total_shown: 20,
        total_accepted: 19,
        ..PatternStats::empty(MatchType::LastnameOnly)
      },
    ]);
    let ranked = rank(
      vec![
        candidate(person(Registry::Tarheta, "Ana", "Reyes", None), MatchType::FatherMatch),
        candidate(person(Registry::Tarheta, "Ben", "Reyes", None), MatchType::LastnameOnly),
      ],
      &head,
      &learned,
      &RankingConfig::default(),
    );

    assert_eq!(ranked[0].match_type, MatchType::LastnameOnly);
    assert_eq!(ranked[0].confidence, 95);
    assert_eq!(ranked[1].confidence, 90);
    assert_eq!(ranked[1].learned_confidence, Some(10));
    assert_eq!(ranked[1].sample_size, 20);
  }

  #[test]
  fn ties_break_on_registry_then_name() {
    let head = person(Registry::Tarheta, "Juan", "Reyes", None);
    let ranked = rank(
      vec![
        candidate(person(Registry::Pnk, "Abe", "Reyes", None), MatchType::LastnameOnly),
        candidate(person(Registry::Tarheta, "Zed", "Reyes", None), MatchType::LastnameOnly),
        candidate(person(Registry::Tarheta, "Ámy", "Reyes", None), MatchType::LastnameOnly),
      ],
      &head,
      &LearnedTable::default(),
      &RankingConfig::default(),
    );
    let names: Vec<&str> = ranked.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ámy Reyes", "Zed Reyes", "Abe Reyes"]);
  }

  #[test]
  fn repeated_person_is_ranked_once() {
    let head = person(Registry::Tarheta, "Juan", "Reyes", None);
    let p = person(Registry::Hdb, "Ana", "Reyes", None);
    let ranked = rank(
      vec![
        candidate(p.clone(), MatchType::FatherMatch),
        candidate(p, MatchType::LastnameOnly),
      ],
      &head,
      &LearnedTable::default(),
      &RankingConfig::default(),
    );
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].match_type, MatchType::FatherMatch);
  }

  #[test]
  fn repeated_person_keeps_highest_priority_match() {
    let head = person(Registry::Tarheta, "Juan", "Reyes", None);
    let p = person(Registry::Hdb, "Ana", "Reyes", None);
    let ranked = rank(
      vec![
        candidate(p.clone(), MatchType::LastnameOnly),
        candidate(p.clone(), MatchType::MiddleNameMotherMatch),
        candidate(p, MatchType::FatherMatch),
      ],
      &head,
      &LearnedTable::default(),
      &RankingConfig::default(),
    );
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].match_type, MatchType::FatherMatch);
    assert_eq!(ranked[0].tier, Tier::Strong);
    assert_eq!(ranked[0].confidence, 90);
    assert_eq!(ranked[0].suggested_relation, Some(Relation::Anak));
  }
}
