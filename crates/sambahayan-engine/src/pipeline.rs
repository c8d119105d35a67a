//! The two-stage suggestion pipeline and the household save operation.
//!
//! Stage one ([`Engine::suggest`]) is always complete on its own: rule tiers
//! blended with learned confidence. Stage two ([`Engine::refine`]) is an
//! optional pass through an external semantic filter. It is bounded by a
//! timeout, cancelled by dropping its future, and any failure leaves the
//! stage-one list unchanged.

use std::{collections::HashSet, sync::Arc};

use sambahayan_core::{
  classify::Candidate,
  feedback::{FeedbackEvent, FeedbackInput},
  filter::{SemanticFilter, apply_verdicts, build_request},
  household::{Household, NewHousehold, NewMember},
  name,
  pattern::{LearnedTable, PatternSummary},
  person::{Person, PersonRef},
  rank::{CandidateSuggestion, rank},
  store::{HouseholdStore, PatternStore, PersonDirectory},
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::{
  EngineConfig, Error, Result,
  feedback::{FeedbackRecorder, FeedbackReport},
  generate::{Seeds, SpouseSeed, generate},
};

/// Everything the engine needs from storage.
pub trait Backend: PersonDirectory + HouseholdStore + PatternStore + 'static {}

impl<T> Backend for T where T: PersonDirectory + HouseholdStore + PatternStore + 'static {}

// ─── Requests and responses ──────────────────────────────────────────────────

/// How the caller identifies the spouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpouseInput {
  /// Picked from a registry; becomes a `SPOUSE` candidate.
  Registered(PersonRef),
  /// Typed in as free text; only used as a search seed.
  Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
  pub head:           PersonRef,
  #[serde(default)]
  pub spouse:         Option<SpouseInput>,
  /// The household being edited, if any; its own members are not excluded.
  #[serde(default)]
  pub household_code: Option<String>,
}

/// Stage-one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
  pub head_name:   String,
  pub spouse_name: Option<String>,
  pub suggestions: Vec<CandidateSuggestion>,
  /// Learned-pattern snapshot the ranking was computed from.
  pub patterns:    Vec<PatternSummary>,
}

/// Stage-two result. `refined` is false when the filter was absent, failed,
/// or timed out, in which case `suggestions` is the stage-one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refined {
  #[serde(flatten)]
  pub suggestions: Suggestions,
  pub refined:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
  pub code:     String,
  pub head:     PersonRef,
  #[serde(default)]
  pub spouse:   Option<PersonRef>,
  pub members:  Vec<NewMember>,
  #[serde(default)]
  pub feedback: FeedbackInput,
}

/// A committed save. `feedback` resolves once the learned-pattern updates
/// have been applied; callers may ignore it.
#[derive(Debug)]
pub struct SaveOutcome {
  pub household: Household,
  pub feedback:  JoinHandle<FeedbackReport>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine<S> {
  store:  Arc<S>,
  filter: Option<Arc<dyn SemanticFilter>>,
  config: EngineConfig,
}

impl<S: Backend> Engine<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    Self {
      store,
      filter: None,
      config,
    }
  }

  /// Enable stage two with `filter`.
  pub fn with_filter(mut self, filter: Arc<dyn SemanticFilter>) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  // ── Stage one ─────────────────────────────────────────────────────────────

  /// Generate, exclude, and rank suggestions for a household head.
  ///
  /// A head or spouse without a usable name yields an empty list rather than
  /// an error.
  pub async fn suggest(&self, request: &SuggestRequest) -> Result<Suggestions> {
    let head = self.fetch_person(request.head).await?.ok_or(Error::HeadNotFound(request.head))?;

    let (spouse, spouse_name) = match &request.spouse {
      None => (None, None),
      Some(SpouseInput::Registered(r)) => {
        let person = self.fetch_person(*r).await?.ok_or(Error::SpouseNotFound(*r))?;
        let display = person.display_name();
        (Some(Ok(SpouseSeed::Registered(person))), Some(display))
      }
      Some(SpouseInput::Named(raw)) if raw.trim().is_empty() => (None, None),
      Some(SpouseInput::Named(raw)) => {
        let parsed = name::parse_full_name(raw).map(SpouseSeed::Named).ok_or(());
        (Some(parsed), Some(raw.trim().to_owned()))
      }
    };

    let learned = self.learned_table().await;
    let mut response = Suggestions {
      head_name: head.display_name(),
      spouse_name,
      suggestions: Vec::new(),
      patterns: learned.summary(self.config.ranking.min_samples),
    };

    let spouse = match spouse.transpose() {
      Ok(spouse) => spouse,
      Err(()) => {
        tracing::info!(head = %request.head, "spouse name unusable; no suggestions");
        return Ok(response);
      }
    };
    let seeds = Seeds { head, spouse };
    if !seeds.is_usable() {
      tracing::info!(head = %request.head, "seed name unusable; no suggestions");
      return Ok(response);
    }

    let candidates = generate(&*self.store, &seeds).await;
    let candidates = self
      .exclude_assigned(candidates, request.household_code.as_deref())
      .await;
    response.suggestions = rank(candidates, &seeds.head, &learned, &self.config.ranking);

    tracing::info!(
      head = %request.head,
      suggestions = response.suggestions.len(),
      "ranked household suggestions"
    );
    Ok(response)
  }

  /// Stage one followed by stage two.
  pub async fn suggest_refined(&self, request: &SuggestRequest) -> Result<Refined> {
    let stage_one = self.suggest(request).await?;
    Ok(self.refine(stage_one).await)
  }

  // ── Stage two ─────────────────────────────────────────────────────────────

  /// Narrow a stage-one list through the semantic filter, if configured.
  ///
  /// Never fails: a slow, failing, or absent filter returns the input
  /// unchanged with `refined: false`.
  pub async fn refine(&self, stage_one: Suggestions) -> Refined {
    let unchanged = |suggestions: Suggestions| Refined {
      suggestions,
      refined: false,
    };
    let Some(filter) = &self.filter else {
      return unchanged(stage_one);
    };
    if stage_one.suggestions.is_empty() {
      return unchanged(stage_one);
    }

    let request = build_request(
      &stage_one.head_name,
      stage_one.spouse_name.as_deref(),
      &stage_one.suggestions,
      self.config.filter.max_candidates,
    );

    match tokio::time::timeout(self.config.filter.timeout(), filter.evaluate(request)).await {
      Ok(Ok(verdicts)) => {
        let before = stage_one.suggestions.len();
        let Suggestions {
          head_name,
          spouse_name,
          suggestions,
          patterns,
        } = stage_one;
        let suggestions = apply_verdicts(suggestions, verdicts, self.config.inclusion_floor);
        tracing::debug!(before, after = suggestions.len(), "applied semantic filter");
        Refined {
          suggestions: Suggestions {
            head_name,
            spouse_name,
            suggestions,
            patterns,
          },
          refined:     true,
        }
      }
      Ok(Err(e)) => {
        tracing::warn!(error = %e, "semantic filter failed; keeping ranked list");
        unchanged(stage_one)
      }
      Err(_) => {
        tracing::warn!(
          timeout_ms = self.config.filter.timeout_ms,
          "semantic filter timed out; keeping ranked list"
        );
        unchanged(stage_one)
      }
    }
  }

  // ── Save ──────────────────────────────────────────────────────────────────

  /// Commit a household, then record feedback in the background.
  ///
  /// Only the household write can fail the call. Feedback is retried and
  /// logged but can never undo a committed save.
  pub async fn save_family(&self, request: SaveRequest) -> Result<SaveOutcome> {
    self
      .fetch_person(request.head)
      .await?
      .ok_or(Error::HeadNotFound(request.head))?;

    let input = NewHousehold {
      code:    request.code.trim().to_owned(),
      head:    request.head,
      members: request.members,
    }
    .with_spouse(request.spouse);
    input.validate()?;

    let household = self
      .store
      .save_household(input)
      .await
      .map_err(|e| Error::SaveTransaction(Box::new(e)))?;

    tracing::info!(
      household_id = %household.household_id,
      code = %household.code,
      members = household.active_members().count(),
      "household saved"
    );

    let event = FeedbackEvent::new(household.household_id, request.feedback);
    let recorder = FeedbackRecorder::new(self.store.clone(), self.config.feedback.clone());
    let feedback = tokio::spawn(async move { recorder.record(event).await });

    Ok(SaveOutcome { household, feedback })
  }

  pub async fn get_household(&self, id: uuid::Uuid) -> Result<Option<Household>> {
    self
      .store
      .get_household(id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }

  /// Current learned-pattern summary.
  pub async fn pattern_summary(&self) -> Result<Vec<PatternSummary>> {
    let stats = self
      .store
      .all_stats()
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    Ok(LearnedTable::new(stats).summary(self.config.ranking.min_samples))
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch_person(&self, person: PersonRef) -> Result<Option<Person>> {
    self
      .store
      .get_person(person)
      .await
      .map_err(|e| Error::Directory(Box::new(e)))
  }

  /// Snapshot of the pattern store. Unreadable statistics degrade to rule
  /// tiers only.
  async fn learned_table(&self) -> LearnedTable {
    match self.store.all_stats().await {
      Ok(stats) => LearnedTable::new(stats),
      Err(e) => {
        tracing::warn!(error = %e, "learned patterns unavailable; ranking on rule tiers");
        LearnedTable::default()
      }
    }
  }

  /// Drop candidates who already belong to another household, except those
  /// whose match type bypasses exclusion.
  async fn exclude_assigned(
    &self,
    candidates: Vec<Candidate>,
    household_code: Option<&str>,
  ) -> Vec<Candidate> {
    if !self.config.exclude_assigned || candidates.is_empty() {
      return candidates;
    }
    let people: Vec<PersonRef> = candidates.iter().map(|c| c.person.person_ref()).collect();
    let assigned: HashSet<PersonRef> =
      match self.store.assigned_persons(&people, household_code).await {
        Ok(assigned) => assigned,
        Err(e) => {
          tracing::warn!(error = %e, "household lookup failed; not excluding assigned persons");
          return candidates;
        }
      };

    candidates
      .into_iter()
      .filter(|c| c.match_type.bypasses_exclusion() || !assigned.contains(&c.person.person_ref()))
      .collect()
  }
}
