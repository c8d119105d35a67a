//! Storage traits consumed by the engine.
//!
//! Implemented by storage backends (e.g. `sambahayan-store-sqlite`). The
//! engine and API depend on these abstractions, not on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{collections::HashSet, future::Future};

use uuid::Uuid;

use crate::{
  feedback::FeedbackEvent,
  household::{Household, NewHousehold},
  match_type::MatchType,
  pattern::{LearnedConfidence, PatternStats},
  person::{Person, PersonRef, Registry},
};

// ─── Registry adapter ────────────────────────────────────────────────────────

/// Uniform read access to the person registries.
///
/// Returned records are already decrypted. Name arguments are normalized by
/// the caller with [`crate::name::normalize`].
pub trait PersonDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one person. Returns `None` if not found.
  fn get_person(
    &self,
    person: PersonRef,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// People in `registry` whose last or middle name equals `surname`.
  fn search_by_surname<'a>(
    &'a self,
    registry: Registry,
    surname: &'a str,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;

  /// People in `registry` whose father or mother name equals `name`.
  /// Always empty for registries without parent-name fields.
  fn find_by_parent_name<'a>(
    &'a self,
    registry: Registry,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;
}

// ─── Households ──────────────────────────────────────────────────────────────

pub trait HouseholdStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create or update (by `code`) a household and its member list in one
  /// transaction. Members missing from the new list are deactivated.
  ///
  /// Fails without writing anything if any listed person is the head or an
  /// active member of a different household.
  fn save_household(
    &self,
    input: NewHousehold,
  ) -> impl Future<Output = Result<Household, Self::Error>> + Send + '_;

  fn get_household(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Household>, Self::Error>> + Send + '_;

  fn find_household_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Household>, Self::Error>> + Send + 'a;

  /// The subset of `people` who head or actively belong to an active
  /// household, ignoring the household with code `except_code`.
  fn assigned_persons<'a>(
    &'a self,
    people: &'a [PersonRef],
    except_code: Option<&'a str>,
  ) -> impl Future<Output = Result<HashSet<PersonRef>, Self::Error>> + Send + 'a;
}

// ─── Learned patterns ────────────────────────────────────────────────────────

/// Aggregate acceptance statistics plus the append-only feedback log.
///
/// Every counter mutation must be a single atomic increment in the backing
/// store; concurrent saves must never lose updates.
pub trait PatternStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn record_shown(
    &self,
    match_type: MatchType,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_outcome(
    &self,
    match_type: MatchType,
    accepted: bool,
    modified: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Counters for one match type. Returns `None` if never recorded.
  fn stats(
    &self,
    match_type: MatchType,
  ) -> impl Future<Output = Result<Option<PatternStats>, Self::Error>> + Send + '_;

  fn all_stats(
    &self,
  ) -> impl Future<Output = Result<Vec<PatternStats>, Self::Error>> + Send + '_;

  /// Append a feedback event. Events are never updated or deleted.
  fn append_feedback(
    &self,
    event: FeedbackEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Learned confidence, or `None` when fewer than `min_samples` shows have
  /// been recorded.
  fn get_confidence(
    &self,
    match_type: MatchType,
    min_samples: u64,
  ) -> impl Future<Output = Result<Option<LearnedConfidence>, Self::Error>> + Send + '_
  {
    async move {
      Ok(
        self
          .stats(match_type)
          .await?
          .and_then(|s| s.confidence(min_samples)),
      )
    }
  }
}
