//! Candidate generation: find probable family members of the seeds across
//! every registry.
//!
//! Generation is request-scoped and read-only. A registry that fails to
//! answer is logged and skipped; the remaining registries still contribute.

use std::{collections::HashMap, fmt::Display, future::Future};

use sambahayan_core::{
  classify::Candidate,
  match_type::MatchType,
  name,
  person::{Person, PersonName, PersonRef, Registry},
  store::PersonDirectory,
};
use strum::IntoEnumIterator as _;

/// The spouse seed: either a registry record or a free-text name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpouseSeed {
  Registered(Person),
  Named(PersonName),
}

impl SpouseSeed {
  pub fn name(&self) -> &PersonName {
    match self {
      Self::Registered(p) => &p.name,
      Self::Named(n) => n,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seeds {
  pub head:   Person,
  pub spouse: Option<SpouseSeed>,
}

impl Seeds {
  /// A seed is usable when its surname survives normalization.
  pub fn is_usable(&self) -> bool {
    self.head.name.surname_key().is_some()
      && self
        .spouse
        .as_ref()
        .is_none_or(|s| s.name().surname_key().is_some())
  }
}

/// Run a registry query, degrading a failure to "no hits".
async fn lookup<E: Display>(
  query: impl Future<Output = Result<Vec<Person>, E>>,
  registry: Registry,
  what: &'static str,
) -> Vec<Person> {
  match query.await {
    Ok(hits) => hits,
    Err(e) => {
      tracing::warn!(%registry, lookup = what, error = %e, "registry unavailable; skipping");
      Vec::new()
    }
  }
}

/// Collects hits, keeping only the highest-priority match per person.
#[derive(Default)]
struct CandidateSet {
  order: Vec<PersonRef>,
  best:  HashMap<PersonRef, Candidate>,
}

impl CandidateSet {
  fn offer(&mut self, person: Person, match_type: MatchType, reason: String) {
    let key = person.person_ref();
    match self.best.get_mut(&key) {
      Some(existing) => {
        if match_type.priority() > existing.match_type.priority() {
          existing.match_type = match_type;
          existing.reason = reason;
        }
      }
      None => {
        self.order.push(key);
        self.best.insert(key, Candidate { person, match_type, reason });
      }
    }
  }

  fn into_candidates(mut self, exclude: PersonRef) -> Vec<Candidate> {
    self
      .order
      .into_iter()
      .filter(|key| *key != exclude)
      .filter_map(|key| self.best.remove(&key))
      .collect()
  }
}

/// Which parent field of `person` names someone with one of `forms`.
fn parent_match(person: &Person, forms: &[String]) -> (bool, bool) {
  let matches = |field: &Option<String>| {
    field
      .as_deref()
      .map(name::normalize)
      .is_some_and(|key| forms.contains(&key))
  };
  (matches(&person.father_name), matches(&person.mother_name))
}

/// Produce the deduplicated candidate list for `seeds`.
///
/// Returns an empty list when a seed has no usable surname. The head never
/// appears in the output.
pub async fn generate<D: PersonDirectory>(directory: &D, seeds: &Seeds) -> Vec<Candidate> {
  if !seeds.is_usable() {
    return Vec::new();
  }
  let head = &seeds.head;
  let Some(head_surname) = head.name.surname_key() else {
    return Vec::new();
  };
  let head_forms = head.name.comparable_forms();
  let spouse_surname = seeds.spouse.as_ref().and_then(|s| s.name().surname_key());
  let spouse_forms = seeds
    .spouse
    .as_ref()
    .map(|s| s.name().comparable_forms())
    .unwrap_or_default();

  let mut set = CandidateSet::default();

  if let Some(SpouseSeed::Registered(spouse)) = &seeds.spouse {
    set.offer(spouse.clone(), MatchType::Spouse, "selected as spouse".into());
  }

  for registry in Registry::iter() {
    let hits = lookup(
      directory.search_by_surname(registry, &head_surname),
      registry,
      "head surname",
    )
    .await;
    for person in hits {
      set.offer(
        person,
        MatchType::LastnameOnly,
        format!("shares the head's surname \"{head_surname}\""),
      );
    }

    if let Some(spouse_surname) = &spouse_surname {
      let hits = lookup(
        directory.search_by_surname(registry, spouse_surname),
        registry,
        "spouse surname",
      )
      .await;
      for person in hits {
        if person.name.middle_key().as_ref() == Some(spouse_surname) {
          set.offer(
            person,
            MatchType::MiddleNameMotherMatch,
            format!("middle name is the spouse's surname \"{spouse_surname}\""),
          );
        } else {
          set.offer(
            person,
            MatchType::LastnameOnly,
            format!("shares the spouse's surname \"{spouse_surname}\""),
          );
        }
      }
    }

    if !registry.has_parent_names() {
      continue;
    }

    for form in &head_forms {
      let hits = lookup(
        directory.find_by_parent_name(registry, form),
        registry,
        "head as parent",
      )
      .await;
      for person in hits {
        match parent_match(&person, &head_forms) {
          (true, _) => set.offer(
            person,
            MatchType::FatherMatch,
            "father's name is the head".into(),
          ),
          (false, true) => set.offer(
            person,
            MatchType::MotherMatch,
            "mother's name is the head".into(),
          ),
          (false, false) => {}
        }
      }
    }

    for form in &spouse_forms {
      let hits = lookup(
        directory.find_by_parent_name(registry, form),
        registry,
        "spouse as parent",
      )
      .await;
      for person in hits {
        match parent_match(&person, &spouse_forms) {
          (true, _) => set.offer(
            person,
            MatchType::FatherAsawaInput,
            "father's name is the spouse".into(),
          ),
          (false, true) => set.offer(
            person,
            MatchType::MotherAsawaInput,
            "mother's name is the spouse".into(),
          ),
          (false, false) => {}
        }
      }
    }
  }

  let candidates = set.into_candidates(head.person_ref());
  tracing::debug!(
    head = %head.person_ref(),
    count = candidates.len(),
    "generated candidates"
  );
  candidates
}
