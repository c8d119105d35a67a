//! Person records as read from the independent registries.
//!
//! Records arrive already decrypted from the registry adapters. The engine
//! only reads them; nothing here is ever written back to a registry.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, name};

// ─── Registry ────────────────────────────────────────────────────────────────

/// An independent source-of-truth store for one category of person records.
///
/// Declaration order is the fixed tie-break priority used by the ranker.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Registry {
  /// Main membership cards of baptised members.
  Tarheta,
  /// Children dedicated but not yet baptised.
  Hdb,
  /// Youth registry.
  Pnk,
}

impl Registry {
  /// Tie-break rank; lower sorts first.
  pub fn priority(self) -> u8 {
    match self {
      Self::Tarheta => 0,
      Self::Hdb => 1,
      Self::Pnk => 2,
    }
  }

  /// Whether records in this registry carry `father_name`/`mother_name`.
  pub fn has_parent_names(self) -> bool {
    match self {
      Self::Tarheta => false,
      Self::Hdb | Self::Pnk => true,
    }
  }
}

// ─── PersonRef ───────────────────────────────────────────────────────────────

/// A registry-qualified person identifier. Ids are only unique within their
/// registry, so the pair is the identity used for deduplication.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PersonRef {
  pub registry: Registry,
  pub id:       Uuid,
}

impl PersonRef {
  pub fn new(registry: Registry, id: Uuid) -> Self { Self { registry, id } }
}

impl fmt::Display for PersonRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.registry, self.id)
  }
}

impl FromStr for PersonRef {
  type Err = Error;

  /// Parses the `registry:uuid` form produced by `Display`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidPersonRef(s.to_owned());
    let (registry, id) = s.split_once(':').ok_or_else(invalid)?;
    let registry = Registry::from_str(registry).map_err(|_| invalid())?;
    let id = Uuid::parse_str(id).map_err(|_| invalid())?;
    Ok(Self { registry, id })
  }
}

// ─── Names ───────────────────────────────────────────────────────────────────

/// A structured name. `middle` carries the mother's maiden surname by
/// Filipino convention, which the generator relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
  pub first:  String,
  #[serde(default)]
  pub middle: Option<String>,
  pub last:   String,
}

impl PersonName {
  /// "First Middle Last", skipping an empty middle name.
  pub fn display(&self) -> String {
    [Some(self.first.as_str()), self.middle.as_deref(), Some(self.last.as_str())]
      .into_iter()
      .flatten()
      .map(str::trim)
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Normalized surname, or `None` when it is blank.
  pub fn surname_key(&self) -> Option<String> { non_empty(name::normalize(&self.last)) }

  /// Normalized middle name, or `None` when absent or blank.
  pub fn middle_key(&self) -> Option<String> {
    self.middle.as_deref().map(name::normalize).and_then(non_empty)
  }

  /// Every normalized form under which this person might be written down as
  /// someone's parent: "first last", "first middle last" and
  /// "first m last".
  pub fn comparable_forms(&self) -> Vec<String> {
    let first = name::normalize(&self.first);
    let Some(last) = self.surname_key() else {
      return Vec::new();
    };
    if first.is_empty() {
      return Vec::new();
    }

    let mut forms = vec![format!("{first} {last}")];
    if let Some(middle) = self.middle_key() {
      forms.push(format!("{first} {middle} {last}"));
      if let Some(initial) = middle.chars().next() {
        forms.push(format!("{first} {initial} {last}"));
      }
    }
    forms
  }
}

fn non_empty(s: String) -> Option<String> { (!s.is_empty()).then_some(s) }

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person record from one of the registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:             Uuid,
  pub registry:       Registry,
  pub name:           PersonName,
  /// Kapisanan, the sub-organization the person belongs to.
  #[serde(default)]
  pub classification: Option<String>,
  #[serde(default)]
  pub purok:          Option<String>,
  #[serde(default)]
  pub grupo:          Option<String>,
  #[serde(default)]
  pub father_name:    Option<String>,
  #[serde(default)]
  pub mother_name:    Option<String>,
}

impl Person {
  pub fn person_ref(&self) -> PersonRef { PersonRef::new(self.registry, self.id) }

  pub fn display_name(&self) -> String { self.name.display() }

  /// True when both purok and grupo are set on both records and equal after
  /// normalization.
  pub fn shares_location(&self, other: &Person) -> bool {
    fn key(value: &Option<String>) -> Option<String> {
      value.as_deref().map(name::normalize).and_then(non_empty)
    }
    match (
      key(&self.purok),
      key(&self.grupo),
      key(&other.purok),
      key(&other.grupo),
    ) {
      (Some(p1), Some(g1), Some(p2), Some(g2)) => p1 == p2 && g1 == g2,
      _ => false,
    }
  }
}
