//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! closed enums their `strum` string forms. Feedback lists are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sambahayan_core::{
  feedback::{FeedbackEvent, FeedbackInput},
  household::{Household, HouseholdStatus, Member},
  match_type::{MatchType, Relation},
  name,
  pattern::PatternStats,
  person::{Person, PersonName, PersonRef, Registry},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Decode any `strum`-backed enum column.
fn decode_enum<T: FromStr>(column: &'static str, value: &str) -> Result<T> {
  T::from_str(value).map_err(|_| Error::Decode {
    column,
    value: value.to_owned(),
  })
}

pub fn encode_registry(r: Registry) -> &'static str { r.into() }

pub fn decode_registry(s: &str) -> Result<Registry> { decode_enum("registry", s) }

pub fn encode_match_type(m: MatchType) -> &'static str { m.into() }

pub fn decode_match_type(s: &str) -> Result<MatchType> { decode_enum("match_type", s) }

pub fn decode_relation(s: &str) -> Result<Relation> { decode_enum("relation", s) }

pub fn encode_status(s: HouseholdStatus) -> &'static str {
  match s {
    HouseholdStatus::Active => "active",
    HouseholdStatus::Inactive => "inactive",
  }
}

pub fn decode_status(s: &str) -> Result<HouseholdStatus> {
  match s {
    "active" => Ok(HouseholdStatus::Active),
    "inactive" => Ok(HouseholdStatus::Inactive),
    other => Err(Error::Decode {
      column: "status",
      value:  other.to_owned(),
    }),
  }
}

/// Normalized lookup key for an optional name column.
pub fn name_key(value: Option<&str>) -> Option<String> {
  value.map(name::normalize).filter(|k| !k.is_empty())
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "registry, person_id, first_name, middle_name, last_name,
   classification, purok, grupo, father_name, mother_name";

/// Raw strings from a `persons` row, decoded outside the connection thread.
#[derive(Debug)]
pub struct RawPerson {
  pub registry:       String,
  pub person_id:      String,
  pub first_name:     String,
  pub middle_name:    Option<String>,
  pub last_name:      String,
  pub classification: Option<String>,
  pub purok:          Option<String>,
  pub grupo:          Option<String>,
  pub father_name:    Option<String>,
  pub mother_name:    Option<String>,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      registry:       row.get(0)?,
      person_id:      row.get(1)?,
      first_name:     row.get(2)?,
      middle_name:    row.get(3)?,
      last_name:      row.get(4)?,
      classification: row.get(5)?,
      purok:          row.get(6)?,
      grupo:          row.get(7)?,
      father_name:    row.get(8)?,
      mother_name:    row.get(9)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:             decode_uuid(&self.person_id)?,
      registry:       decode_registry(&self.registry)?,
      name:           PersonName {
        first:  self.first_name,
        middle: self.middle_name,
        last:   self.last_name,
      },
      classification: self.classification,
      purok:          self.purok,
      grupo:          self.grupo,
      father_name:    self.father_name,
      mother_name:    self.mother_name,
    })
  }
}

#[derive(Debug)]
pub struct RawMember {
  pub person_registry: String,
  pub person_id:       String,
  pub relation:        String,
  pub relation_detail: Option<String>,
  pub active:          bool,
}

impl RawMember {
  fn into_member(self) -> Result<Member> {
    Ok(Member {
      person:          PersonRef::new(
        decode_registry(&self.person_registry)?,
        decode_uuid(&self.person_id)?,
      ),
      relation:        decode_relation(&self.relation)?,
      relation_detail: self.relation_detail,
      active:          self.active,
    })
  }
}

#[derive(Debug)]
pub struct RawHousehold {
  pub household_id:  String,
  pub code:          String,
  pub head_registry: String,
  pub head_id:       String,
  pub status:        String,
  pub created_at:    String,
  pub updated_at:    String,
  pub members:       Vec<RawMember>,
}

impl RawHousehold {
  pub fn into_household(self) -> Result<Household> {
    Ok(Household {
      household_id: decode_uuid(&self.household_id)?,
      code:         self.code,
      head:         PersonRef::new(
        decode_registry(&self.head_registry)?,
        decode_uuid(&self.head_id)?,
      ),
      members:      self
        .members
        .into_iter()
        .map(RawMember::into_member)
        .collect::<Result<_>>()?,
      status:       decode_status(&self.status)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

#[derive(Debug)]
pub struct RawPattern {
  pub match_type:     String,
  pub total_shown:    i64,
  pub total_accepted: i64,
  pub total_modified: i64,
  pub updated_at:     String,
}

impl RawPattern {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_type:     row.get(0)?,
      total_shown:    row.get(1)?,
      total_accepted: row.get(2)?,
      total_modified: row.get(3)?,
      updated_at:     row.get(4)?,
    })
  }

  pub fn into_stats(self) -> Result<PatternStats> {
    // Counters are never decremented; a negative value is corruption.
    let count = |column: &'static str, v: i64| {
      u64::try_from(v).map_err(|_| Error::Decode {
        column,
        value: v.to_string(),
      })
    };
    Ok(PatternStats {
      match_type:     decode_match_type(&self.match_type)?,
      total_shown:    count("total_shown", self.total_shown)?,
      total_accepted: count("total_accepted", self.total_accepted)?,
      total_modified: count("total_modified", self.total_modified)?,
      updated_at:     Some(decode_dt(&self.updated_at)?),
    })
  }
}

#[derive(Debug)]
pub struct RawFeedback {
  pub event_id:      String,
  pub household_id:  String,
  pub recorded_at:   String,
  pub shown_json:    String,
  pub accepted_json: String,
  pub modified_json: String,
}

impl RawFeedback {
  pub fn into_event(self) -> Result<FeedbackEvent> {
    Ok(FeedbackEvent {
      event_id:     decode_uuid(&self.event_id)?,
      household_id: decode_uuid(&self.household_id)?,
      recorded_at:  decode_dt(&self.recorded_at)?,
      input:        FeedbackInput {
        shown:    serde_json::from_str(&self.shown_json)?,
        accepted: serde_json::from_str(&self.accepted_json)?,
        modified: serde_json::from_str(&self.modified_json)?,
      },
    })
  }
}
