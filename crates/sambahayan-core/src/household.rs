//! Household (family) records.
//!
//! A person is an active member of at most one household at a time, and the
//! head is never repeated in the member list. Members are never deleted;
//! removal flips `active` to `false`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  match_type::Relation,
  person::PersonRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseholdStatus {
  #[default]
  Active,
  Inactive,
}

/// A member row in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub person:          PersonRef,
  pub relation:        Relation,
  pub relation_detail: Option<String>,
  pub active:          bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
  pub household_id: Uuid,
  pub code:         String,
  pub head:         PersonRef,
  /// Ordered; inactive rows follow active ones.
  pub members:      Vec<Member>,
  pub status:       HouseholdStatus,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Household {
  pub fn active_members(&self) -> impl Iterator<Item = &Member> {
    self.members.iter().filter(|m| m.active)
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
  pub person:          PersonRef,
  pub relation:        Relation,
  #[serde(default)]
  pub relation_detail: Option<String>,
}

/// Input to [`crate::store::HouseholdStore::save_household`]. Saving with an
/// existing `code` replaces that household's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHousehold {
  pub code:    String,
  pub head:    PersonRef,
  pub members: Vec<NewMember>,
}

impl NewHousehold {
  /// Put the spouse first with relation `Asawa` unless already listed.
  pub fn with_spouse(mut self, spouse: Option<PersonRef>) -> Self {
    if let Some(spouse) = spouse
      && !self.members.iter().any(|m| m.person == spouse)
    {
      self.members.insert(0, NewMember {
        person:          spouse,
        relation:        Relation::Asawa,
        relation_detail: None,
      });
    }
    self
  }

  /// Checks that need no database access. Cross-household conflicts are
  /// checked by the store inside the save transaction.
  pub fn validate(&self) -> Result<()> {
    if self.code.trim().is_empty() {
      return Err(Error::EmptyHouseholdCode);
    }
    let mut seen = HashSet::new();
    for member in &self.members {
      if member.person == self.head {
        return Err(Error::HeadListedAsMember(self.head));
      }
      if !seen.insert(member.person) {
        return Err(Error::DuplicateMember(member.person));
      }
    }
    Ok(())
  }
}
