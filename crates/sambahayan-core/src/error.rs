//! Error types for `sambahayan-core`.

use thiserror::Error;

use crate::person::PersonRef;

#[derive(Debug, Error)]
pub enum Error {
  #[error("household code must not be empty")]
  EmptyHouseholdCode,

  #[error("household head {0} is also listed as a member")]
  HeadListedAsMember(PersonRef),

  #[error("person {0} is listed more than once")]
  DuplicateMember(PersonRef),

  #[error("person {person} already belongs to active household {household_code:?}")]
  MemberConflict {
    person:         PersonRef,
    household_code: String,
  },

  #[error("invalid person reference: {0:?}")]
  InvalidPersonRef(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
