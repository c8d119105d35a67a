//! The closed set of match hypotheses, confidence tiers and relation labels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ─── MatchType ───────────────────────────────────────────────────────────────

/// How a candidate was reached from the household seeds. The string form
/// (`FATHER_MATCH`, ...) is also the learned-pattern key.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
  /// The spouse seed itself, picked from a registry.
  Spouse,
  /// `father_name` equals the head's full name.
  FatherMatch,
  /// `mother_name` equals the head's full name.
  MotherMatch,
  /// `father_name` equals the spouse's full name.
  FatherAsawaInput,
  /// `mother_name` equals the spouse's full name.
  MotherAsawaInput,
  /// Middle name equals the spouse's (maiden) surname.
  MiddleNameMotherMatch,
  /// Shares a surname with a seed and nothing more.
  LastnameOnly,
}

impl MatchType {
  /// Rank used when one person is reached through several paths; the highest
  /// value wins.
  pub fn priority(self) -> u8 {
    match self {
      Self::Spouse => 4,
      Self::FatherMatch | Self::MotherMatch => 3,
      Self::FatherAsawaInput | Self::MotherAsawaInput => 2,
      Self::MiddleNameMotherMatch => 1,
      Self::LastnameOnly => 0,
    }
  }

  /// The relation pre-filled for the user. `None` leaves it to the user.
  pub fn default_relation(self) -> Option<Relation> {
    match self {
      Self::Spouse => Some(Relation::Asawa),
      Self::FatherMatch
      | Self::MotherMatch
      | Self::FatherAsawaInput
      | Self::MotherAsawaInput
      | Self::MiddleNameMotherMatch => Some(Relation::Anak),
      Self::LastnameOnly => None,
    }
  }

  /// Whether this candidate survives exclusion filters unconditionally.
  ///
  /// Only an explicitly selected spouse does. Whether that is intended
  /// product behaviour is still awaiting confirmation.
  pub fn bypasses_exclusion(self) -> bool {
    match self {
      Self::Spouse => true,
      Self::FatherMatch
      | Self::MotherMatch
      | Self::FatherAsawaInput
      | Self::MotherAsawaInput
      | Self::MiddleNameMotherMatch
      | Self::LastnameOnly => false,
    }
  }
}

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Rule-based confidence tier, ordered weakest to strongest.
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
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
  Weak,
  Moderate,
  Strong,
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// Relation of a household member to the head (Relasyon).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
pub enum Relation {
  Asawa,
  Anak,
  Apo,
  Kapatid,
  Magulang,
  Manugang,
  Biyenan,
  Pamangkin,
  #[serde(rename = "Kamag-anak")]
  #[strum(serialize = "Kamag-anak")]
  KamagAnak,
  /// Anything else; the member's `relation_detail` says what.
  Iba,
}
