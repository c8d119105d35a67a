//! Canonical name normalization and free-text name parsing.
//!
//! Normalization never touches stored records; it only produces comparison
//! keys. Two names are considered equal when their normalized forms are
//! byte-identical.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::person::PersonName;

/// Words that begin a compound Filipino/Spanish surname ("Dela Cruz",
/// "de los Santos", "San Jose", "Sta. Maria").
const SURNAME_PARTICLES: &[&str] = &[
  "de", "del", "dela", "della", "delas", "delos", "di", "la", "las", "los",
  "san", "sta", "santa", "sto", "santo", "van", "von",
];

/// Fold case, strip diacritics and collapse whitespace.
///
/// Punctuation other than hyphens and apostrophes is treated as a word break,
/// so `"Dela Cruz, Juan."` and `"dela cruz juan"` normalize identically.
pub fn normalize(raw: &str) -> String {
  let folded: String = raw
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '\'' {
        c
      } else {
        ' '
      }
    })
    .collect();

  folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a free-text full name into first/middle/last.
///
/// The surname starts at the first surname particle after the first word, or
/// is the last word when there is none. Returns `None` when fewer than two
/// words remain, since a bare given name cannot seed a surname search.
pub fn parse_full_name(raw: &str) -> Option<PersonName> {
  let words: Vec<&str> = raw.split_whitespace().collect();
  if words.len() < 2 {
    return None;
  }

  let surname_start = (1..words.len() - 1)
    .find(|&i| SURNAME_PARTICLES.contains(&normalize(words[i]).as_str()))
    .unwrap_or(words.len() - 1);

  let middle = words[1..surname_start].join(" ");
  Some(PersonName {
    first:  words[0].to_owned(),
    middle: (!middle.is_empty()).then_some(middle),
    last:   words[surname_start..].join(" "),
  })
}
