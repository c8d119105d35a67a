//! [`SqliteStore`]: the SQLite implementation of the storage traits.

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use sambahayan_core::{
  feedback::FeedbackEvent,
  household::{Household, HouseholdStatus, NewHousehold},
  match_type::MatchType,
  name,
  pattern::PatternStats,
  person::{Person, PersonRef, Registry},
  store::{HouseholdStore, PatternStore, PersonDirectory},
};

use crate::{
  Error, Result,
  encode::{
    PERSON_COLUMNS, RawFeedback, RawHousehold, RawMember, RawPattern, RawPerson,
    decode_registry, decode_uuid, encode_dt, encode_match_type, encode_registry,
    encode_status, encode_uuid, name_key,
  },
  schema::SCHEMA,
};

/// Finds the code of another active household that `(registry, id)` heads or
/// actively belongs to. `?3` is the code to ignore.
const ASSIGNED_SQL: &str = "
SELECT h.code FROM households h
 WHERE h.status = 'active' AND h.code != ?3
   AND h.head_registry = ?1 AND h.head_id = ?2
UNION ALL
SELECT h.code FROM household_members m
  JOIN households h ON h.household_id = m.household_id
 WHERE m.active = 1 AND h.status = 'active' AND h.code != ?3
   AND m.person_registry = ?1 AND m.person_id = ?2
LIMIT 1";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A household store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace registry records, keyed by `(registry, id)`.
  ///
  /// This mirrors the external registries; the engine itself never writes
  /// person data.
  pub async fn import_persons(&self, persons: Vec<Person>) -> Result<usize> {
    let count = persons.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO persons (
               registry, person_id, first_name, middle_name, last_name,
               classification, purok, grupo, father_name, mother_name,
               last_key, middle_key, father_key, mother_key
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (registry, person_id) DO UPDATE SET
               first_name     = excluded.first_name,
               middle_name    = excluded.middle_name,
               last_name      = excluded.last_name,
               classification = excluded.classification,
               purok          = excluded.purok,
               grupo          = excluded.grupo,
               father_name    = excluded.father_name,
               mother_name    = excluded.mother_name,
               last_key       = excluded.last_key,
               middle_key     = excluded.middle_key,
               father_key     = excluded.father_key,
               mother_key     = excluded.mother_key",
          )?;
          for p in &persons {
            stmt.execute(rusqlite::params![
              encode_registry(p.registry),
              encode_uuid(p.id),
              p.name.first,
              p.name.middle,
              p.name.last,
              p.classification,
              p.purok,
              p.grupo,
              p.father_name,
              p.mother_name,
              name::normalize(&p.name.last),
              name_key(p.name.middle.as_deref()),
              name_key(p.father_name.as_deref()),
              name_key(p.mother_name.as_deref()),
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(count, "imported registry persons");
    Ok(count)
  }

  /// All feedback events recorded for a household, oldest first.
  pub async fn feedback_for_household(&self, household_id: Uuid) -> Result<Vec<FeedbackEvent>> {
    let id_str = encode_uuid(household_id);

    let raws: Vec<RawFeedback> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, household_id, recorded_at, shown_json, accepted_json, modified_json
             FROM feedback_events
            WHERE household_id = ?1
            ORDER BY recorded_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawFeedback {
              event_id:      row.get(0)?,
              household_id:  row.get(1)?,
              recorded_at:   row.get(2)?,
              shown_json:    row.get(3)?,
              accepted_json: row.get(4)?,
              modified_json: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedback::into_event).collect()
  }

  /// Run a `persons` query with `(registry, key)` parameters.
  async fn query_persons(
    &self,
    where_clause: &'static str,
    registry: Registry,
    key: String,
  ) -> Result<Vec<Person>> {
    let registry_str = encode_registry(registry);

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PERSON_COLUMNS} FROM persons
            WHERE registry = ?1 AND ({where_clause})
            ORDER BY last_key, first_name, person_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![registry_str, key], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// Load a household row and all its member rows (active first, then by
/// position).
fn load_household(
  conn: &rusqlite::Connection,
  household_id: &str,
) -> rusqlite::Result<Option<RawHousehold>> {
  let head = conn
    .query_row(
      "SELECT household_id, code, head_registry, head_id, status, created_at, updated_at
         FROM households WHERE household_id = ?1",
      rusqlite::params![household_id],
      |row| {
        Ok(RawHousehold {
          household_id:  row.get(0)?,
          code:          row.get(1)?,
          head_registry: row.get(2)?,
          head_id:       row.get(3)?,
          status:        row.get(4)?,
          created_at:    row.get(5)?,
          updated_at:    row.get(6)?,
          members:       Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut household) = head else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT person_registry, person_id, relation, relation_detail, active
       FROM household_members
      WHERE household_id = ?1
      ORDER BY active DESC, position",
  )?;
  household.members = stmt
    .query_map(rusqlite::params![household_id], |row| {
      Ok(RawMember {
        person_registry: row.get(0)?,
        person_id:       row.get(1)?,
        relation:        row.get(2)?,
        relation_detail: row.get(3)?,
        active:          row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(household))
}

// ─── PersonDirectory impl ────────────────────────────────────────────────────

impl PersonDirectory for SqliteStore {
  type Error = Error;

  async fn get_person(&self, person: PersonRef) -> Result<Option<Person>> {
    let registry_str = encode_registry(person.registry);
    let id_str = encode_uuid(person.id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PERSON_COLUMNS} FROM persons WHERE registry = ?1 AND person_id = ?2"
              ),
              rusqlite::params![registry_str, id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn search_by_surname(&self, registry: Registry, surname: &str) -> Result<Vec<Person>> {
    let key = name::normalize(surname);
    if key.is_empty() {
      return Ok(Vec::new());
    }
    self
      .query_persons("last_key = ?2 OR middle_key = ?2", registry, key)
      .await
  }

  async fn find_by_parent_name(&self, registry: Registry, name: &str) -> Result<Vec<Person>> {
    let key = name::normalize(name);
    if key.is_empty() || !registry.has_parent_names() {
      return Ok(Vec::new());
    }
    self
      .query_persons("father_key = ?2 OR mother_key = ?2", registry, key)
      .await
  }
}

// ─── HouseholdStore impl ─────────────────────────────────────────────────────

impl HouseholdStore for SqliteStore {
  type Error = Error;

  async fn save_household(&self, input: NewHousehold) -> Result<Household> {
    input.validate()?;

    let now = encode_dt(Utc::now());
    let new_id = encode_uuid(Uuid::new_v4());
    let code = input.code.trim().to_owned();
    let head = input.head;
    let people: Vec<PersonRef> = std::iter::once(input.head)
      .chain(input.members.iter().map(|m| m.person))
      .collect();
    let members = input.members;

    let raw: RawHousehold = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        for person in &people {
          let other: Option<String> = tx
            .query_row(
              ASSIGNED_SQL,
              rusqlite::params![
                encode_registry(person.registry),
                encode_uuid(person.id),
                code
              ],
              |r| r.get(0),
            )
            .optional()?;
          if let Some(household_code) = other {
            // Dropping `tx` rolls back.
            return Err(tokio_rusqlite::Error::Other(Box::new(
              sambahayan_core::Error::MemberConflict {
                person: *person,
                household_code,
              },
            )));
          }
        }

        let existing: Option<String> = tx
          .query_row(
            "SELECT household_id FROM households WHERE code = ?1",
            rusqlite::params![code],
            |r| r.get(0),
          )
          .optional()?;

        let household_id = match existing {
          Some(id) => {
            tx.execute(
              "UPDATE households
                  SET head_registry = ?2, head_id = ?3, status = ?4, updated_at = ?5
                WHERE household_id = ?1",
              rusqlite::params![
                id,
                encode_registry(head.registry),
                encode_uuid(head.id),
                encode_status(HouseholdStatus::Active),
                now
              ],
            )?;
            id
          }
          None => {
            tx.execute(
              "INSERT INTO households
                 (household_id, code, head_registry, head_id, status, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
              rusqlite::params![
                new_id,
                code,
                encode_registry(head.registry),
                encode_uuid(head.id),
                encode_status(HouseholdStatus::Active),
                now
              ],
            )?;
            new_id
          }
        };

        tx.execute(
          "UPDATE household_members SET active = 0 WHERE household_id = ?1",
          rusqlite::params![household_id],
        )?;

        for (position, member) in members.iter().enumerate() {
          tx.execute(
            "INSERT INTO household_members
               (household_id, person_registry, person_id, position, relation, relation_detail, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
             ON CONFLICT (household_id, person_registry, person_id) DO UPDATE SET
               position        = excluded.position,
               relation        = excluded.relation,
               relation_detail = excluded.relation_detail,
               active          = 1",
            rusqlite::params![
              household_id,
              encode_registry(member.person.registry),
              encode_uuid(member.person.id),
              position as i64,
              member.relation.to_string(),
              member.relation_detail,
            ],
          )?;
        }

        let saved = load_household(&tx, &household_id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(saved)
      })
      .await
      .map_err(Error::from_call)?;

    let household = raw.into_household()?;
    tracing::debug!(
      household_id = %household.household_id,
      code = %household.code,
      members = household.members.len(),
      "saved household"
    );
    Ok(household)
  }

  async fn get_household(&self, id: Uuid) -> Result<Option<Household>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_household(conn, &id_str)?))
      .await?;
    raw.map(RawHousehold::into_household).transpose()
  }

  async fn find_household_by_code(&self, code: &str) -> Result<Option<Household>> {
    let code = code.trim().to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        let id: Option<String> = conn
          .query_row(
            "SELECT household_id FROM households WHERE code = ?1",
            rusqlite::params![code],
            |r| r.get(0),
          )
          .optional()?;
        match id {
          Some(id) => Ok(load_household(conn, &id)?),
          None => Ok(None),
        }
      })
      .await?;
    raw.map(RawHousehold::into_household).transpose()
  }

  async fn assigned_persons(
    &self,
    people: &[PersonRef],
    except_code: Option<&str>,
  ) -> Result<HashSet<PersonRef>> {
    let keys: Vec<(String, String)> = people
      .iter()
      .map(|p| (encode_registry(p.registry).to_owned(), encode_uuid(p.id)))
      .collect();
    let except = except_code.map(str::trim).unwrap_or_default().to_owned();

    let hits: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(ASSIGNED_SQL)?;
        let mut hits = Vec::new();
        for (registry, id) in keys {
          if stmt.exists(rusqlite::params![registry, id, except])? {
            hits.push((registry, id));
          }
        }
        Ok(hits)
      })
      .await?;

    hits
      .into_iter()
      .map(|(registry, id)| Ok(PersonRef::new(decode_registry(&registry)?, decode_uuid(&id)?)))
      .collect()
  }
}

// ─── PatternStore impl ───────────────────────────────────────────────────────

impl PatternStore for SqliteStore {
  type Error = Error;

  async fn record_shown(&self, match_type: MatchType) -> Result<()> {
    let key = encode_match_type(match_type);
    let now = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO learned_patterns
             (match_type, total_shown, total_accepted, total_modified, updated_at)
           VALUES (?1, 1, 0, 0, ?2)
           ON CONFLICT (match_type) DO UPDATE SET
             total_shown = total_shown + 1,
             updated_at  = excluded.updated_at",
          rusqlite::params![key, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_outcome(&self, match_type: MatchType, accepted: bool, modified: bool) -> Result<()> {
    let key = encode_match_type(match_type);
    let now = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO learned_patterns
             (match_type, total_shown, total_accepted, total_modified, updated_at)
           VALUES (?1, 0, ?2, ?3, ?4)
           ON CONFLICT (match_type) DO UPDATE SET
             total_accepted = total_accepted + excluded.total_accepted,
             total_modified = total_modified + excluded.total_modified,
             updated_at     = excluded.updated_at",
          rusqlite::params![key, i64::from(accepted), i64::from(modified), now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn stats(&self, match_type: MatchType) -> Result<Option<PatternStats>> {
    let key = encode_match_type(match_type);
    let raw: Option<RawPattern> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT match_type, total_shown, total_accepted, total_modified, updated_at
                 FROM learned_patterns WHERE match_type = ?1",
              rusqlite::params![key],
              RawPattern::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPattern::into_stats).transpose()
  }

  async fn all_stats(&self) -> Result<Vec<PatternStats>> {
    let raws: Vec<RawPattern> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT match_type, total_shown, total_accepted, total_modified, updated_at
             FROM learned_patterns ORDER BY match_type",
        )?;
        let rows = stmt
          .query_map([], RawPattern::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPattern::into_stats).collect()
  }

  async fn append_feedback(&self, event: FeedbackEvent) -> Result<()> {
    let event_id = encode_uuid(event.event_id);
    let household_id = encode_uuid(event.household_id);
    let recorded_at = encode_dt(event.recorded_at);
    let shown = serde_json::to_string(&event.input.shown)?;
    let accepted = serde_json::to_string(&event.input.accepted)?;
    let modified = serde_json::to_string(&event.input.modified)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedback_events
             (event_id, household_id, recorded_at, shown_json, accepted_json, modified_json)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![event_id, household_id, recorded_at, shown, accepted, modified],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
