//! JSON REST API for the household suggestion engine.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any storage
//! [`Backend`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sambahayan_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod families;
pub mod patterns;
pub mod suggest;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use sambahayan_engine::{Backend, Engine};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(engine: Arc<Engine<S>>) -> Router<()> {
  Router::new()
    // Suggestions
    .route("/suggest", post(suggest::suggest::<S>))
    .route("/suggest/refine", post(suggest::refine::<S>))
    // Households
    .route("/families", post(families::save::<S>))
    .route("/families/{id}", get(families::get_one::<S>))
    // Learned patterns
    .route("/patterns", get(patterns::summary::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(engine)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use sambahayan_core::{
    match_type::MatchType,
    person::{Person, PersonName, Registry},
    store::PatternStore,
  };
  use sambahayan_engine::EngineConfig;
  use sambahayan_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  fn person(registry: Registry, first: &str, last: &str) -> Person {
    Person {
      id: Uuid::new_v4(),
      registry,
      name: PersonName {
        first:  first.into(),
        middle: None,
        last:   last.into(),
      },
      classification: None,
      purok: Some("Purok 2".into()),
      grupo: Some("Grupo 4".into()),
      father_name: None,
      mother_name: None,
    }
  }

  struct Fixture {
    engine: Arc<Engine<SqliteStore>>,
    head:   Person,
    spouse: Person,
    child:  Person,
  }

  async fn fixture() -> Fixture {
    let head = person(Registry::Tarheta, "Juan", "Dela Cruz");
    let spouse = person(Registry::Tarheta, "Rosa", "Lim");
    let mut child = person(Registry::Hdb, "Lito", "Bautista");
    child.father_name = Some("Juan Dela Cruz".into());

    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .import_persons(vec![head.clone(), spouse.clone(), child.clone()])
      .await
      .unwrap();
    Fixture {
      engine: Arc::new(Engine::new(Arc::new(store), EngineConfig::default())),
      head,
      spouse,
      child,
    }
  }

  async fn send(
    engine: &Arc<Engine<SqliteStore>>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(engine.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn pref(p: &Person) -> Value { json!({ "registry": p.registry, "id": p.id }) }

  // ── Suggest ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn suggest_returns_ranked_candidates() {
    let f = fixture().await;
    let (status, body) = send(
      &f.engine,
      "POST",
      "/suggest",
      Some(json!({
        "head": pref(&f.head),
        "spouse": { "registered": pref(&f.spouse) },
      })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["head_name"], "Juan Dela Cruz");
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0]["match_type"], "SPOUSE");
    assert_eq!(suggestions[0]["suggested_relation"], "Asawa");
    assert_eq!(suggestions[1]["match_type"], "FATHER_MATCH");
    assert_eq!(suggestions[1]["suggested_relation"], "Anak");
    assert_eq!(suggestions[1]["tier"], "STRONG");
  }

  #[tokio::test]
  async fn suggest_unknown_head_is_404() {
    let f = fixture().await;
    let ghost = person(Registry::Pnk, "Wala", "Tao");
    let (status, body) =
      send(&f.engine, "POST", "/suggest", Some(json!({ "head": pref(&ghost) }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
  }

  #[tokio::test]
  async fn refine_without_filter_reports_unrefined() {
    let f = fixture().await;
    let (status, body) = send(
      &f.engine,
      "POST",
      "/suggest/refine",
      Some(json!({ "head": pref(&f.head), "spouse": { "named": "Rosa Lim" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refined"], false);
    assert_eq!(body["spouse_name"], "Rosa Lim");
    assert!(body["suggestions"].is_array());
  }

  #[tokio::test]
  async fn unusable_spouse_name_is_an_empty_success() {
    let f = fixture().await;
    let (status, body) = send(
      &f.engine,
      "POST",
      "/suggest",
      Some(json!({ "head": pref(&f.head), "spouse": { "named": "Rosa" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["suggestions"], json!([]));
  }

  // ── Families ────────────────────────────────────────────────────────────────

  fn save_body(code: &str, head: &Person, members: &[&Person]) -> Value {
    json!({
      "code": code,
      "head": pref(head),
      "members": members
        .iter()
        .map(|m| json!({ "person": pref(m), "relation": "Anak" }))
        .collect::<Vec<_>>(),
    })
  }

  #[tokio::test]
  async fn save_then_fetch_household() {
    let f = fixture().await;
    let mut body = save_body("H-001", &f.head, &[&f.child]);
    body["spouse"] = pref(&f.spouse);

    let (status, saved) = send(&f.engine, "POST", "/families", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["success"], true);
    let id = saved["household_id"].as_str().unwrap().to_owned();

    let (status, household) = send(&f.engine, "GET", &format!("/families/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(household["code"], "H-001");
    let members = household["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["relation"], "Asawa");
    assert_eq!(members[1]["relation"], "Anak");
  }

  #[tokio::test]
  async fn unknown_household_is_404() {
    let f = fixture().await;
    let (status, _) =
      send(&f.engine, "GET", &format!("/families/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn member_of_another_household_is_409() {
    let f = fixture().await;
    let (status, _) =
      send(&f.engine, "POST", "/families", Some(save_body("H-001", &f.head, &[&f.child]))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
      &f.engine,
      "POST",
      "/families",
      Some(save_body("H-002", &f.spouse, &[&f.child])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("H-001"));
  }

  #[tokio::test]
  async fn head_listed_as_member_is_400() {
    let f = fixture().await;
    let (status, body) =
      send(&f.engine, "POST", "/families", Some(save_body("H-001", &f.head, &[&f.head]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  // ── Patterns ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn patterns_report_confidence_or_insufficient_data() {
    let f = fixture().await;
    let store = f.engine.store();
    for i in 0..6 {
      store.record_shown(MatchType::FatherMatch).await.unwrap();
      store
        .record_outcome(MatchType::FatherMatch, i < 3, false)
        .await
        .unwrap();
    }
    store.record_shown(MatchType::LastnameOnly).await.unwrap();

    let (status, body) = send(&f.engine, "GET", "/patterns", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let father = rows.iter().find(|r| r["match_type"] == "FATHER_MATCH").unwrap();
    assert_eq!(father["total_shown"], 6);
    assert_eq!(father["confidence"], 50);
    let surname = rows.iter().find(|r| r["match_type"] == "LASTNAME_ONLY").unwrap();
    assert!(surname["confidence"].is_null());
  }
}
