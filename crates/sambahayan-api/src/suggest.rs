//! Handlers for the two suggestion stages.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/suggest` | Rule tiers blended with learned confidence |
//! | `POST` | `/suggest/refine` | As above, then the semantic filter; adds `refined` |
//!
//! Body: `{"head":{"registry":"tarheta","id":"…"},"spouse":{"named":"Maria Santos"}}`

use std::sync::Arc;

use axum::{Json, extract::State};
use sambahayan_engine::{Backend, Engine, Refined, SuggestRequest, Suggestions};
use serde::Serialize;

use crate::error::ApiError;

/// Successful body. `success` is true even when no candidates were found,
/// e.g. for a head without a usable name.
#[derive(Debug, Serialize)]
pub struct SuggestResponse<T> {
  pub success: bool,
  #[serde(flatten)]
  pub body:    T,
}

impl<T> SuggestResponse<T> {
  fn ok(body: T) -> Json<Self> {
    Json(Self {
      success: true,
      body,
    })
  }
}

/// `POST /suggest`
pub async fn suggest<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse<Suggestions>>, ApiError> {
  Ok(SuggestResponse::ok(engine.suggest(&request).await?))
}

/// `POST /suggest/refine`
///
/// Stage one is recomputed here rather than taken from the client, so the
/// filter only ever sees server-ranked candidates.
pub async fn refine<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse<Refined>>, ApiError> {
  Ok(SuggestResponse::ok(engine.suggest_refined(&request).await?))
}
