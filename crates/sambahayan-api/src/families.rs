//! Handlers for `/families` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/families` | Create or update by `code`; 409 on member conflict |
//! | `GET`  | `/families/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use sambahayan_core::household::Household;
use sambahayan_engine::{Backend, Engine, SaveRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SaveResponse {
  pub success:      bool,
  pub household_id: Uuid,
}

/// `POST /families`
///
/// Responds once the household is committed. Learned-pattern updates from
/// the attached feedback finish in the background.
pub async fn save<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(request): Json<SaveRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let outcome = engine.save_family(request).await?;
  Ok((
    StatusCode::CREATED,
    Json(SaveResponse {
      success:      true,
      household_id: outcome.household.household_id,
    }),
  ))
}

/// `GET /families/{id}`
pub async fn get_one<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Household>, ApiError> {
  let household = engine
    .get_household(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("household {id} not found")))?;
  Ok(Json(household))
}
