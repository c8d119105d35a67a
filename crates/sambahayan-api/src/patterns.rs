//! Handler for `GET /patterns`.

use std::sync::Arc;

use axum::{Json, extract::State};
use sambahayan_core::pattern::PatternSummary;
use sambahayan_engine::{Backend, Engine};

use crate::error::ApiError;

/// `GET /patterns`: counters and confidence per match type. A `null`
/// confidence means there are not yet enough samples.
pub async fn summary<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<Vec<PatternSummary>>, ApiError> {
  Ok(Json(engine.pattern_summary().await?))
}
