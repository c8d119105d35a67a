//! [`SemanticFilter`] over HTTP.
//!
//! POSTs a [`FilterRequest`] as JSON and expects `{"verdicts": [...]}` back.
//! Any transport error, non-2xx status or malformed body is a filter failure,
//! which the engine absorbs by keeping the stage-one list.

use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use sambahayan_core::filter::{
  FilterError, FilterFuture, FilterRequest, FilterVerdict, SemanticFilter,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct VerdictsResponse {
  verdicts: Vec<FilterVerdict>,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpSemanticFilter {
  client: Client,
  url:    String,
}

impl HttpSemanticFilter {
  /// `timeout` bounds each HTTP call; the engine applies its own deadline on
  /// top of it.
  pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      url: url.into(),
    })
  }

  async fn classify(&self, request: FilterRequest) -> Result<Vec<FilterVerdict>, FilterError> {
    let resp = self.client.post(&self.url).json(&request).send().await?;
    if !resp.status().is_success() {
      return Err(format!("POST {} → {}", self.url, resp.status()).into());
    }
    let body: VerdictsResponse = resp.json().await?;
    tracing::debug!(
      sent = request.candidates.len(),
      verdicts = body.verdicts.len(),
      "semantic filter responded"
    );
    Ok(body.verdicts)
  }
}

impl SemanticFilter for HttpSemanticFilter {
  fn evaluate(&self, request: FilterRequest) -> FilterFuture<'_> {
    Box::pin(self.classify(request))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{Json, Router, http::StatusCode, routing::post};
  use sambahayan_core::{
    filter::FilterCandidate,
    match_type::{MatchType, Relation},
    person::{PersonRef, Registry},
  };
  use serde_json::{Value, json};
  use tokio::net::TcpListener;
  use uuid::Uuid;

  async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/classify")
  }

  fn request(person: PersonRef) -> FilterRequest {
    FilterRequest {
      head_name:   "Pedro Reyes".into(),
      spouse_name: Some("Maria Santos".into()),
      candidates:  vec![FilterCandidate {
        person,
        name: "Ana Santos Reyes".into(),
        match_type: MatchType::MiddleNameMotherMatch,
        suggested_relation: Some(Relation::Anak),
        confidence: 65,
      }],
    }
  }

  #[tokio::test]
  async fn posts_request_and_parses_verdicts() {
    let app = Router::new().route(
      "/classify",
      post(|Json(body): Json<Value>| async move {
        let person = body["candidates"][0]["person"].clone();
        Json(json!({
          "verdicts": [{
            "person": person,
            "include": true,
            "suggested_relation": "Apo",
            "reason": "grandchild by age",
            "confidence": 77,
          }]
        }))
      }),
    );
    let url = serve(app).await;
    let filter = HttpSemanticFilter::new(url, Duration::from_secs(5)).unwrap();

    let person = PersonRef::new(Registry::Pnk, Uuid::new_v4());
    let verdicts = filter.evaluate(request(person)).await.unwrap();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].person, person);
    assert!(verdicts[0].include);
    assert_eq!(verdicts[0].suggested_relation, Some(Relation::Apo));
    assert_eq!(verdicts[0].confidence, Some(77));
  }

  #[tokio::test]
  async fn error_status_is_a_failure() {
    let app = Router::new().route(
      "/classify",
      post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let url = serve(app).await;
    let filter = HttpSemanticFilter::new(url, Duration::from_secs(5)).unwrap();

    let person = PersonRef::new(Registry::Hdb, Uuid::new_v4());
    let err = filter.evaluate(request(person)).await.unwrap_err();
    assert!(err.to_string().contains("503"));
  }
}
