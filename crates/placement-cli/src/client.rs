//! Async HTTP client for the placement JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use placement_core::{
  gateway::{MutationRequest, MutationTransport, TransportError},
  record::{self, Record},
  status::CollectionKind,
};
use reqwest::Client;
use serde_json::Value;

/// Async HTTP client for the placement REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  /// `GET /api/jobs`
  pub async fn list_jobs(&self) -> Result<Vec<Record>> {
    let resp = self
      .client
      .get(self.url("/api/jobs"))
      .send()
      .await
      .context("GET /api/jobs failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /api/jobs → {}", resp.status()));
    }
    let jobs: Vec<Record> = resp.json().await.context("deserialising jobs")?;
    Ok(record::normalize_all(CollectionKind::Jobs, jobs))
  }
}

// ─── Mutation transport ──────────────────────────────────────────────────────

impl MutationTransport for ApiClient {
  /// `POST /api/{kind}/{id}/{action}` with the actor in the body.
  async fn submit(
    &self,
    request: &MutationRequest,
  ) -> Result<Value, TransportError> {
    let path = request.path();
    let resp = self
      .client
      .post(self.url(&path))
      .json(&request.body())
      .send()
      .await
      .map_err(|e| TransportError::Unreachable(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp.text().await.unwrap_or_default();
      return Err(TransportError::Status { status: status.as_u16(), message });
    }
    resp
      .json()
      .await
      .map_err(|e| TransportError::Decode(e.to_string()))
  }
}
