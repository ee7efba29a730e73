// src/services/scorer.rs

//! HTTP client for the scoring service.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Analysis, Score, ServiceConfig};
use crate::services::Scorer;
use crate::utils::http;

/// Scoring service reachable over HTTP.
#[derive(Clone)]
pub struct HttpScorer {
    client: Client,
    base: Url,
}

impl HttpScorer {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Build a scorer client from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = http::create_async_client(config.timeout_secs)?;
        let base = Url::parse(&config.url)?;
        Ok(Self::new(client, base))
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, analysis: &Analysis) -> Result<Score> {
        let response = self
            .client
            .post(http::endpoint(&self.base, &["score"])?)
            .json(analysis)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::scoring(
                &analysis.name,
                http::describe_failure(status, &body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::scoring(&analysis.name, format!("malformed score: {e}")))
    }
}
