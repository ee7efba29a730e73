// src/storage/search.rs

//! Elasticsearch-style search index client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{IndexConfig, Score};
use crate::storage::SearchIndex;
use crate::utils::http;

/// HTTP client for the module search index.
#[derive(Clone)]
pub struct ElasticIndex {
    client: Client,
    base: Url,
    index: String,
}

impl ElasticIndex {
    pub fn new(client: Client, base: Url, index: impl Into<String>) -> Self {
        Self {
            client,
            base,
            index: index.into(),
        }
    }

    /// Build an index client from configuration.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let client = http::create_async_client(config.timeout_secs)?;
        let base = Url::parse(&config.url)?;
        Ok(Self::new(client, base, &config.index))
    }

    fn doc_url(&self, name: &str) -> Result<Url> {
        http::endpoint(&self.base, &[self.index.as_str(), "_doc", name])
    }

    /// Interpret a delete response; a missing document counts as removed.
    fn check_delete(name: &str, status: StatusCode, body: &str) -> Result<()> {
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(AppError::index(name, http::describe_failure(status, body)))
        }
    }

    fn check_upsert(name: &str, status: StatusCode, body: &str) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::index(name, http::describe_failure(status, body)))
        }
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn upsert_score(&self, score: &Score) -> Result<()> {
        let response = self
            .client
            .put(self.doc_url(&score.name)?)
            .json(score)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        Self::check_upsert(&score.name, status, &body)
    }

    async fn remove_entry(&self, name: &str) -> Result<()> {
        let response = self.client.delete(self.doc_url(name)?).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Self::check_delete(name, status, &body)
    }
}
