// src/storage/couch.rs

//! CouchDB-style document store client.
//!
//! Analysis documents live under `{url}/{database}/module!{name}`; the
//! document `_rev` is the revision token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AnalysisRecord, StoreConfig};
use crate::storage::AnalysisStore;
use crate::utils::http;

/// The subset of an analysis document the consumer reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisDoc {
    #[serde(rename = "_rev")]
    rev: String,
    started_at: DateTime<Utc>,
}

/// HTTP client for the analysis document store.
#[derive(Clone)]
pub struct CouchStore {
    client: Client,
    base: Url,
    database: String,
}

impl CouchStore {
    pub fn new(client: Client, base: Url, database: impl Into<String>) -> Self {
        Self {
            client,
            base,
            database: database.into(),
        }
    }

    /// Build a store client from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let client = http::create_async_client(config.timeout_secs)?;
        let base = Url::parse(&config.url)?;
        Ok(Self::new(client, base, &config.database))
    }

    fn doc_id(name: &str) -> String {
        format!("module!{name}")
    }

    /// Interpret a document response.
    fn parse_record(name: &str, status: StatusCode, body: &str) -> Result<AnalysisRecord> {
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::RecordNotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AppError::store(name, http::describe_failure(status, body)));
        }

        let doc: AnalysisDoc = serde_json::from_str(body)
            .map_err(|e| AppError::store(name, format!("malformed analysis document: {e}")))?;

        Ok(AnalysisRecord {
            name: name.to_string(),
            started_at: doc.started_at,
            revision: doc.rev,
        })
    }
}

#[async_trait]
impl AnalysisStore for CouchStore {
    async fn get(&self, name: &str) -> Result<AnalysisRecord> {
        let doc_id = Self::doc_id(name);
        let url = http::endpoint(&self.base, &[self.database.as_str(), doc_id.as_str()])?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Self::parse_record(name, status, &body)
    }
}
