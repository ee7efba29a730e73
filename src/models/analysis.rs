// src/models/analysis.rs

//! Analysis records, analysis results and scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stored analysis document for a module, as far as staleness checks care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    /// Module name
    pub name: String,

    /// When the most recent analysis started
    pub started_at: DateTime<Utc>,

    /// Opaque document revision used for conflict-aware writes
    pub revision: String,
}

/// Result produced by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Module name
    pub name: String,

    pub started_at: DateTime<Utc>,

    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Collected metadata (opaque to the consumer)
    #[serde(default)]
    pub collected: serde_json::Value,

    /// Evaluation results (opaque to the consumer)
    #[serde(default)]
    pub evaluation: serde_json::Value,
}

/// Score computed from an analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    /// Module name
    pub name: String,

    /// Final aggregated score
    #[serde(rename = "final")]
    pub final_score: f64,

    /// Per-aspect breakdown (opaque to the consumer)
    #[serde(default)]
    pub detail: serde_json::Value,
}
