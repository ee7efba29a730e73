// src/pipeline/staleness.rs

//! Staleness check against the stored analysis record.
//!
//! The check is advisory: reading the record and the later write-back by the
//! analysis service are not atomic, so two overlapping deliveries for the
//! same module may both proceed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{AnalysisRecord, ChangeEvent};
use crate::storage::AnalysisStore;

/// Decision for one change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// An analysis started at or after the push; nothing to do.
    Skip { started_at: DateTime<Utc> },
    /// Analyze, passing the known revision (if any) along.
    Proceed { revision: Option<String> },
}

/// Compares change events with the latest stored analysis.
#[derive(Clone)]
pub struct StalenessChecker {
    store: Arc<dyn AnalysisStore>,
}

impl StalenessChecker {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    /// Decide whether `event` still needs an analysis.
    ///
    /// A missing record means "never analyzed"; any other store failure is
    /// returned as is.
    pub async fn check(&self, event: &ChangeEvent) -> Result<Verdict> {
        let record = match self.store.get(&event.name).await {
            Ok(record) => Some(record),
            Err(AppError::RecordNotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        Ok(Self::compare(record, event.pushed_at))
    }

    /// Equal timestamps count as already handled.
    pub fn compare(record: Option<AnalysisRecord>, pushed_at: DateTime<Utc>) -> Verdict {
        match record {
            Some(record) if record.started_at >= pushed_at => Verdict::Skip {
                started_at: record.started_at,
            },
            Some(record) => Verdict::Proceed {
                revision: Some(record.revision),
            },
            None => Verdict::Proceed { revision: None },
        }
    }
}
