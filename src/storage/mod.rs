//! Storage abstractions for analysis records and the search index.
//!
//! Both are shared by every concurrent processing task; implementations must
//! be safe for concurrent independent calls.

pub mod couch;
pub mod search;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisRecord, Score};

// Re-export for convenience
pub use couch::CouchStore;
pub use search::ElasticIndex;

/// Read access to stored analysis records.
///
/// Writes happen inside the analysis service, using the revision token
/// read here for conflict detection.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Fetch the record for `name`.
    ///
    /// Fails with `AppError::RecordNotFound` when no record exists.
    async fn get(&self, name: &str) -> Result<AnalysisRecord>;
}

/// Mutations on the module search index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or replace the scored entry for a module.
    async fn upsert_score(&self, score: &Score) -> Result<()>;

    /// Remove the entry for a module. Removing a missing entry succeeds.
    async fn remove_entry(&self, name: &str) -> Result<()>;
}
