//! Service layer for the reanalyzer.
//!
//! The analysis and scoring stages run in separate services; this module
//! holds the interfaces the pipeline calls and their HTTP clients:
//! - Module analysis (`Analyzer`, `HttpAnalyzer`)
//! - Score computation (`Scorer`, `HttpScorer`)

mod analyzer;
mod scorer;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Analysis, Score};

pub use analyzer::HttpAnalyzer;
pub use scorer::HttpScorer;

/// Options passed along with every analysis request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Revision of the stored record, for a conflict-aware write-back
    pub revision: Option<String>,

    /// GitHub credential pool
    pub credentials: Vec<String>,

    /// Git ref to analyze instead of the default branch
    pub git_ref: Option<String>,

    /// Wait out rate limits instead of failing
    pub wait_rate_limit: bool,
}

// Credentials never end up in logs.
impl fmt::Debug for AnalyzeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzeOptions")
            .field("revision", &self.revision)
            .field("credentials", &format_args!("<{} tokens>", self.credentials.len()))
            .field("git_ref", &self.git_ref)
            .field("wait_rate_limit", &self.wait_rate_limit)
            .finish()
    }
}

/// Runs the (long) analysis of one module.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze `name`, persisting the result under the given revision.
    ///
    /// Failures are `AppError::Analysis` carrying the service's code and
    /// unrecoverable flag, or transport errors.
    async fn analyze(&self, name: &str, options: &AnalyzeOptions) -> Result<Analysis>;
}

/// Computes a score for a finished analysis.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, analysis: &Analysis) -> Result<Score>;
}
