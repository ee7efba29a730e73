// src/pipeline/process.rs

//! Processing of a single module change.
//!
//! Blacklist → staleness check → analysis → best-effort scoring, with
//! analysis failures routed through [`classify`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Analysis, ChangeEvent, Config};
use crate::pipeline::blacklist::BlacklistFilter;
use crate::pipeline::classify::{ClassifiedError, RecoveryAction, classify};
use crate::pipeline::staleness::{StalenessChecker, Verdict};
use crate::services::{AnalyzeOptions, Analyzer, Scorer};
use crate::storage::{AnalysisStore, SearchIndex};

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct ProcessorSettings {
    pub blacklist: BlacklistFilter,
    pub credentials: Vec<String>,
    pub ref_overrides: HashMap<String, String>,
    pub wait_rate_limit: bool,
}

impl ProcessorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            blacklist: BlacklistFilter::new(config.blacklist.clone()),
            credentials: config.github.tokens.clone(),
            ref_overrides: config.refs.clone(),
            wait_rate_limit: config.consumer.wait_rate_limit,
        }
    }

    fn analyze_options(&self, name: &str, revision: Option<String>) -> AnalyzeOptions {
        AnalyzeOptions {
            revision,
            credentials: self.credentials.clone(),
            git_ref: self.ref_overrides.get(name).cloned(),
            wait_rate_limit: self.wait_rate_limit,
        }
    }
}

/// How a change event was handled. Every variant acknowledges the delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Module is blacklisted
    Blacklisted { reason: String },
    /// An analysis started after the change was pushed
    Fresh,
    /// Analysis ran; `scored` is false when the best-effort scoring failed
    Analyzed { scored: bool },
    /// Analysis failed in a way retrying won't fix
    Unrecoverable,
}

/// Runs the per-module state machine against the shared collaborators.
pub struct ModuleProcessor {
    settings: Arc<ProcessorSettings>,
    staleness: StalenessChecker,
    index: Arc<dyn SearchIndex>,
    analyzer: Arc<dyn Analyzer>,
    scorer: Arc<dyn Scorer>,
}

impl ModuleProcessor {
    pub fn new(
        settings: Arc<ProcessorSettings>,
        store: Arc<dyn AnalysisStore>,
        index: Arc<dyn SearchIndex>,
        analyzer: Arc<dyn Analyzer>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            settings,
            staleness: StalenessChecker::new(store),
            index,
            analyzer,
            scorer,
        }
    }

    /// Process one change event.
    ///
    /// Errors returned here mean the delivery must not be acknowledged.
    pub async fn process(&self, event: &ChangeEvent) -> Result<Outcome> {
        let name = event.name.as_str();

        if let Some(reason) = self.settings.blacklist.is_blacklisted(name) {
            log::info!("Module {} is blacklisted, skipping: {}", name, reason);
            return Ok(Outcome::Blacklisted {
                reason: reason.to_string(),
            });
        }

        let revision = match self.staleness.check(event).await? {
            Verdict::Skip { started_at } => {
                log::info!(
                    "Module {} already analyzed at {} (pushed at {}), skipping",
                    name,
                    started_at,
                    event.pushed_at
                );
                return Ok(Outcome::Fresh);
            }
            Verdict::Proceed { revision } => revision,
        };

        let options = self.settings.analyze_options(name, revision);
        log::debug!("Analyzing {} with {:?}", name, options);

        match self.analyzer.analyze(name, &options).await {
            Ok(analysis) => {
                log::info!("Analyzed {}", name);
                let scored = self.score(&analysis).await;
                Ok(Outcome::Analyzed { scored })
            }
            Err(error) => self.recover(name, classify(error)).await,
        }
    }

    /// Best-effort score update; the batch scoring stage is authoritative.
    async fn score(&self, analysis: &Analysis) -> bool {
        let score = match self.scorer.score(analysis).await {
            Ok(score) => score,
            Err(e) => {
                log::warn!("Scoring of {} failed, ignoring: {}", analysis.name, e);
                return false;
            }
        };

        match self.index.upsert_score(&score).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Index update of {} failed, ignoring: {}", analysis.name, e);
                false
            }
        }
    }

    async fn recover(&self, name: &str, classified: ClassifiedError) -> Result<Outcome> {
        match classified.action() {
            RecoveryAction::Skip => {
                log::info!(
                    "Unrecoverable analysis failure for {}, dropping: {}",
                    name,
                    classified.error
                );
                Ok(Outcome::Unrecoverable)
            }
            RecoveryAction::CompensateThenPropagate => {
                log::info!("Module {} no longer exists, removing index entry", name);
                if let Err(e) = self.index.remove_entry(name).await {
                    log::error!(
                        "Failed to remove index entry of vanished module {}: {}",
                        name,
                        e
                    );
                }
                Err(classified.into_error())
            }
            RecoveryAction::Propagate => Err(classified.into_error()),
        }
    }
}
