//! Module-processing pipeline.
//!
//! - `BlacklistFilter`: static skip list
//! - `StalenessChecker`: skips changes already covered by a newer analysis
//! - `classify`: maps analysis failures to recovery actions
//! - `ModuleProcessor`: runs the above for one change event
//! - `Consumer`: feeds queue deliveries to the processor with bounded concurrency

pub mod blacklist;
pub mod classify;
pub mod consume;
pub mod process;
pub mod staleness;

pub use blacklist::BlacklistFilter;
pub use classify::{ClassifiedError, ErrorKind, RecoveryAction, classify};
pub use consume::{ConsumeOptions, ConsumeStats, Consumer, run_consumer};
pub use process::{ModuleProcessor, Outcome, ProcessorSettings};
pub use staleness::{StalenessChecker, Verdict};
