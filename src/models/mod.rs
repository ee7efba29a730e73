// src/models/mod.rs

//! Domain models for the reanalyzer.
//!
//! This module contains the data structures that flow between the queue,
//! the processing pipeline and the external services.

mod analysis;
mod config;
mod event;

// Re-export all public types
pub use analysis::{Analysis, AnalysisRecord, Score};
pub use config::{
    Config, ConsumerConfig, GithubConfig, IndexConfig, QueueConfig, ServiceConfig, StoreConfig,
};
pub use event::{ChangeEvent, Delivery};
