// src/lib.rs

//! reanalyzer library: consumes module change events and re-runs analysis.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_utils;
