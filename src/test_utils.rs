//! In-memory collaborators for exercising the pipeline without services.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, CODE_NOT_FOUND, Result};
use crate::models::{Analysis, AnalysisRecord, Delivery, Score};
use crate::queue::DeliveryQueue;
use crate::services::{AnalyzeOptions, Analyzer, Scorer};
use crate::storage::{AnalysisStore, SearchIndex};

/// How the fake analyzer should answer for a module.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    NotFound,
    Unrecoverable,
    UnknownCode(&'static str),
    Fail,
}

impl Script {
    fn error(&self, name: &str) -> AppError {
        let (code, unrecoverable) = match self {
            Script::NotFound => (Some(CODE_NOT_FOUND.to_string()), false),
            Script::Unrecoverable => (None, true),
            Script::UnknownCode(code) => (Some(code.to_string()), false),
            Script::Succeed | Script::Fail => (None, false),
        };
        AppError::Analysis {
            name: name.to_string(),
            code,
            unrecoverable,
            message: format!("scripted failure: {self:?}"),
        }
    }
}

pub fn analysis(name: &str) -> Analysis {
    Analysis {
        name: name.to_string(),
        started_at: Utc::now(),
        finished_at: Some(Utc::now()),
        collected: serde_json::json!({}),
        evaluation: serde_json::json!({}),
    }
}

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<String, AnalysisRecord>>,
    broken: bool,
}

impl FakeStore {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn with_record(self, name: &str, started_at: DateTime<Utc>, revision: &str) -> Self {
        self.records.lock().unwrap().insert(
            name.to_string(),
            AnalysisRecord {
                name: name.to_string(),
                started_at,
                revision: revision.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl AnalysisStore for FakeStore {
    async fn get(&self, name: &str) -> Result<AnalysisRecord> {
        if self.broken {
            return Err(AppError::store(name, "connection refused"));
        }
        self.records
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::RecordNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Default)]
pub struct FakeIndex {
    pub upserts: Mutex<Vec<String>>,
    pub removals: Mutex<Vec<String>>,
    pub fail_upsert: bool,
    pub fail_remove: bool,
}

#[async_trait]
impl SearchIndex for FakeIndex {
    async fn upsert_score(&self, score: &Score) -> Result<()> {
        self.upserts.lock().unwrap().push(score.name.clone());
        if self.fail_upsert {
            return Err(AppError::index(&score.name, "index unavailable"));
        }
        Ok(())
    }

    async fn remove_entry(&self, name: &str) -> Result<()> {
        self.removals.lock().unwrap().push(name.to_string());
        if self.fail_remove {
            return Err(AppError::index(name, "index unavailable"));
        }
        Ok(())
    }
}

/// Analyzer answering from a per-module script; unscripted modules succeed.
#[derive(Default)]
pub struct FakeAnalyzer {
    scripts: HashMap<String, Script>,
    delay: Duration,
    pub calls: Mutex<Vec<(String, AnalyzeOptions)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, name: &str) -> Vec<AnalyzeOptions> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == name)
            .map(|(_, options)| options.clone())
            .collect()
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, name: &str, options: &AnalyzeOptions) -> Result<Analysis> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), options.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(name).unwrap_or(&Script::Succeed) {
            Script::Succeed => Ok(analysis(name)),
            script => Err(script.error(name)),
        }
    }
}

#[derive(Default)]
pub struct FakeScorer {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeScorer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scorer for FakeScorer {
    async fn score(&self, analysis: &Analysis) -> Result<Score> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::scoring(&analysis.name, "scoring exploded"));
        }
        Ok(Score {
            name: analysis.name.clone(),
            final_score: 0.5,
            detail: serde_json::Value::Null,
        })
    }
}

/// Queue holding deliveries in memory; rejected deliveries are recorded, not requeued.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<Delivery>>,
    pub acked: Mutex<Vec<String>>,
    pub rejected: Mutex<Vec<String>>,
    receive_failures: AtomicUsize,
}

impl MemoryQueue {
    pub fn with(deliveries: Vec<Delivery>) -> Self {
        Self {
            pending: Mutex::new(deliveries.into()),
            ..Self::default()
        }
    }

    /// Make the next `count` receive calls fail.
    pub fn fail_receives(self, count: usize) -> Self {
        self.receive_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.rejected.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryQueue for MemoryQueue {
    async fn receive(&self) -> Result<Option<Delivery>> {
        let failures = self.receive_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.receive_failures.store(failures - 1, Ordering::SeqCst);
            return Err(AppError::queue("broker unreachable"));
        }
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        self.acked.lock().unwrap().push(delivery.id.clone());
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery) -> Result<()> {
        self.rejected.lock().unwrap().push(delivery.id.clone());
        Ok(())
    }
}
