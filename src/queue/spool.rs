// src/queue/spool.rs

//! Filesystem spool used as the local delivery queue.
//!
//! ## Directory Structure
//!
//! ```text
//! {spool_dir}/
//! ├── pending/      # waiting deliveries, <available_at millis>_<id>.json
//! ├── inflight/     # claimed by a consumer, <id>.json
//! ├── dead/         # rejected max_attempts times, <id>.json
//! └── corrupt/      # pending files that could not be read as deliveries
//! ```
//!
//! Claiming is a rename from `pending/` to `inflight/`, so two consumers
//! sharing a spool never receive the same file. A claimed file only leaves
//! `inflight/` by being deleted (ack) or renamed out (reject). Pending names
//! sort by availability, so `receive` stops at the first delivery that is
//! not yet due without opening it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{ChangeEvent, Delivery, QueueConfig};
use crate::queue::DeliveryQueue;
use crate::utils::fs;

const PENDING: &str = "pending";
const INFLIGHT: &str = "inflight";
const DEAD: &str = "dead";
const CORRUPT: &str = "corrupt";

/// Filesystem-backed delivery queue.
#[derive(Debug, Clone)]
pub struct SpoolQueue {
    root: PathBuf,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SpoolQueue {
    /// Create a spool rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            root: root.into(),
            max_attempts,
            retry_delay,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(
            &config.spool_dir,
            config.max_attempts,
            Duration::from_secs(config.retry_delay_secs),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the spool directories if missing.
    pub async fn init(&self) -> Result<()> {
        for state in [PENDING, INFLIGHT, DEAD, CORRUPT] {
            tokio::fs::create_dir_all(self.root.join(state)).await?;
        }
        Ok(())
    }

    fn path(&self, state: &str, id: &str) -> PathBuf {
        self.root.join(state).join(format!("{id}.json"))
    }

    fn pending_path(&self, delivery: &Delivery) -> PathBuf {
        self.path(PENDING, &pending_name(delivery))
    }

    /// Move an unreadable pending file aside so it no longer blocks the queue.
    async fn quarantine(&self, name: &str, reason: impl std::fmt::Display) -> Result<()> {
        log::error!("Quarantining spool file {}: {}", name, reason);
        match tokio::fs::rename(self.path(PENDING, name), self.path(CORRUPT, name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Identifier ordered by enqueue time, unique per event and enqueue instant.
    fn delivery_id(event: &ChangeEvent, enqueued_at: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(event.name.as_bytes());
        hasher.update(b"\n");
        hasher.update(event.pushed_at.to_rfc3339().as_bytes());
        hasher.update(b"\n");
        hasher.update(
            enqueued_at
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_be_bytes(),
        );
        let digest = hex::encode(hasher.finalize());

        format!("{:013}-{}", enqueued_at.timestamp_millis(), &digest[..16])
    }

    /// Enqueue a change event.
    pub async fn publish(&self, event: ChangeEvent) -> Result<Delivery> {
        let now = Utc::now();
        let mut delivery = Delivery::new(Self::delivery_id(&event, now), event);
        delivery.available_at = now;

        fs::write_json_atomic(&self.pending_path(&delivery), &delivery).await?;
        log::debug!(
            "Spooled delivery {} for {}",
            delivery.id,
            delivery.event.name
        );
        Ok(delivery)
    }

    /// Sorted file stems present in a state directory.
    async fn list(&self, state: &str) -> Result<Vec<String>> {
        let dir = self.root.join(state);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Number of deliveries waiting in `pending/`.
    pub async fn pending_count(&self) -> Result<usize> {
        Ok(self.list(PENDING).await?.len())
    }

    /// Deliveries that exhausted their attempts.
    pub async fn dead_letters(&self) -> Result<Vec<Delivery>> {
        let mut letters = Vec::new();
        for id in self.list(DEAD).await? {
            if let Some(delivery) = fs::read_json_optional(&self.path(DEAD, &id)).await? {
                letters.push(delivery);
            }
        }
        Ok(letters)
    }

    /// Return deliveries orphaned in `inflight/` (by a crash) to `pending/`.
    pub async fn recover(&self) -> Result<usize> {
        let mut recovered = 0;
        for id in self.list(INFLIGHT).await? {
            let inflight = self.path(INFLIGHT, &id);
            let target = match fs::read_json_optional::<Delivery>(&inflight).await {
                Ok(Some(delivery)) => self.pending_path(&delivery),
                Ok(None) => continue,
                Err(AppError::Json(e)) => {
                    log::error!("Quarantining unreadable inflight file {}: {}", id, e);
                    self.path(CORRUPT, &id)
                }
                Err(e) => return Err(e),
            };
            tokio::fs::rename(&inflight, &target).await?;
            recovered += 1;
        }
        if recovered > 0 {
            log::warn!("Recovered {} interrupted deliveries", recovered);
        }
        Ok(recovered)
    }
}

#[async_trait]
impl DeliveryQueue for SpoolQueue {
    async fn receive(&self) -> Result<Option<Delivery>> {
        let now = Utc::now();

        for name in self.list(PENDING).await? {
            let Some(due) = parse_pending_name(&name) else {
                self.quarantine(&name, "unrecognized file name").await?;
                continue;
            };
            if due > now.timestamp_millis() {
                break;
            }

            let pending = self.path(PENDING, &name);
            let delivery: Delivery = match fs::read_json_optional(&pending).await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => continue,
                Err(AppError::Json(e)) => {
                    self.quarantine(&name, e).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !delivery.is_available(now) {
                continue;
            }

            match tokio::fs::rename(&pending, self.path(INFLIGHT, &delivery.id)).await {
                Ok(()) => return Ok(Some(delivery)),
                // Claimed by another consumer in the meantime
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::Io(e)),
            }
        }

        Ok(None)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        tokio::fs::remove_file(self.path(INFLIGHT, &delivery.id))
            .await
            .map_err(|e| AppError::queue(format!("ack of {} failed: {e}", delivery.id)))
    }

    async fn reject(&self, delivery: &Delivery) -> Result<()> {
        let mut retry = delivery.clone();
        retry.attempts += 1;

        let target = if retry.attempts >= self.max_attempts {
            log::error!(
                "Delivery {} for {} dead-lettered after {} attempts",
                retry.id,
                retry.event.name,
                retry.attempts
            );
            self.path(DEAD, &retry.id)
        } else {
            let delay = chrono::Duration::from_std(self.retry_delay)
                .map_err(|e| AppError::queue(format!("invalid retry delay: {e}")))?;
            retry.available_at = Utc::now() + delay;
            self.pending_path(&retry)
        };

        // Rewrite in place while still claimed, then release with one rename.
        let inflight = self.path(INFLIGHT, &retry.id);
        fs::write_json_atomic(&inflight, &retry).await?;
        tokio::fs::rename(&inflight, &target)
            .await
            .map_err(|e| AppError::queue(format!("reject of {} failed: {e}", retry.id)))
    }
}

/// Pending file stem: availability first so name order is due order.
fn pending_name(delivery: &Delivery) -> String {
    format!(
        "{:013}_{}",
        delivery.available_at.timestamp_millis().max(0),
        delivery.id
    )
}

/// Availability in epoch millis encoded in a pending file stem.
fn parse_pending_name(name: &str) -> Option<i64> {
    let (millis, id) = name.split_once('_')?;
    if millis.len() != 13 || id.is_empty() {
        return None;
    }
    millis.parse().ok()
}
