// src/pipeline/consume.rs

//! Consumer loop: pulls deliveries and processes them with bounded concurrency.
//!
//! A delivery is acknowledged once its processing returns an [`Outcome`];
//! a processing error rejects it, leaving redelivery to the queue.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, ConsumerConfig, Delivery};
use crate::pipeline::process::{ModuleProcessor, Outcome, ProcessorSettings};
use crate::queue::{DeliveryQueue, SpoolQueue};
use crate::services::{HttpAnalyzer, HttpScorer};
use crate::storage::{CouchStore, ElasticIndex};

/// Consumer loop settings.
#[derive(Debug, Clone)]
pub struct ConsumeOptions {
    /// Maximum deliveries processed at once
    pub concurrency: usize,
    /// Wait between receive attempts when the queue is empty or failing
    pub poll_interval: Duration,
    /// Stop once the queue has nothing available
    pub drain: bool,
}

impl ConsumeOptions {
    pub fn from_config(config: &ConsumerConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            drain: false,
        }
    }
}

/// Counters for one consumer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeStats {
    pub received: usize,
    pub acked: usize,
    pub rejected: usize,
    pub blacklisted: usize,
    pub fresh: usize,
    pub analyzed: usize,
    pub unrecoverable: usize,
    pub queue_errors: usize,
}

/// What happened to one pulled item.
enum Handled {
    Acked(Outcome),
    Rejected,
    /// Processing finished but the queue refused the ack/reject
    QueueFailure { processed: Option<Outcome> },
    ReceiveFailure,
}

impl ConsumeStats {
    fn record(&mut self, handled: Handled) {
        let outcome = match handled {
            Handled::ReceiveFailure => {
                self.queue_errors += 1;
                return;
            }
            Handled::Rejected => {
                self.received += 1;
                self.rejected += 1;
                return;
            }
            Handled::QueueFailure { processed } => {
                self.received += 1;
                self.queue_errors += 1;
                match processed {
                    Some(outcome) => outcome,
                    None => return,
                }
            }
            Handled::Acked(outcome) => {
                self.received += 1;
                self.acked += 1;
                outcome
            }
        };

        match outcome {
            Outcome::Blacklisted { .. } => self.blacklisted += 1,
            Outcome::Fresh => self.fresh += 1,
            Outcome::Analyzed { .. } => self.analyzed += 1,
            Outcome::Unrecoverable => self.unrecoverable += 1,
        }
    }
}

/// Feeds queue deliveries to a [`ModuleProcessor`].
pub struct Consumer {
    processor: Arc<ModuleProcessor>,
    queue: Arc<dyn DeliveryQueue>,
    options: ConsumeOptions,
}

impl Consumer {
    pub fn new(
        processor: Arc<ModuleProcessor>,
        queue: Arc<dyn DeliveryQueue>,
        options: ConsumeOptions,
    ) -> Self {
        Self {
            processor,
            queue,
            options,
        }
    }

    /// Consume until the queue is drained (drain mode) or forever.
    pub async fn run(&self) -> ConsumeStats {
        let concurrency = self.options.concurrency.max(1);
        log::info!(
            "Consuming with concurrency {}{}",
            concurrency,
            if self.options.drain { " (drain)" } else { "" }
        );

        let handled = stream::unfold((), |()| async move {
            self.next_delivery().await.map(|item| (item, ()))
        })
        .map(|item| async move {
            match item {
                Ok(delivery) => self.handle(delivery).await,
                Err(_) => Handled::ReceiveFailure,
            }
        })
        .buffer_unordered(concurrency);
        let mut handled = std::pin::pin!(handled);

        let mut stats = ConsumeStats::default();
        while let Some(item) = handled.next().await {
            stats.record(item);
        }

        log::info!(
            "Consumer finished: {} received, {} acked, {} rejected, {} queue errors",
            stats.received,
            stats.acked,
            stats.rejected,
            stats.queue_errors
        );
        stats
    }

    /// Next delivery to work on; `None` ends the run (drain mode only).
    async fn next_delivery(&self) -> Option<Result<Delivery>> {
        loop {
            match self.queue.receive().await {
                Ok(Some(delivery)) => return Some(Ok(delivery)),
                Ok(None) if self.options.drain => return None,
                Ok(None) => tokio::time::sleep(self.options.poll_interval).await,
                Err(e) => {
                    log::error!("Failed to receive from queue: {}", e);
                    tokio::time::sleep(self.options.poll_interval).await;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Process one delivery and settle it with the queue.
    async fn handle(&self, delivery: Delivery) -> Handled {
        log::debug!(
            "Delivery {} for {} (attempt {})",
            delivery.id,
            delivery.event.name,
            delivery.attempts + 1
        );

        match self.processor.process(&delivery.event).await {
            Ok(outcome) => match self.queue.ack(&delivery).await {
                Ok(()) => Handled::Acked(outcome),
                Err(e) => {
                    log::error!("Failed to ack delivery {}: {}", delivery.id, e);
                    Handled::QueueFailure {
                        processed: Some(outcome),
                    }
                }
            },
            Err(error) => {
                log::warn!(
                    "Processing of {} failed, leaving delivery {} for redelivery: {}",
                    delivery.event.name,
                    delivery.id,
                    error
                );
                match self.queue.reject(&delivery).await {
                    Ok(()) => Handled::Rejected,
                    Err(e) => {
                        log::error!("Failed to reject delivery {}: {}", delivery.id, e);
                        Handled::QueueFailure { processed: None }
                    }
                }
            }
        }
    }
}

/// Wire the configured collaborators together and run the consumer.
pub async fn run_consumer(config: &Config, drain: bool) -> Result<ConsumeStats> {
    let queue = SpoolQueue::from_config(&config.queue);
    queue.init().await?;
    queue.recover().await?;
    log::info!(
        "Spool at {} has {} pending deliveries",
        queue.root().display(),
        queue.pending_count().await?
    );

    let settings = ProcessorSettings::from_config(config);
    log::info!(
        "Loaded {} blacklisted modules, {} credentials, {} ref overrides",
        settings.blacklist.len(),
        settings.credentials.len(),
        settings.ref_overrides.len()
    );

    let processor = ModuleProcessor::new(
        Arc::new(settings),
        Arc::new(CouchStore::from_config(&config.store)?),
        Arc::new(ElasticIndex::from_config(&config.index)?),
        Arc::new(HttpAnalyzer::from_config(&config.analyzer)?),
        Arc::new(HttpScorer::from_config(&config.scorer)?),
    );

    let options = ConsumeOptions {
        drain,
        ..ConsumeOptions::from_config(&config.consumer)
    };
    let consumer = Consumer::new(Arc::new(processor), Arc::new(queue), options);
    Ok(consumer.run().await)
}
